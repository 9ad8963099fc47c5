//! 供应商目录与规则引擎的线上类型
//!
//! 供应商端点沿用后端的 snake_case 字段；合并请求除外（camelCase）。

use serde::{Deserialize, Serialize};

/// 供应商主数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Supplier {
    pub fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("active"))
            .unwrap_or(false)
    }
}

/// 供应商联系人
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierContact {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// 供应商合并请求：把 `ids` 合并到 `primary_id`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSuppliersRequest {
    pub ids: Vec<String>,
    pub primary_id: String,
}

/// 按 ID 批量操作的通用负载
#[derive(Debug, Clone, Serialize)]
pub struct IdBatch {
    pub ids: Vec<String>,
}

/// 疑似重复的供应商组
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DuplicateGroup {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
}

// =========================================================
// 规则引擎 (Rules)
// =========================================================

/// 分类/自动化规则
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
    #[serde(default)]
    pub actions: Vec<RuleAction>,
    #[serde(default)]
    pub active: bool,
}

impl Rule {
    /// 表格里显示的触发摘要，如 `sender contains acme.com`
    pub fn trigger_summary(&self) -> Option<String> {
        self.conditions
            .first()
            .map(|c| format!("{} {} {}", c.field, c.operator, c.value))
    }

    /// 表格里显示的动作摘要
    pub fn action_summary(&self) -> Option<String> {
        self.actions.first().map(|a| match &a.detail {
            Some(detail) => format!("{}: {}", a.kind, detail),
            None => a.kind.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleCondition {
    pub field: String,
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_summaries() {
        let rule = Rule {
            name: "invoices".into(),
            conditions: vec![RuleCondition {
                field: "sender".into(),
                operator: "contains".into(),
                value: "acme.com".into(),
            }],
            actions: vec![RuleAction {
                kind: "assign_supplier".into(),
                detail: Some("ACME".into()),
            }],
            ..Rule::default()
        };
        assert_eq!(
            rule.trigger_summary().as_deref(),
            Some("sender contains acme.com")
        );
        assert_eq!(rule.action_summary().as_deref(), Some("assign_supplier: ACME"));
    }

    #[test]
    fn rule_action_serializes_type_field() {
        let action = RuleAction {
            kind: "move".into(),
            detail: None,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains(r#""type":"move""#));
    }
}
