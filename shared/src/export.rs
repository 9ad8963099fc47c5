//! 导出模板与导出任务的线上类型

use serde::{Deserialize, Serialize};

/// 导出模板：实体 + 字段清单 + 过滤器
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportTemplate {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub entity: String,
    pub format: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub filters: serde_json::Value,
}

/// 导出任务的一次执行
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRun {
    pub id: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub rows: Option<u32>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ExportRun {
    pub fn is_done(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("done") || s.eq_ignore_ascii_case("completed"))
            .unwrap_or(false)
    }
}

/// 触发导出执行
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunExportRequest {
    pub template_id: String,
}
