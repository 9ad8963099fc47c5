use serde::{Deserialize, Serialize};

pub mod auth;
pub mod directory;
pub mod export;
pub mod invoice;
pub mod retrieval;

// =========================================================
// 常量定义 (Contract Constants)
// =========================================================

/// 应用自身持久化的会话记录键
pub const SESSION_STORAGE_KEY: &str = "session";
/// 快速同步检查用的登录布尔标记键
pub const LOGGED_IN_FLAG_KEY: &str = "isLoggedIn";
/// 认证提供方默认记录的键前缀（`sb-<ref>-auth-token`）
pub const PROVIDER_KEY_PREFIX: &str = "sb-";
/// 认证提供方默认记录的键后缀
pub const PROVIDER_KEY_SUFFIX: &str = "-auth-token";

/// OAuth 回调 URL 的提供方标记参数（`auth=google`）
pub const OAUTH_MARKER_PARAM: &str = "auth";
/// OAuth 回调 URL 的成功标记参数（`ok=1`）
pub const OAUTH_SUCCESS_PARAM: &str = "ok";
/// OAuth 回调 URL 中内联会话负载的参数（base64 JSON，可选）
pub const OAUTH_TOKEN_PARAM: &str = "token";

/// 未显式配置 API 地址时推断使用的后端端口
pub const DEFAULT_BACKEND_PORT: u16 = 8080;

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

/// 邮箱提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    Gmail,
    Outlook,
    Imap,
}

impl MailProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailProvider::Gmail => "gmail",
            MailProvider::Outlook => "outlook",
            MailProvider::Imap => "imap",
        }
    }

    /// 展示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            MailProvider::Gmail => "Gmail",
            MailProvider::Outlook => "Outlook",
            MailProvider::Imap => "IMAP",
        }
    }
}

impl std::fmt::Display for MailProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 已连接的邮箱账号（服务端所有，前端只读展示）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub provider: String,
    pub email: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_sync: Option<chrono::DateTime<chrono::Utc>>,
}

/// 创建账号请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub provider: String,
    pub email: String,
    #[serde(default)]
    pub meta: AccountMeta,
}

/// 账号元数据（IMAP 连接参数；密码由后端加密存储）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

// =========================================================
// 响应包装 (Response Envelopes)
// =========================================================

/// 列表响应兼容层：后端有的端点返回 `{ data: [...] }`，有的直接返回数组
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListBody<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListBody::Wrapped { data } => data,
            ListBody::Bare(items) => items,
        }
    }
}

impl<T> Default for ListBody<T> {
    fn default() -> Self {
        ListBody::Bare(Vec::new())
    }
}

/// 通用确认响应（批量操作的聚合结果以后端为准）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_body_accepts_both_shapes() {
        let wrapped: ListBody<i32> = serde_json::from_str(r#"{"data":[1,2]}"#).unwrap();
        assert_eq!(wrapped.into_vec(), vec![1, 2]);

        let bare: ListBody<i32> = serde_json::from_str(r#"[3]"#).unwrap();
        assert_eq!(bare.into_vec(), vec![3]);
    }

    #[test]
    fn account_tolerates_missing_optional_fields() {
        let account: Account =
            serde_json::from_str(r#"{"id":"a1","provider":"imap","email":"x@y.z"}"#).unwrap();
        assert!(account.status.is_none());
        assert!(account.last_sync.is_none());
    }
}
