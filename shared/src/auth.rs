//! 认证接口的线上类型
//!
//! 会话负载是认证提供方与后端共同使用的形状；前端把它作为
//! 会话的规范表示缓存到本地存储。

use serde::{Deserialize, Serialize};

/// 规范化的会话负载（bearer token + 身份）
///
/// 字段保持宽松：除 `access_token` 外全部可缺省，未知字段忽略。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserIdentity>,
}

impl SessionPayload {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            user: None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.email.as_deref())
    }
}

/// 不透明的用户身份记录（至少包含邮箱）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// 登录/注册响应：后端可能同时返回会话与提示信息
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub session: Option<SessionPayload>,
    #[serde(default)]
    pub user: Option<UserIdentity>,
    #[serde(default)]
    pub message: Option<String>,
}

/// 后端 Google OAuth 可用性
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleStatus {
    #[serde(default)]
    pub enabled: bool,
}

/// 登录者资料
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// 用户管理列表项
#[derive(Debug, Clone, Deserialize)]
pub struct ManagedUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
