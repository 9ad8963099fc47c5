//! 应用配置
//!
//! API 地址：编译期显式覆盖优先，否则按当前页面的主机名推断
//! （约定后端端口）。谱系里那些经验值等待时长全部收敛到这里，
//! 不允许散落在调用点硬编码。

use invomail_shared::DEFAULT_BACKEND_PORT;

/// 编译期覆盖的 API 基地址（如 `https://api.invomail.app`）
const API_BASE_OVERRIDE: Option<&str> = option_env!("INVOMAIL_API_BASE");

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// 后端 API 基地址（无尾随斜杠）
    pub api_base: String,
    /// 守卫等待会话解析器就绪的上限（毫秒）
    pub auth_ready_timeout_ms: u32,
    /// token 解析为空后重试一次前的等待（毫秒）
    pub token_retry_delay_ms: u32,
    /// 单个 API 请求的超时（毫秒）
    pub request_timeout_ms: u32,
    /// 设置类变更落库前的防抖窗口（毫秒）
    pub settings_debounce_ms: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: infer_api_base(),
            auth_ready_timeout_ms: 1_000,
            token_retry_delay_ms: 350,
            request_timeout_ms: 30_000,
            settings_debounce_ms: 400,
        }
    }
}

/// 推断 API 基地址：显式覆盖 > 页面主机 + 约定端口 > 本地默认
fn infer_api_base() -> String {
    if let Some(explicit) = API_BASE_OVERRIDE {
        return explicit.trim_end_matches('/').to_string();
    }
    let inferred = web_sys::window().and_then(|w| {
        let location = w.location();
        let protocol = location.protocol().ok()?;
        let hostname = location.hostname().ok()?;
        Some(format!("{protocol}//{hostname}:{DEFAULT_BACKEND_PORT}"))
    });
    inferred.unwrap_or_else(|| format!("http://localhost:{DEFAULT_BACKEND_PORT}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_a_usable_api_base() {
        let config = AppConfig::default();
        assert!(!config.api_base.ends_with('/'));
        assert!(config.api_base.contains("://"));
    }
}
