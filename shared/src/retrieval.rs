//! 自动取件（定时抓取）配置的线上类型

use serde::{Deserialize, Serialize};

/// 取件开关
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RetrievalStatus {
    #[serde(default)]
    pub enabled: bool,
}

/// 取件配置：扫描间隔与目标文件夹
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    #[serde(default = "default_interval")]
    pub interval_minutes: u32,
    #[serde(default)]
    pub unseen_only: bool,
    #[serde(default)]
    pub folders: Vec<String>,
}

fn default_interval() -> u32 {
    60
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval(),
            unseen_only: true,
            folders: vec!["INBOX".to_string()],
        }
    }
}

/// 取件执行日志行
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrievalLogEntry {
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
