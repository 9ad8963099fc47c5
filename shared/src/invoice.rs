//! 发票与 IMAP 抓取接口的线上类型
//!
//! 抓取端点使用 camelCase 字段（Node 后端约定）。

use serde::{Deserialize, Serialize};

/// 已抓取的发票行（服务端所有；前端获取-展示-可选更新）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// 数据库原始 ID，操作（删除/更新）用
    pub id: String,
    /// 展示用发票号
    #[serde(default)]
    pub invoice_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Invoice {
    /// 附件格式（大写），缺省为空串
    pub fn format_upper(&self) -> String {
        self.format.as_deref().unwrap_or("").to_ascii_uppercase()
    }
}

/// IMAP 连接凭据（向导第 2 步的产物，贯穿后续步骤）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImapCredentials {
    pub email: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

/// 连接测试请求
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionRequest {
    pub email: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl From<&ImapCredentials> for TestConnectionRequest {
    fn from(creds: &ImapCredentials) -> Self {
        Self {
            email: creds.email.clone(),
            password: creds.password.clone(),
            host: creds.host.clone(),
            port: creds.port,
            tls: creds.tls,
        }
    }
}

/// 文件夹列表响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderList {
    #[serde(default)]
    pub folders: Vec<String>,
}

impl FolderList {
    /// 端点不可用时的常见默认文件夹
    pub fn default_folders() -> Self {
        Self {
            folders: ["INBOX", "Spam", "Invoices"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// 抓取过滤条件（向导第 4 步）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFilters {
    pub unseen_only: bool,
    #[serde(default)]
    pub since_days: Option<u32>,
}

impl Default for FetchFilters {
    fn default() -> Self {
        Self {
            unseen_only: true,
            since_days: Some(7),
        }
    }
}

/// 单个文件夹的抓取请求
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub host: String,
    pub port: u16,
    pub email: String,
    pub password: String,
    pub tls: bool,
    pub folder: String,
    pub unseen_only: bool,
    pub since_days: Option<u32>,
}

impl FetchRequest {
    pub fn for_folder(creds: &ImapCredentials, folder: &str, filters: FetchFilters) -> Self {
        Self {
            account_id: creds.account_id.clone(),
            host: creds.host.clone(),
            port: creds.port,
            email: creds.email.clone(),
            password: creds.password.clone(),
            tls: creds.tls,
            folder: folder.to_string(),
            unseen_only: filters.unseen_only,
            since_days: filters.since_days,
        }
    }
}

/// 单个文件夹的抓取结果；`fetched` 与 `invoices` 后端可能只回其一
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    #[serde(default)]
    pub fetched: Option<u32>,
    #[serde(default)]
    pub invoices: Option<Vec<Invoice>>,
}

impl FetchResponse {
    /// 本批次计数：优先信任 `fetched`，否则取清单长度
    pub fn count(&self) -> u32 {
        self.fetched
            .unwrap_or_else(|| self.invoices.as_ref().map_or(0, |v| v.len() as u32))
    }
}

/// 已抓取数据的查询过滤器；`All` 等价于不过滤
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceQuery {
    pub supplier: Option<String>,
    pub status: Option<String>,
    pub format: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// 已抓取数据列表响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapedList {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Invoice>,
    #[serde(default)]
    pub total: u32,
}

/// 统计卡片数据
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedStats {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub pending: u32,
    #[serde(default)]
    pub approved: u32,
    #[serde(default)]
    pub rejected: u32,
    #[serde(default)]
    pub pdf_count: u32,
    #[serde(default)]
    pub xml_count: u32,
    #[serde(default)]
    pub total_amount: f64,
}

/// 批量修改负载
#[derive(Debug, Clone, Default, Serialize)]
pub struct InvoiceUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
}
