//! 后端 API 客户端
//!
//! 每个导出方法对应恰好一个后端端点，全部经由同一个请求原语：
//! 解析基地址、等待会话就绪、按需附加 Bearer、序列化 JSON、
//! 归一化错误对象。认证端点（signup/login/OAuth 状态）永不附加
//! token，避免登录过程中的循环依赖。
//!
//! 客户端自身从不展示 UI；错误如何呈现由调用组件决定。

use std::sync::Arc;

use futures::future::{Either, select};
use futures::pin_mut;
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use invomail_shared::auth::{
    AuthResponse, GoogleStatus, LoginRequest, ManagedUser, SignupRequest, UserProfile,
};
use invomail_shared::directory::{
    DuplicateGroup, IdBatch, MergeSuppliersRequest, Rule, Supplier, SupplierContact,
};
use invomail_shared::export::{ExportRun, ExportTemplate, RunExportRequest};
use invomail_shared::invoice::{
    FetchRequest, FetchResponse, FolderList, Invoice, InvoiceQuery, InvoiceUpdates, ScrapedList,
    ScrapedStats, TestConnectionRequest,
};
use invomail_shared::retrieval::{RetrievalConfig, RetrievalLogEntry, RetrievalStatus};
use invomail_shared::{Ack, ListBody};

use crate::config::AppConfig;
use crate::session::SessionGate;

// =========================================================
// 错误归一化
// =========================================================

/// 调用方可分支的失败分类：网络失败（无响应）、超时、
/// HTTP 错误（状态码 + 结构化响应体）、响应不可解
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    Network(String),
    Timeout,
    Status {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },
    Decode(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Timeout => write!(f, "request timed out"),
            ApiError::Status { message, .. } => f.write_str(message),
            ApiError::Decode(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl ApiError {
    /// HTTP 状态码（仅 `Status` 变体）
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 后端错误码（响应体的 `code` 字段）
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ApiError::Status { body: Some(body), .. } => body.get("code").and_then(|c| c.as_str()),
            _ => None,
        }
    }

    /// 从非 2xx 响应构造：响应体的 `error` 字段优先，其次 statusText
    fn from_response(status: u16, status_text: &str, body: Option<serde_json::Value>) -> Self {
        let message = body
            .as_ref()
            .and_then(|b| b.get("error"))
            .and_then(|e| e.as_str())
            .map(str::to_string)
            .or_else(|| {
                let text = status_text.trim();
                (!text.is_empty()).then(|| text.to_string())
            })
            .unwrap_or_else(|| "Request failed".to_string());
        ApiError::Status {
            status,
            message,
            body,
        }
    }
}

/// 认证端点不附加 Authorization（登录自身不能依赖已登录）
fn is_auth_endpoint(path: &str) -> bool {
    path.contains("/api/auth/")
}

fn to_json<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

// =========================================================
// 客户端
// =========================================================

#[derive(Clone)]
pub struct ApiClient {
    base: String,
    timeout_ms: u32,
    session: Arc<dyn SessionGate + Send + Sync>,
}

impl ApiClient {
    pub fn new(config: &AppConfig, session: Arc<dyn SessionGate + Send + Sync>) -> Self {
        Self {
            base: config.api_base.trim_end_matches('/').to_string(),
            timeout_ms: config.request_timeout_ms,
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base, path)
        } else {
            format!("{}/{}", self.base, path)
        }
    }

    fn builder(&self, method: &Method, url: &str) -> RequestBuilder {
        match method {
            Method::Get => Request::get(url),
            Method::Post => Request::post(url),
            Method::Put => Request::put(url),
            Method::Patch => Request::patch(url),
            Method::Delete => Request::delete(url),
        }
    }

    /// 解析本次请求要附加的 bearer；认证端点一律跳过（也不等待就绪）
    async fn bearer(&self, path: &str) -> Option<String> {
        if is_auth_endpoint(path) {
            return None;
        }
        // 刷新后的第一批请求必须先等提供方初始化完成，
        // 否则会和会话恢复竞态
        self.session.wait_until_ready().await;
        self.session
            .resolve_access_token()
            .await
            .map(|resolved| resolved.token)
    }

    /// 带超时地发送；挂死的后端不再挂死调用方
    async fn send(&self, request: Request) -> Result<Response, ApiError> {
        let fut = request.send();
        let timeout = gloo_timers::future::TimeoutFuture::new(self.timeout_ms);
        pin_mut!(fut);
        pin_mut!(timeout);
        match select(fut, timeout).await {
            Either::Left((result, _)) => result.map_err(|e| ApiError::Network(e.to_string())),
            Either::Right(_) => Err(ApiError::Timeout),
        }
    }

    /// 请求原语：2xx 且响应体可解 → Some；2xx 但空/非 JSON → None；
    /// 非 2xx → `ApiError::Status`
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Option<T>, ApiError> {
        let url = self.url(path);
        let mut builder = self.builder(&method, &url);
        if let Some(token) = self.bearer(path).await {
            builder = builder.header("Authorization", &format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .json(&body)
                .map_err(|e| ApiError::Decode(e.to_string()))?,
            None => builder
                .build()
                .map_err(|e| ApiError::Decode(e.to_string()))?,
        };

        let response = self.send(request).await?;
        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<Option<T>, ApiError> {
        let status = response.status();
        let status_text = response.status_text();
        let text = response.text().await.unwrap_or_default();
        let parsed: Option<serde_json::Value> = serde_json::from_str(&text).ok();

        if !response.ok() {
            return Err(ApiError::from_response(status, &status_text, parsed));
        }
        match parsed {
            Some(value) => match serde_json::from_value::<T>(value) {
                Ok(typed) => Ok(Some(typed)),
                Err(err) => {
                    log::warn!("api: response shape mismatch for successful call: {err}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// 文件类请求：multipart 由运行时管理边界，绝不手动设置 Content-Type
    async fn send_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: web_sys::FormData,
    ) -> Result<Option<T>, ApiError> {
        let url = self.url(path);
        let mut builder = Request::post(&url);
        if let Some(token) = self.bearer(path).await {
            builder = builder.header("Authorization", &format!("Bearer {token}"));
        }
        let request = builder
            .body(form)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self.send(request).await?;
        Self::read_json(response).await
    }

    // =========================================================
    // 认证
    // =========================================================

    pub async fn signup(&self, payload: &SignupRequest) -> Result<AuthResponse, ApiError> {
        let body = to_json(payload)?;
        Ok(self
            .request::<AuthResponse>(Method::Post, "/api/auth/signup", Some(body))
            .await?
            .unwrap_or_default())
    }

    pub async fn login(&self, payload: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let body = to_json(payload)?;
        Ok(self
            .request::<AuthResponse>(Method::Post, "/api/auth/login", Some(body))
            .await?
            .unwrap_or_default())
    }

    pub async fn google_status(&self) -> Result<GoogleStatus, ApiError> {
        Ok(self
            .request::<GoogleStatus>(Method::Get, "/api/auth/google/status", None)
            .await?
            .unwrap_or_default())
    }

    /// 提供方 OAuth 失败时的后备入口（整页跳转用）
    pub fn backend_google_oauth_url(&self) -> String {
        self.url("/api/auth/google")
    }

    // =========================================================
    // 账号
    // =========================================================

    pub async fn list_accounts(&self) -> Result<Vec<invomail_shared::Account>, ApiError> {
        Ok(self
            .request::<ListBody<invomail_shared::Account>>(Method::Get, "/api/accounts", None)
            .await?
            .unwrap_or_default()
            .into_vec())
    }

    pub async fn create_account(
        &self,
        payload: &invomail_shared::CreateAccountRequest,
    ) -> Result<Option<invomail_shared::Account>, ApiError> {
        let body = to_json(payload)?;
        self.request(Method::Post, "/api/accounts", Some(body)).await
    }

    pub async fn delete_account(&self, id: &str) -> Result<(), ApiError> {
        self.request::<Ack>(Method::Delete, &format!("/api/accounts/{id}"), None)
            .await?;
        Ok(())
    }

    pub async fn get_users(&self) -> Result<Vec<ManagedUser>, ApiError> {
        Ok(self
            .request::<ListBody<ManagedUser>>(Method::Get, "/api/accounts/users", None)
            .await?
            .unwrap_or_default()
            .into_vec())
    }

    pub async fn update_user_status(&self, user_id: &str, status: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "status": status });
        self.request::<Ack>(
            Method::Patch,
            &format!("/api/accounts/users/{user_id}/status"),
            Some(body),
        )
        .await?;
        Ok(())
    }

    pub async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        Ok(self
            .request::<UserProfile>(Method::Get, "/api/accounts/profile", None)
            .await?
            .unwrap_or_default())
    }

    pub async fn update_profile(&self, profile: &UserProfile) -> Result<(), ApiError> {
        let body = to_json(profile)?;
        self.request::<Ack>(Method::Put, "/api/accounts/profile", Some(body))
            .await?;
        Ok(())
    }

    // =========================================================
    // IMAP 与发票抓取
    // =========================================================

    pub async fn test_imap_connection(
        &self,
        payload: &TestConnectionRequest,
    ) -> Result<(), ApiError> {
        let body = to_json(payload)?;
        self.request::<Ack>(Method::Post, "/api/invoices/test-connection", Some(body))
            .await?;
        Ok(())
    }

    /// 列出账号的 IMAP 文件夹；端点不可用时退回常见默认值
    pub async fn list_imap_folders(&self, email: &str) -> FolderList {
        let query: String =
            url::form_urlencoded::Serializer::new(String::new())
                .append_pair("email", email)
                .finish();
        match self
            .request::<FolderList>(Method::Get, &format!("/api/invoices/folders?{query}"), None)
            .await
        {
            Ok(Some(list)) if !list.folders.is_empty() => list,
            Ok(_) => FolderList::default_folders(),
            Err(err) => {
                log::warn!("api: folder listing fell back to defaults: {err}");
                FolderList::default_folders()
            }
        }
    }

    pub async fn fetch_imap_invoices(
        &self,
        payload: &FetchRequest,
    ) -> Result<FetchResponse, ApiError> {
        let body = to_json(payload)?;
        Ok(self
            .request::<FetchResponse>(Method::Post, "/api/invoices/fetch", Some(body))
            .await?
            .unwrap_or_default())
    }

    // =========================================================
    // 已抓取数据
    // =========================================================

    pub async fn get_scraped_invoices(&self, query: &InvoiceQuery) -> Result<ScrapedList, ApiError> {
        let path = format!("/api/scraped-data{}", invoice_query_string(query));
        Ok(self
            .request::<ScrapedList>(Method::Get, &path, None)
            .await?
            .unwrap_or_default())
    }

    pub async fn get_scraped_stats(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<ScrapedStats, ApiError> {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(start) = start_date {
            serializer.append_pair("startDate", start);
        }
        if let Some(end) = end_date {
            serializer.append_pair("endDate", end);
        }
        let query = serializer.finish();
        let path = if query.is_empty() {
            "/api/scraped-data/stats".to_string()
        } else {
            format!("/api/scraped-data/stats?{query}")
        };
        Ok(self
            .request::<ScrapedStats>(Method::Get, &path, None)
            .await?
            .unwrap_or_default())
    }

    pub async fn get_suppliers_list(&self) -> Result<Vec<String>, ApiError> {
        Ok(self
            .request::<ListBody<String>>(Method::Get, "/api/scraped-data/suppliers", None)
            .await?
            .unwrap_or_default()
            .into_vec())
    }

    pub async fn get_scraped_invoice(&self, id: &str) -> Result<Option<Invoice>, ApiError> {
        self.request(Method::Get, &format!("/api/scraped-data/{id}"), None)
            .await
    }

    pub async fn update_invoice_status(&self, id: &str, status: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "status": status });
        self.request::<Ack>(
            Method::Patch,
            &format!("/api/scraped-data/{id}/status"),
            Some(body),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_scraped_invoices(&self, ids: &[String]) -> Result<(), ApiError> {
        let body = serde_json::json!({ "ids": ids });
        self.request::<Ack>(Method::Delete, "/api/scraped-data", Some(body))
            .await?;
        Ok(())
    }

    pub async fn bulk_update_scraped_invoices(
        &self,
        ids: &[String],
        updates: &InvoiceUpdates,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "ids": ids, "updates": to_json(updates)? });
        self.request::<Ack>(Method::Patch, "/api/scraped-data/bulk", Some(body))
            .await?;
        Ok(())
    }

    /// 带鉴权的 CSV 下载；返回原始字节
    pub async fn export_invoices_csv(&self, query: &InvoiceQuery) -> Result<Vec<u8>, ApiError> {
        let path = format!("/api/scraped-data/export/csv{}", invoice_query_string(query));
        let url = self.url(&path);
        let mut builder = Request::get(&url);
        if let Some(token) = self.bearer(&path).await {
            builder = builder.header("Authorization", &format!("Bearer {token}"));
        }
        let request = builder
            .build()
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self.send(request).await?;
        if !response.ok() {
            return Err(ApiError::from_response(
                response.status(),
                &response.status_text(),
                None,
            ));
        }
        response
            .binary()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// 上传本地发票文件（multipart）
    pub async fn upload_file(
        &self,
        file: &web_sys::File,
        account_id: Option<&str>,
    ) -> Result<Option<Invoice>, ApiError> {
        let form = web_sys::FormData::new()
            .map_err(|e| ApiError::Network(format!("{e:?}")))?;
        form.append_with_blob("file", file)
            .map_err(|e| ApiError::Network(format!("{e:?}")))?;
        if let Some(id) = account_id {
            let _ = form.append_with_str("accountId", id);
        }
        self.send_form("/api/uploads", form).await
    }

    /// 发票随邮件发送（可带附件）
    pub async fn send_invoice_email(
        &self,
        invoice_id: &str,
        to: &str,
        subject: &str,
        message: &str,
        file: Option<&web_sys::File>,
    ) -> Result<(), ApiError> {
        let form = web_sys::FormData::new()
            .map_err(|e| ApiError::Network(format!("{e:?}")))?;
        let _ = form.append_with_str("to", to);
        let _ = form.append_with_str("subject", subject);
        let _ = form.append_with_str("message", message);
        let _ = form.append_with_str("invoiceId", invoice_id);
        if let Some(file) = file {
            let _ = form.append_with_blob("file", file);
        }
        self.send_form::<Ack>("/api/invoices/send-email", form)
            .await?;
        Ok(())
    }

    // =========================================================
    // 自动取件
    // =========================================================

    pub async fn get_retrieval_status(&self) -> Result<RetrievalStatus, ApiError> {
        Ok(self
            .request::<RetrievalStatus>(Method::Get, "/api/retrieval/status", None)
            .await?
            .unwrap_or_default())
    }

    pub async fn set_retrieval_status(&self, enabled: bool) -> Result<(), ApiError> {
        let body = serde_json::json!({ "enabled": enabled });
        self.request::<Ack>(Method::Post, "/api/retrieval/status", Some(body))
            .await?;
        Ok(())
    }

    pub async fn get_retrieval_config(&self) -> Result<RetrievalConfig, ApiError> {
        Ok(self
            .request::<RetrievalConfig>(Method::Get, "/api/retrieval/config", None)
            .await?
            .unwrap_or_default())
    }

    pub async fn set_retrieval_config(&self, config: &RetrievalConfig) -> Result<(), ApiError> {
        let body = to_json(config)?;
        self.request::<Ack>(Method::Post, "/api/retrieval/config", Some(body))
            .await?;
        Ok(())
    }

    pub async fn run_retrieval_now(&self) -> Result<(), ApiError> {
        self.request::<Ack>(Method::Post, "/api/retrieval/run", None)
            .await?;
        Ok(())
    }

    pub async fn get_retrieval_logs(&self) -> Result<Vec<RetrievalLogEntry>, ApiError> {
        Ok(self
            .request::<ListBody<RetrievalLogEntry>>(Method::Get, "/api/retrieval/logs", None)
            .await?
            .unwrap_or_default()
            .into_vec())
    }

    // =========================================================
    // 规则
    // =========================================================

    pub async fn list_rules(&self) -> Result<Vec<Rule>, ApiError> {
        Ok(self
            .request::<ListBody<Rule>>(Method::Get, "/api/rules", None)
            .await?
            .unwrap_or_default()
            .into_vec())
    }

    pub async fn create_rule(&self, rule: &Rule) -> Result<(), ApiError> {
        let body = to_json(rule)?;
        self.request::<Ack>(Method::Post, "/api/rules", Some(body))
            .await?;
        Ok(())
    }

    pub async fn update_rule(&self, id: &str, rule: &Rule) -> Result<(), ApiError> {
        let body = to_json(rule)?;
        self.request::<Ack>(Method::Put, &format!("/api/rules/{id}"), Some(body))
            .await?;
        Ok(())
    }

    pub async fn delete_rules(&self, ids: &[String]) -> Result<(), ApiError> {
        let body = to_json(&IdBatch { ids: ids.to_vec() })?;
        self.request::<Ack>(Method::Post, "/api/rules/delete", Some(body))
            .await?;
        Ok(())
    }

    // =========================================================
    // 供应商目录
    // =========================================================

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, ApiError> {
        Ok(self
            .request::<ListBody<Supplier>>(Method::Get, "/api/suppliers", None)
            .await?
            .unwrap_or_default()
            .into_vec())
    }

    pub async fn get_supplier(&self, id: &str) -> Result<Option<Supplier>, ApiError> {
        self.request(Method::Get, &format!("/api/suppliers/{id}"), None)
            .await
    }

    pub async fn create_supplier(&self, supplier: &Supplier) -> Result<(), ApiError> {
        let body = to_json(supplier)?;
        self.request::<Ack>(Method::Post, "/api/suppliers", Some(body))
            .await?;
        Ok(())
    }

    pub async fn update_supplier(&self, id: &str, supplier: &Supplier) -> Result<(), ApiError> {
        let body = to_json(supplier)?;
        self.request::<Ack>(Method::Put, &format!("/api/suppliers/{id}"), Some(body))
            .await?;
        Ok(())
    }

    pub async fn delete_suppliers(&self, ids: &[String]) -> Result<(), ApiError> {
        let body = to_json(&IdBatch { ids: ids.to_vec() })?;
        self.request::<Ack>(Method::Post, "/api/suppliers/delete", Some(body))
            .await?;
        Ok(())
    }

    pub async fn merge_suppliers(&self, request: &MergeSuppliersRequest) -> Result<(), ApiError> {
        let body = to_json(request)?;
        self.request::<Ack>(Method::Post, "/api/suppliers/merge", Some(body))
            .await?;
        Ok(())
    }

    pub async fn block_suppliers(&self, ids: &[String]) -> Result<(), ApiError> {
        self.supplier_batch("/api/suppliers/block", ids).await
    }

    pub async fn activate_suppliers(&self, ids: &[String]) -> Result<(), ApiError> {
        self.supplier_batch("/api/suppliers/activate", ids).await
    }

    pub async fn deactivate_suppliers(&self, ids: &[String]) -> Result<(), ApiError> {
        self.supplier_batch("/api/suppliers/deactivate", ids).await
    }

    async fn supplier_batch(&self, path: &str, ids: &[String]) -> Result<(), ApiError> {
        let body = to_json(&IdBatch { ids: ids.to_vec() })?;
        self.request::<Ack>(Method::Post, path, Some(body)).await?;
        Ok(())
    }

    pub async fn get_supplier_duplicates(&self) -> Result<Vec<DuplicateGroup>, ApiError> {
        Ok(self
            .request::<ListBody<DuplicateGroup>>(Method::Get, "/api/suppliers/duplicates", None)
            .await?
            .unwrap_or_default()
            .into_vec())
    }

    pub async fn get_supplier_review_queue(&self) -> Result<Vec<Supplier>, ApiError> {
        Ok(self
            .request::<ListBody<Supplier>>(Method::Get, "/api/suppliers/review-queue", None)
            .await?
            .unwrap_or_default()
            .into_vec())
    }

    pub async fn auto_link_supplier_invoices(&self) -> Result<(), ApiError> {
        self.request::<Ack>(Method::Post, "/api/suppliers/auto-link", None)
            .await?;
        Ok(())
    }

    pub async fn list_supplier_contacts(
        &self,
        supplier_id: &str,
    ) -> Result<Vec<SupplierContact>, ApiError> {
        Ok(self
            .request::<ListBody<SupplierContact>>(
                Method::Get,
                &format!("/api/suppliers/{supplier_id}/contacts"),
                None,
            )
            .await?
            .unwrap_or_default()
            .into_vec())
    }

    pub async fn create_supplier_contact(
        &self,
        supplier_id: &str,
        contact: &SupplierContact,
    ) -> Result<(), ApiError> {
        let body = to_json(contact)?;
        self.request::<Ack>(
            Method::Post,
            &format!("/api/suppliers/{supplier_id}/contacts"),
            Some(body),
        )
        .await?;
        Ok(())
    }

    pub async fn update_supplier_contact(
        &self,
        contact_id: &str,
        contact: &SupplierContact,
    ) -> Result<(), ApiError> {
        let body = to_json(contact)?;
        self.request::<Ack>(
            Method::Put,
            &format!("/api/suppliers/contacts/{contact_id}"),
            Some(body),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_supplier_contact(&self, contact_id: &str) -> Result<(), ApiError> {
        self.request::<Ack>(
            Method::Delete,
            &format!("/api/suppliers/contacts/{contact_id}"),
            None,
        )
        .await?;
        Ok(())
    }

    // =========================================================
    // 导出
    // =========================================================

    pub async fn list_export_templates(&self) -> Result<Vec<ExportTemplate>, ApiError> {
        Ok(self
            .request::<ListBody<ExportTemplate>>(Method::Get, "/api/exports/templates", None)
            .await?
            .unwrap_or_default()
            .into_vec())
    }

    pub async fn create_export_template(&self, template: &ExportTemplate) -> Result<(), ApiError> {
        let body = to_json(template)?;
        self.request::<Ack>(Method::Post, "/api/exports/templates", Some(body))
            .await?;
        Ok(())
    }

    pub async fn update_export_template(
        &self,
        id: &str,
        template: &ExportTemplate,
    ) -> Result<(), ApiError> {
        let body = to_json(template)?;
        self.request::<Ack>(
            Method::Put,
            &format!("/api/exports/templates/{id}"),
            Some(body),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_export_template(&self, id: &str) -> Result<(), ApiError> {
        self.request::<Ack>(Method::Delete, &format!("/api/exports/templates/{id}"), None)
            .await?;
        Ok(())
    }

    pub async fn list_export_runs(&self) -> Result<Vec<ExportRun>, ApiError> {
        Ok(self
            .request::<ListBody<ExportRun>>(Method::Get, "/api/exports/runs", None)
            .await?
            .unwrap_or_default()
            .into_vec())
    }

    pub async fn get_export_run(&self, id: &str) -> Result<Option<ExportRun>, ApiError> {
        self.request(Method::Get, &format!("/api/exports/runs/{id}"), None)
            .await
    }

    pub async fn run_export_job(&self, request: &RunExportRequest) -> Result<(), ApiError> {
        let body = to_json(request)?;
        self.request::<Ack>(Method::Post, "/api/exports/run", Some(body))
            .await?;
        Ok(())
    }

    pub async fn create_export_presets(&self) -> Result<(), ApiError> {
        self.request::<Ack>(Method::Post, "/api/exports/presets", None)
            .await?;
        Ok(())
    }

    /// 导出产物的下载地址（交给 `<a href>`，鉴权由后端下载令牌处理）
    pub fn export_download_url(&self, run_id: &str) -> String {
        self.url(&format!("/api/exports/runs/{run_id}/download"))
    }
}

/// 构造已抓取数据的查询串；`All`/空值一律跳过
fn invoice_query_string(query: &InvoiceQuery) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut push = |key: &str, value: &Option<String>| {
        if let Some(value) = value {
            if !value.is_empty() && value != "All" {
                serializer.append_pair(key, value);
            }
        }
    };
    push("supplier", &query.supplier);
    push("status", &query.status);
    push("format", &query.format);
    push("startDate", &query.start_date);
    push("endDate", &query.end_date);
    drop(push);
    if let Some(limit) = query.limit {
        serializer.append_pair("limit", &limit.to_string());
    }
    if let Some(offset) = query.offset {
        serializer.append_pair("offset", &offset.to_string());
    }
    let encoded = serializer.finish();
    if encoded.is_empty() {
        String::new()
    } else {
        format!("?{encoded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_endpoints_are_excluded_from_bearer_attachment() {
        assert!(is_auth_endpoint("/api/auth/login"));
        assert!(is_auth_endpoint("/api/auth/signup"));
        assert!(is_auth_endpoint("/api/auth/google/status"));
        assert!(!is_auth_endpoint("/api/accounts"));
        assert!(!is_auth_endpoint("/api/scraped-data"));
    }

    #[test]
    fn query_string_skips_all_and_empty_values() {
        let query = InvoiceQuery {
            supplier: Some("All".into()),
            status: Some("Pending".into()),
            format: Some(String::new()),
            start_date: None,
            end_date: None,
            limit: Some(50),
            offset: Some(0),
        };
        assert_eq!(invoice_query_string(&query), "?status=Pending&limit=50&offset=0");
    }

    #[test]
    fn empty_query_produces_no_question_mark() {
        assert_eq!(invoice_query_string(&InvoiceQuery::default()), "");
    }

    #[test]
    fn error_message_prefers_structured_body() {
        let body = serde_json::json!({ "error": "Invalid credentials", "code": "bad_login" });
        let err = ApiError::from_response(401, "Unauthorized", Some(body));
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.error_code(), Some("bad_login"));
    }

    #[test]
    fn error_message_falls_back_to_status_text_then_generic() {
        let err = ApiError::from_response(500, "Internal Server Error", None);
        assert_eq!(err.to_string(), "Internal Server Error");

        let err = ApiError::from_response(401, "", None);
        assert_eq!(err.to_string(), "Request failed");
        assert!(err.error_code().is_none());
    }
}
