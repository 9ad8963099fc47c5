//! 认证模块
//!
//! 把会话解析器接到 Leptos 信号上：UI 凭信号免轮询地感知登录态变化，
//! 路由与组件通过 Context 拿到解析器句柄与状态。登录/登出的入口
//! 也集中在这里。

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;

use invomail_shared::auth::{LoginRequest, SessionPayload};

use crate::api::{ApiClient, ApiError};
use crate::session::{BrowserProvider, SessionEvent, SessionResolver};
use crate::web::LocalStorage;

/// 浏览器环境下的具体解析器
pub type AppResolver = SessionResolver<LocalStorage, BrowserProvider>;

/// 解析器句柄（Context 注入；守卫与登出需要具体类型的能力）
#[derive(Clone)]
pub struct SessionHandle(pub Arc<AppResolver>);

/// UI 可读的会话快照
#[derive(Clone, Default)]
pub struct SessionState {
    pub ready: bool,
    pub session: Option<SessionPayload>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn email(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|s| s.email().map(str::to_string))
    }
}

/// 认证上下文：只读状态 + 写入信号，经 Context 在组件间共享
#[derive(Clone, Copy)]
pub struct SessionContext {
    pub state: ReadSignal<SessionState>,
    set_state: WriteSignal<SessionState>,
}

impl SessionContext {
    /// 认证状态信号（登录页「已登录则跳转」等场景用）
    pub fn is_authenticated_signal(&self) -> Signal<bool> {
        let state = self.state;
        Signal::derive(move || state.get().is_authenticated())
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> SessionContext {
    use_context::<SessionContext>().expect("SessionContext should be provided")
}

/// 从 Context 获取解析器句柄
pub fn use_session() -> SessionHandle {
    use_context::<SessionHandle>().expect("SessionHandle should be provided")
}

/// 进程启动时创建并初始化会话解析器，桥接到信号。
/// 恰好调用一次（App 根部）。
pub fn init_session() -> (SessionHandle, SessionContext) {
    let resolver = Arc::new(SessionResolver::new(
        LocalStorage,
        BrowserProvider::new(),
    ));

    let (state, set_state) = signal(SessionState::default());
    let ctx = SessionContext { state, set_state };

    // 解析器广播 → 信号更新 → 相关组件重渲染
    resolver.subscribe(move |event| match event {
        SessionEvent::Ready => set_state.update(|s| s.ready = true),
        SessionEvent::Changed(session) => {
            let session = session.clone();
            set_state.update(|s| s.session = session);
        }
    });

    resolver.clone().attach_provider_events();

    {
        let resolver = resolver.clone();
        spawn_local(async move {
            resolver.initialize().await;
        });
    }

    (SessionHandle(resolver), ctx)
}

/// 凭据登录：成功后采纳返回的会话（或至少置登录标记）
pub async fn login(
    handle: &SessionHandle,
    api: &ApiClient,
    email: String,
    password: String,
) -> Result<(), ApiError> {
    let response = api.login(&LoginRequest { email, password }).await?;
    match response.session {
        Some(session) => handle.0.adopt_session(session),
        // 后端没回会话体：至少记下登录标记，token 走回退链
        None => handle.0.mark_logged_in(),
    }
    Ok(())
}

/// 显式登出。导航由调用方处理。
pub fn logout(handle: &SessionHandle) {
    let resolver = handle.0.clone();
    spawn_local(async move {
        resolver.sign_out().await;
    });
}

/// 发起 Google OAuth：提供方优先，失败退回后端入口整页跳转
pub async fn start_google_oauth(handle: &SessionHandle, api: &ApiClient) {
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default();
    let redirect = format!("{origin}/dashboard");

    if let Err(err) = handle.0.begin_oauth("google", &redirect).await {
        web_sys::console::warn_1(
            &format!("[oauth] provider flow failed, using backend fallback: {err}").into(),
        );
        if let Some(window) = web_sys::window() {
            let _ = window.open_with_url_and_target(&api.backend_google_oauth_url(), "_self");
        }
    }
}

/// 从 Context 获取 API 客户端
pub fn use_api() -> ApiClient {
    use_context::<ApiClient>().expect("ApiClient should be provided")
}
