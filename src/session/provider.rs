//! 认证提供方抽象
//!
//! 提供方（如内嵌认证后端或 Google OAuth 的托管客户端）通过页面注入的
//! JS 客户端对象暴露：`window.invomailAuth.auth`。全局对象缺失即视为
//! "未配置提供方"，应用照常渲染，会话判定退化到持久层回退链。

use async_trait::async_trait;
use invomail_shared::auth::SessionPayload;
use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::serde_helper;

/// 提供方对"当前会话"询问的三种回答
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderAnswer {
    /// 有具体会话
    Session(SessionPayload),
    /// 明确无会话（刷新后的瞬态 None 也走这里——不得据此清存储）
    NoSession,
    /// 提供方不可用/未配置
    Unavailable,
}

/// 提供方推送的状态变化
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    SignedIn(SessionPayload),
    TokenRefreshed(SessionPayload),
    InitialSession(Option<SessionPayload>),
    SignedOut,
}

/// 认证提供方接口；浏览器实现绑定 JS 客户端，测试用内存 mock
#[async_trait(?Send)]
pub trait AuthProvider {
    async fn current_session(&self) -> ProviderAnswer;

    /// 显式登出（尽力而为；失败不阻断本地清理）
    async fn sign_out(&self);

    /// 订阅提供方的状态变化广播
    fn subscribe(&self, listener: Box<dyn Fn(ProviderEvent)>);

    /// 发起 OAuth 重定向流程
    async fn begin_oauth(&self, provider: &str, redirect_to: &str) -> Result<(), String>;
}

// =========================================================
// 浏览器实现
// =========================================================

/// 页面全局上的提供方客户端（`window.invomailAuth`）
const PROVIDER_GLOBAL: &str = "invomailAuth";

/// 无状态绑定：每次调用都从页面全局解析客户端对象，
/// 自身不持有任何 JsValue（可安全地跨 Context 传递）。
#[derive(Clone, Copy, Default)]
pub struct BrowserProvider;

impl BrowserProvider {
    pub fn new() -> Self {
        Self
    }

    /// 解析 `window.invomailAuth.auth`；拿不到就是"未配置"
    fn auth_object() -> Option<Object> {
        web_sys::window()
            .map(JsValue::from)
            .and_then(|w| Reflect::get(&w, &PROVIDER_GLOBAL.into()).ok())
            .and_then(|client| Reflect::get(&client, &"auth".into()).ok())
            .and_then(|auth| auth.dyn_into::<Object>().ok())
    }

    fn is_configured(&self) -> bool {
        Self::auth_object().is_some()
    }

    fn method(&self, name: &str) -> Option<(Function, JsValue)> {
        let auth = Self::auth_object()?;
        let func = Reflect::get(&auth, &name.into())
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        Some((func, auth.into()))
    }

    async fn call_async(&self, name: &str, args: &[JsValue]) -> Option<JsValue> {
        let (func, this) = self.method(name)?;
        let result = match args {
            [] => func.call0(&this),
            [a] => func.call1(&this, a),
            _ => func.call2(&this, &args[0], &args[1]),
        }
        .ok()?;
        let promise: Promise = result.dyn_into().ok()?;
        JsFuture::from(promise).await.ok()
    }

    /// `getSession()` 的响应形如 `{ data: { session } }`
    fn session_from_response(value: JsValue) -> Option<SessionPayload> {
        let data = Reflect::get(&value, &"data".into()).ok()?;
        let session = Reflect::get(&data, &"session".into()).ok()?;
        parse_session(session)
    }
}

fn parse_session(value: JsValue) -> Option<SessionPayload> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    match serde_helper::from_value::<SessionPayload>(value) {
        Ok(session) => Some(session),
        Err(err) => {
            web_sys::console::warn_1(&format!("[auth] unreadable provider session: {err}").into());
            None
        }
    }
}

#[async_trait(?Send)]
impl AuthProvider for BrowserProvider {
    async fn current_session(&self) -> ProviderAnswer {
        if !self.is_configured() {
            return ProviderAnswer::Unavailable;
        }
        match self.call_async("getSession", &[]).await {
            Some(value) => match Self::session_from_response(value) {
                Some(session) => ProviderAnswer::Session(session),
                None => ProviderAnswer::NoSession,
            },
            // 调用本身失败也当作"暂无会话"，绝不上抛
            None => ProviderAnswer::NoSession,
        }
    }

    async fn sign_out(&self) {
        let _ = self.call_async("signOut", &[]).await;
    }

    fn subscribe(&self, listener: Box<dyn Fn(ProviderEvent)>) {
        let Some((func, this)) = self.method("onAuthStateChange") else {
            return;
        };
        let closure = Closure::<dyn Fn(JsValue, JsValue)>::new(move |event: JsValue, session: JsValue| {
            let name = event.as_string().unwrap_or_default();
            let payload = parse_session(session);
            let event = match (name.as_str(), payload) {
                ("SIGNED_IN", Some(s)) => ProviderEvent::SignedIn(s),
                ("TOKEN_REFRESHED", Some(s)) => ProviderEvent::TokenRefreshed(s),
                ("SIGNED_OUT", _) => ProviderEvent::SignedOut,
                ("INITIAL_SESSION", s) => ProviderEvent::InitialSession(s),
                // 带会话的未知事件按刷新处理，否则忽略
                (_, Some(s)) => ProviderEvent::TokenRefreshed(s),
                (_, None) => return,
            };
            listener(event);
        });
        let _ = func.call1(&this, closure.as_ref());
        // 监听器与页面同生命周期
        closure.forget();
    }

    async fn begin_oauth(&self, provider: &str, redirect_to: &str) -> Result<(), String> {
        if !self.is_configured() {
            return Err("auth provider is not configured".into());
        }
        let options = Object::new();
        let _ = Reflect::set(&options, &"redirectTo".into(), &redirect_to.into());
        let args = Object::new();
        let _ = Reflect::set(&args, &"provider".into(), &provider.into());
        let _ = Reflect::set(&args, &"options".into(), &options.into());

        match self.call_async("signInWithOAuth", &[args.into()]).await {
            Some(result) => {
                // 响应形如 { error }；error 非空视为失败
                let error = Reflect::get(&result, &"error".into()).ok();
                match error {
                    Some(e) if !e.is_null() && !e.is_undefined() => {
                        Err(format!("{:?}", e))
                    }
                    _ => Ok(()),
                }
            }
            None => Err("OAuth call failed".into()),
        }
    }
}

// =========================================================
// 测试 mock
// =========================================================

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// 可脚本化的提供方 mock
    #[derive(Clone, Default)]
    pub struct MockProvider {
        inner: Rc<RefCell<MockInner>>,
    }

    #[derive(Default)]
    struct MockInner {
        answer: Option<ProviderAnswer>,
        sign_outs: u32,
        listeners: Vec<Box<dyn Fn(ProviderEvent)>>,
    }

    impl MockProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn unavailable() -> Self {
            let mock = Self::new();
            mock.set_answer(ProviderAnswer::Unavailable);
            mock
        }

        pub fn with_no_session() -> Self {
            let mock = Self::new();
            mock.set_answer(ProviderAnswer::NoSession);
            mock
        }

        pub fn with_session(session: SessionPayload) -> Self {
            let mock = Self::new();
            mock.set_answer(ProviderAnswer::Session(session));
            mock
        }

        pub fn set_answer(&self, answer: ProviderAnswer) {
            self.inner.borrow_mut().answer = Some(answer);
        }

        pub fn sign_out_count(&self) -> u32 {
            self.inner.borrow().sign_outs
        }

        /// 模拟提供方推送事件
        pub fn emit(&self, event: ProviderEvent) {
            let inner = self.inner.borrow();
            for listener in &inner.listeners {
                listener(event.clone());
            }
        }
    }

    #[async_trait(?Send)]
    impl AuthProvider for MockProvider {
        async fn current_session(&self) -> ProviderAnswer {
            self.inner
                .borrow()
                .answer
                .clone()
                .unwrap_or(ProviderAnswer::Unavailable)
        }

        async fn sign_out(&self) {
            self.inner.borrow_mut().sign_outs += 1;
        }

        fn subscribe(&self, listener: Box<dyn Fn(ProviderEvent)>) {
            self.inner.borrow_mut().listeners.push(listener);
        }

        async fn begin_oauth(&self, _provider: &str, _redirect_to: &str) -> Result<(), String> {
            Ok(())
        }
    }
}
