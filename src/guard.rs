//! 登录守卫
//!
//! 每次进入受保护路由时重新裁决"用户是否已登录"。判定是异步且多源的：
//! 按顺序短路于第一个肯定信号，全部落空才拒绝。等待以"会话已就绪"
//! 事件为主、有界超时兜底；固定延迟只作为最后的重试退路，时长全部
//! 来自配置。裁决期间渲染中性加载指示——既不闪登录页也不闪受保护内容。

use std::future::Future;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use futures::future::{Either, select};
use futures::pin_mut;
use leptos::prelude::*;
use leptos::task::spawn_local;

use invomail_shared::{OAUTH_MARKER_PARAM, OAUTH_SUCCESS_PARAM, OAUTH_TOKEN_PARAM};
use invomail_shared::auth::SessionPayload;

use crate::auth::use_session;
use crate::config::AppConfig;
use crate::session::vault::normalize_stored;
use crate::session::{AuthProvider, KeyStore, SessionResolver};
use crate::web::route::AppRoute;
use crate::web::router::{current_search, use_router};

// =========================================================
// OAuth 回调识别
// =========================================================

/// 已识别的 OAuth 回调：提供方标记 + 成功标志，可选内联会话负载
#[derive(Debug, Clone, PartialEq)]
pub struct OauthCallback {
    pub provider: String,
    pub inline_session: Option<SessionPayload>,
}

/// 从查询串识别 OAuth 回调签名（`auth=<provider>&ok=1[&token=<base64>]`）
pub fn parse_oauth_callback(query: &str) -> Option<OauthCallback> {
    let query = query.trim_start_matches('?');
    let mut provider = None;
    let mut ok = false;
    let mut token = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            OAUTH_MARKER_PARAM => provider = Some(value.into_owned()),
            OAUTH_SUCCESS_PARAM => ok = value == "1",
            OAUTH_TOKEN_PARAM => token = Some(value.into_owned()),
            _ => {}
        }
    }
    let provider = provider?;
    if !ok {
        return None;
    }
    Some(OauthCallback {
        provider,
        inline_session: token.as_deref().and_then(decode_inline_session),
    })
}

/// 解码内联会话负载（base64 JSON）；失败按"未携带"处理
fn decode_inline_session(encoded: &str) -> Option<SessionPayload> {
    let bytes = STANDARD
        .decode(encoded)
        .or_else(|_| URL_SAFE_NO_PAD.decode(encoded))
        .ok()?;
    let raw = String::from_utf8(bytes).ok()?;
    normalize_stored(&raw)
}

// =========================================================
// 裁决
// =========================================================

/// 裁决结果；`strip_query` 表示回调参数已消费、需从 URL 清除
/// （replace 导航，刷新不得重走回调分支）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardOutcome {
    pub allowed: bool,
    pub strip_query: bool,
}

/// 守卫主流程。`sleep` 由调用方注入（浏览器为真实定时器，测试可自定义），
/// 同时承担就绪等待的有界超时与 token 重试延迟。
pub async fn evaluate<S, P, Sl, Fut>(
    resolver: &SessionResolver<S, P>,
    query: &str,
    config: &AppConfig,
    sleep: Sl,
) -> GuardOutcome
where
    S: KeyStore + 'static,
    P: AuthProvider + 'static,
    Sl: Fn(u32) -> Fut,
    Fut: Future<Output = ()>,
{
    let callback = parse_oauth_callback(query);
    let strip_query = callback.is_some();

    // 1) 有界等待解析器就绪；提供方永不初始化也不能挂死，
    //    超时后拿缓存继续。已就绪则不起定时器。
    if !resolver.is_ready() {
        let ready = resolver.wait_until_ready();
        let deadline = sleep(config.auth_ready_timeout_ms);
        pin_mut!(ready);
        pin_mut!(deadline);
        if let Either::Right(_) = select(ready, deadline).await {
            log::warn!("guard: session resolver not ready within bound, proceeding with cache");
        }
    }

    // 回调参数无论后续裁决如何都要消费掉（幂等：重复消费无害）
    if let Some(callback) = &callback {
        match &callback.inline_session {
            Some(session) => resolver.adopt_session(session.clone()),
            None => resolver.mark_logged_in(),
        }
    }

    // 2) 已知会话
    if resolver.current_session().is_some() {
        return GuardOutcome {
            allowed: true,
            strip_query,
        };
    }

    // 3) 刚消费过 OAuth 回调即视为登录成功
    if callback.is_some() {
        return GuardOutcome {
            allowed: true,
            strip_query,
        };
    }

    // 4) 持久化信号：布尔标记 / 应用记录 / 存储中的 token
    if resolver.any_persisted_signal() {
        return GuardOutcome {
            allowed: true,
            strip_query,
        };
    }

    // 5) 主动解析一次；为空则等一个配置的短延迟再试一次——
    //    兼容重定向登录刚完成时另一条代码路径的存储写入竞态
    if resolver.resolve_access_token().await.is_some() {
        return GuardOutcome {
            allowed: true,
            strip_query,
        };
    }
    sleep(config.token_retry_delay_ms).await;
    if resolver.resolve_access_token().await.is_some() {
        return GuardOutcome {
            allowed: true,
            strip_query,
        };
    }

    // 所有信号落空：拒绝（fail-closed）
    GuardOutcome {
        allowed: false,
        strip_query,
    }
}

// =========================================================
// UI 组件
// =========================================================

/// 受保护子树的门：裁决通过才渲染 children，否则 replace 到登录页
#[component]
pub fn RequireAuth(children: ChildrenFn) -> impl IntoView {
    let session = use_session();
    let router = use_router();
    let config = use_context::<AppConfig>().unwrap_or_default();

    let (checking, set_checking) = signal(true);
    let (allowed, set_allowed) = signal(false);

    Effect::new(move |_| {
        let session = session.clone();
        let config = config.clone();
        spawn_local(async move {
            let query = current_search();
            let outcome = evaluate(&session.0, &query, &config, |ms| {
                gloo_timers::future::TimeoutFuture::new(ms)
            })
            .await;

            if outcome.strip_query {
                router.strip_query();
            }
            // 组件可能在裁决期间被卸载；try_set 丢弃迟到的更新
            set_allowed.try_set(outcome.allowed);
            set_checking.try_set(false);
            if !outcome.allowed {
                web_sys::console::log_1(&"[Guard] Access denied. Redirecting to login.".into());
                router.replace(AppRoute::auth_failure_redirect());
            }
        });
    });

    let children = StoredValue::new(children);
    view! {
        <Show
            when=move || !checking.get() && allowed.get()
            fallback=|| {
                view! {
                    <div class="flex items-center justify-center min-h-screen bg-base-200">
                        <span class="loading loading-spinner loading-lg text-primary"></span>
                    </div>
                }
            }
        >
            {children.with_value(|children| children())}
        </Show>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::provider::tests::MockProvider;
    use crate::session::vault::tests::MemoryStore;
    use invomail_shared::{LOGGED_IN_FLAG_KEY, SESSION_STORAGE_KEY};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn test_config() -> AppConfig {
        AppConfig {
            api_base: "http://localhost:8080".into(),
            auth_ready_timeout_ms: 5,
            token_retry_delay_ms: 3,
            request_timeout_ms: 100,
            settings_debounce_ms: 1,
        }
    }

    /// 立即返回的 sleep，同时记录每次请求的时长
    fn recording_sleep(log: Rc<RefCell<Vec<u32>>>) -> impl Fn(u32) -> futures::future::Ready<()> {
        move |ms| {
            log.borrow_mut().push(ms);
            futures::future::ready(())
        }
    }

    fn encode_session(json: &str) -> String {
        STANDARD.encode(json)
    }

    #[test]
    fn callback_requires_marker_and_success_flag() {
        assert!(parse_oauth_callback("?auth=google&ok=1").is_some());
        assert!(parse_oauth_callback("auth=google&ok=1").is_some());
        assert!(parse_oauth_callback("?auth=google&ok=0").is_none());
        assert!(parse_oauth_callback("?auth=google").is_none());
        assert!(parse_oauth_callback("?ok=1").is_none());
        assert!(parse_oauth_callback("").is_none());
    }

    #[test]
    fn callback_decodes_inline_session() {
        let token = encode_session(r#"{"access_token":"INLINE"}"#);
        let query = format!("?auth=google&ok=1&token={token}");
        let callback = parse_oauth_callback(&query).unwrap();
        assert_eq!(callback.provider, "google");
        assert_eq!(callback.inline_session.unwrap().access_token, "INLINE");
    }

    #[test]
    fn callback_with_garbage_token_still_counts_as_callback() {
        let callback = parse_oauth_callback("?auth=google&ok=1&token=%%%").unwrap();
        assert!(callback.inline_session.is_none());
    }

    #[tokio::test]
    async fn fail_closed_when_every_signal_is_absent() {
        let resolver = Rc::new(SessionResolver::new(
            MemoryStore::new(),
            MockProvider::with_no_session(),
        ));
        resolver.initialize().await;

        let sleeps = Rc::new(RefCell::new(Vec::new()));
        let outcome = evaluate(
            &resolver,
            "",
            &test_config(),
            recording_sleep(sleeps.clone()),
        )
        .await;

        assert!(!outcome.allowed);
        assert!(!outcome.strip_query);
        // 恰好一次重试延迟（就绪等待已在初始化后立即返回，不计时）
        assert_eq!(sleeps.borrow().as_slice(), &[3]);
    }

    #[tokio::test]
    async fn does_not_hang_when_provider_never_initializes() {
        let resolver = Rc::new(SessionResolver::new(
            MemoryStore::new(),
            MockProvider::unavailable(),
        ));
        // 故意不调用 initialize：有界等待必须超时后继续

        let sleeps = Rc::new(RefCell::new(Vec::new()));
        let outcome = evaluate(
            &resolver,
            "",
            &test_config(),
            recording_sleep(sleeps.clone()),
        )
        .await;

        assert!(!outcome.allowed);
        // 第一次 sleep 是就绪上限，第二次是重试延迟
        assert_eq!(sleeps.borrow().as_slice(), &[5, 3]);
    }

    #[tokio::test]
    async fn oauth_callback_without_inline_session_marks_logged_in() {
        let store = MemoryStore::new();
        let resolver = Rc::new(SessionResolver::new(
            store.clone(),
            MockProvider::with_no_session(),
        ));
        resolver.initialize().await;

        let outcome = evaluate(
            &resolver,
            "?auth=google&ok=1",
            &test_config(),
            |_| futures::future::ready(()),
        )
        .await;

        assert!(outcome.allowed);
        assert!(outcome.strip_query);
        assert!(store.contains(LOGGED_IN_FLAG_KEY));

        // 回调参数剥离后重新加载：持久化标记仍然放行
        let reload = evaluate(&resolver, "", &test_config(), |_| futures::future::ready(())).await;
        assert!(reload.allowed);
        assert!(!reload.strip_query);
    }

    #[tokio::test]
    async fn oauth_callback_with_inline_session_persists_it() {
        let store = MemoryStore::new();
        let resolver = Rc::new(SessionResolver::new(
            store.clone(),
            MockProvider::with_no_session(),
        ));
        resolver.initialize().await;

        let token = encode_session(r#"{"access_token":"OAUTH"}"#);
        let query = format!("?auth=google&ok=1&token={token}");
        let outcome =
            evaluate(&resolver, &query, &test_config(), |_| futures::future::ready(())).await;

        assert!(outcome.allowed);
        assert!(outcome.strip_query);
        assert!(store.contains(SESSION_STORAGE_KEY));
        assert_eq!(resolver.current_session().unwrap().access_token, "OAUTH");
    }

    #[tokio::test]
    async fn retry_window_catches_a_racing_storage_write() {
        let store = MemoryStore::new();
        let resolver = Rc::new(SessionResolver::new(
            store.clone(),
            MockProvider::with_no_session(),
        ));
        resolver.initialize().await;

        // sleep 期间另一条代码路径写入了会话记录
        let racing_store = store.clone();
        let outcome = evaluate(&resolver, "", &test_config(), move |_| {
            racing_store.seed(SESSION_STORAGE_KEY, r#"{"access_token":"LATE"}"#);
            futures::future::ready(())
        })
        .await;

        assert!(outcome.allowed);
    }

    #[tokio::test]
    async fn known_session_allows_without_touching_retry() {
        let resolver = Rc::new(SessionResolver::new(
            MemoryStore::new(),
            MockProvider::with_session(SessionPayload::new("T")),
        ));
        resolver.initialize().await;

        let sleeps = Rc::new(RefCell::new(Vec::new()));
        let outcome = evaluate(
            &resolver,
            "",
            &test_config(),
            recording_sleep(sleeps.clone()),
        )
        .await;

        assert!(outcome.allowed);
        assert!(sleeps.borrow().is_empty());
    }
}
