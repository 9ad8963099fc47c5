//! 会话解析器
//!
//! 在提供方异步初始化的前提下，对"有没有会话、token 是什么"给出
//! 同步感、最终一致的回答。核心规则（整个代码库最重要的正确性规则）：
//! 会话只在显式登出信号下转为不存在，启动期的瞬态"暂无会话"绝不等于
//! 登出——否则用户一刷新就被踢出。
//!
//! 解析器是显式注入的对象（存储与提供方都走 trait），测试可完全替换。
//! 状态放在 `Arc<Mutex>` 里以满足响应式层对 Context 值的 Send 约束；
//! 运行时是单线程事件循环，锁上没有竞争。

pub mod provider;
pub mod vault;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::channel::oneshot;
use invomail_shared::auth::SessionPayload;

pub use provider::{AuthProvider, BrowserProvider, ProviderAnswer, ProviderEvent};
pub use vault::{KeyStore, ResolvedToken, SessionVault, TokenSource};

/// 会话侧的广播事件
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// `initialize` 完成（恰好一次）
    Ready,
    /// 会话变化（登录、登出、token 刷新），携带最新快照
    Changed(Option<SessionPayload>),
}

/// API 客户端需要的最小会话能力（类型擦除用）
#[async_trait(?Send)]
pub trait SessionGate {
    async fn wait_until_ready(&self);
    async fn resolve_access_token(&self) -> Option<ResolvedToken>;
}

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

struct ResolverState {
    current: Option<SessionPayload>,
    ready: bool,
    ready_waiters: Vec<oneshot::Sender<()>>,
    listeners: Vec<Listener>,
}

/// 会话解析器：缓存 + 持久层 + 提供方的协调者
pub struct SessionResolver<S, P> {
    vault: Arc<SessionVault<S>>,
    provider: P,
    state: Arc<Mutex<ResolverState>>,
}

impl<S: KeyStore + 'static, P: AuthProvider + 'static> SessionResolver<S, P> {
    pub fn new(store: S, provider: P) -> Self {
        Self {
            vault: Arc::new(SessionVault::new(store)),
            provider,
            state: Arc::new(Mutex::new(ResolverState {
                current: None,
                ready: false,
                ready_waiters: Vec::new(),
                listeners: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().expect("session state poisoned")
    }

    /// 进程启动时恰好运行一次。三种结局：
    /// (a) 提供方给出具体会话 → 缓存并持久化；
    /// (b) 提供方答"无会话" → **不清已持久化的记录**，以其为回退事实源；
    /// (c) 提供方不可用 → 按无会话处理。
    /// 无论哪种，`Ready` 恰好广播一次。
    pub async fn initialize(&self) {
        match self.provider.current_session().await {
            ProviderAnswer::Session(session) => {
                self.vault.persist(&session);
                self.set_current(Some(session));
            }
            ProviderAnswer::NoSession => {
                // 刷新竞态：提供方还没恢复完会话。回退到持久化记录。
                let fallback = self.vault.app_record().or_else(|| self.vault.provider_record());
                self.set_current(fallback);
            }
            ProviderAnswer::Unavailable => {
                self.set_current(None);
            }
        }
        self.mark_ready();
    }

    /// 订阅提供方的状态推送并同步到缓存/持久层。
    /// 只有显式 `SignedOut` 会清存储；带 None 的初始事件不会。
    pub fn attach_provider_events(self: Arc<Self>) {
        let resolver = Arc::downgrade(&self);
        self.provider.subscribe(Box::new(move |event| {
            let Some(resolver) = resolver.upgrade() else {
                return;
            };
            match event {
                ProviderEvent::SignedIn(session)
                | ProviderEvent::TokenRefreshed(session)
                | ProviderEvent::InitialSession(Some(session)) => {
                    resolver.vault.persist(&session);
                    resolver.set_current(Some(session));
                }
                ProviderEvent::InitialSession(None) => {
                    // 保留缓存与存储；这只是"还没有"而非"已登出"
                }
                ProviderEvent::SignedOut => {
                    resolver.vault.clear();
                    resolver.set_current(None);
                }
            }
            resolver.mark_ready();
        }));
    }

    /// 等待初始化完成；已就绪则立即返回
    pub fn wait_until_ready(&self) -> impl Future<Output = ()> + use<S, P> {
        let receiver = {
            let mut state = self.state();
            if state.ready {
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.ready_waiters.push(tx);
                Some(rx)
            }
        };
        async move {
            if let Some(rx) = receiver {
                let _ = rx.await;
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state().ready
    }

    /// 按优先级解析可用 token：提供方实时会话 → 应用记录 → 提供方记录。
    /// 幂等、无副作用、绝不失败——"没有"是正常结果。
    pub async fn resolve_access_token(&self) -> Option<ResolvedToken> {
        if let ProviderAnswer::Session(session) = self.provider.current_session().await {
            if !session.access_token.is_empty() {
                return Some(ResolvedToken {
                    token: session.access_token,
                    source: TokenSource::Provider,
                });
            }
        }
        self.vault.stored_token()
    }

    /// 同步预检查：持久层里是否有 token（不触达提供方）
    pub fn has_stored_token(&self) -> bool {
        self.vault.has_stored_token()
    }

    /// 任一持久化登录信号（布尔标记 / 应用记录 / 提供方记录）
    pub fn any_persisted_signal(&self) -> bool {
        self.vault.any_persisted_signal()
    }

    /// 当前缓存的会话快照
    pub fn current_session(&self) -> Option<SessionPayload> {
        self.state().current.clone()
    }

    /// 采纳一个来自登录响应或 OAuth 内联负载的会话
    pub fn adopt_session(&self, session: SessionPayload) {
        self.vault.persist(&session);
        self.set_current(Some(session));
    }

    /// OAuth 回调未携带内联会话时的降级：只置登录标记
    pub fn mark_logged_in(&self) {
        self.vault.mark_logged_in();
        let snapshot = self.current_session();
        self.emit(&SessionEvent::Changed(snapshot));
    }

    /// 发起提供方 OAuth 流程（重定向离开当前页面）
    pub async fn begin_oauth(&self, provider: &str, redirect_to: &str) -> Result<(), String> {
        self.provider.begin_oauth(provider, redirect_to).await
    }

    /// 显式登出：提供方（尽力）+ 清全部持久化表示 + 广播
    pub async fn sign_out(&self) {
        self.provider.sign_out().await;
        self.vault.clear();
        self.set_current(None);
    }

    /// 注册变化监听（UI 侧借此免轮询地重渲染）
    pub fn subscribe(&self, listener: impl Fn(&SessionEvent) + Send + Sync + 'static) {
        self.state().listeners.push(Arc::new(listener));
    }

    fn set_current(&self, session: Option<SessionPayload>) {
        {
            let mut state = self.state();
            if state.current == session {
                return;
            }
            state.current = session.clone();
        }
        self.emit(&SessionEvent::Changed(session));
    }

    fn mark_ready(&self) {
        let waiters = {
            let mut state = self.state();
            if state.ready {
                return;
            }
            state.ready = true;
            std::mem::take(&mut state.ready_waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(());
        }
        self.emit(&SessionEvent::Ready);
    }

    fn emit(&self, event: &SessionEvent) {
        // 先拷出监听器再调用：监听器可能回调解析器，不能带锁调用
        let listeners: Vec<Listener> = self.state().listeners.clone();
        for listener in listeners {
            listener(event);
        }
    }
}

#[async_trait(?Send)]
impl<S: KeyStore + 'static, P: AuthProvider + 'static> SessionGate for SessionResolver<S, P> {
    async fn wait_until_ready(&self) {
        SessionResolver::wait_until_ready(self).await;
    }

    async fn resolve_access_token(&self) -> Option<ResolvedToken> {
        SessionResolver::resolve_access_token(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::provider::tests::MockProvider;
    use super::vault::tests::MemoryStore;
    use super::*;
    use invomail_shared::{LOGGED_IN_FLAG_KEY, SESSION_STORAGE_KEY};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn resolver(
        store: MemoryStore,
        provider: MockProvider,
    ) -> Arc<SessionResolver<MemoryStore, MockProvider>> {
        Arc::new(SessionResolver::new(store, provider))
    }

    #[tokio::test]
    async fn initialize_with_concrete_session_persists_everywhere() {
        let store = MemoryStore::new();
        let resolver = resolver(store.clone(), MockProvider::with_session(SessionPayload::new("T")));

        resolver.initialize().await;

        assert!(resolver.is_ready());
        assert_eq!(resolver.current_session().unwrap().access_token, "T");
        assert!(store.contains(SESSION_STORAGE_KEY));
        assert!(store.contains(LOGGED_IN_FLAG_KEY));
    }

    #[tokio::test]
    async fn initialize_with_no_session_does_not_delete_persisted_record() {
        let store = MemoryStore::new();
        store.seed(SESSION_STORAGE_KEY, r#"{"access_token":"KEEP"}"#);
        let resolver = resolver(store.clone(), MockProvider::with_no_session());

        resolver.initialize().await;

        // 持久化记录必须原样保留，并成为回退事实源
        assert!(store.contains(SESSION_STORAGE_KEY));
        assert_eq!(resolver.current_session().unwrap().access_token, "KEEP");
        let token = resolver.resolve_access_token().await.unwrap();
        assert_eq!(token.token, "KEEP");
        assert_eq!(token.source, TokenSource::AppRecord);
    }

    #[tokio::test]
    async fn initialize_with_unavailable_provider_is_ready_without_session() {
        let resolver = resolver(MemoryStore::new(), MockProvider::unavailable());

        resolver.initialize().await;

        assert!(resolver.is_ready());
        assert!(resolver.current_session().is_none());
        assert!(resolver.resolve_access_token().await.is_none());
    }

    #[tokio::test]
    async fn ready_fires_exactly_once() {
        let resolver = resolver(MemoryStore::new(), MockProvider::with_no_session());
        let fired = Arc::new(AtomicU32::new(0));
        let counter = fired.clone();
        resolver.subscribe(move |event| {
            if matches!(event, SessionEvent::Ready) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let waiter = resolver.wait_until_ready();
        resolver.initialize().await;
        resolver.initialize().await;
        waiter.await;
        // 已就绪后等待立即返回
        resolver.wait_until_ready().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_live_session_wins_the_fallback_chain() {
        let store = MemoryStore::new();
        store.seed(SESSION_STORAGE_KEY, r#"{"access_token":"STORED"}"#);
        let resolver = resolver(store, MockProvider::with_session(SessionPayload::new("LIVE")));

        let token = resolver.resolve_access_token().await.unwrap();
        assert_eq!(token.token, "LIVE");
        assert_eq!(token.source, TokenSource::Provider);
    }

    #[tokio::test]
    async fn sign_out_clears_all_representations_and_broadcasts() {
        let store = MemoryStore::new();
        store.seed("sb-ref-auth-token", r#"{"access_token":"T"}"#);
        let provider = MockProvider::with_session(SessionPayload::new("T"));
        let resolver = resolver(store.clone(), provider.clone());
        resolver.initialize().await;

        let changes = Arc::new(Mutex::new(Vec::new()));
        let log = changes.clone();
        resolver.subscribe(move |event| {
            if let SessionEvent::Changed(s) = event {
                log.lock().unwrap().push(s.is_some());
            }
        });

        provider.set_answer(ProviderAnswer::NoSession);
        resolver.sign_out().await;

        assert_eq!(provider.sign_out_count(), 1);
        assert!(!store.contains(SESSION_STORAGE_KEY));
        assert!(!store.contains(LOGGED_IN_FLAG_KEY));
        assert!(!store.contains("sb-ref-auth-token"));
        assert!(resolver.current_session().is_none());
        assert_eq!(changes.lock().unwrap().as_slice(), &[false]);
        assert!(resolver.resolve_access_token().await.is_none());
    }

    #[tokio::test]
    async fn provider_signed_out_event_clears_storage() {
        let store = MemoryStore::new();
        let provider = MockProvider::with_session(SessionPayload::new("T"));
        let resolver = resolver(store.clone(), provider.clone());
        resolver.clone().attach_provider_events();
        resolver.initialize().await;
        assert!(store.contains(SESSION_STORAGE_KEY));

        provider.emit(ProviderEvent::SignedOut);

        assert!(resolver.current_session().is_none());
        assert!(!store.contains(SESSION_STORAGE_KEY));
    }

    #[tokio::test]
    async fn initial_event_with_none_does_not_wipe_fallback() {
        let store = MemoryStore::new();
        store.seed(SESSION_STORAGE_KEY, r#"{"access_token":"KEEP"}"#);
        let provider = MockProvider::with_no_session();
        let resolver = resolver(store.clone(), provider.clone());
        resolver.clone().attach_provider_events();
        resolver.initialize().await;

        provider.emit(ProviderEvent::InitialSession(None));

        assert!(store.contains(SESSION_STORAGE_KEY));
        assert_eq!(resolver.current_session().unwrap().access_token, "KEEP");
    }

    #[tokio::test]
    async fn token_refresh_event_updates_cache_and_storage() {
        let store = MemoryStore::new();
        let provider = MockProvider::with_no_session();
        let resolver = resolver(store.clone(), provider.clone());
        resolver.clone().attach_provider_events();
        resolver.initialize().await;

        provider.emit(ProviderEvent::TokenRefreshed(SessionPayload::new("FRESH")));

        assert_eq!(resolver.current_session().unwrap().access_token, "FRESH");
        assert_eq!(resolver.resolve_access_token().await.unwrap().token, "FRESH");
    }

    #[tokio::test]
    async fn adopt_session_persists_and_notifies() {
        let store = MemoryStore::new();
        let resolver = resolver(store.clone(), MockProvider::with_no_session());
        resolver.initialize().await;

        resolver.adopt_session(SessionPayload::new("LOGIN"));

        assert!(store.contains(SESSION_STORAGE_KEY));
        assert!(resolver.has_stored_token());
        assert_eq!(resolver.current_session().unwrap().access_token, "LOGIN");
    }
}
