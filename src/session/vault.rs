//! 会话持久层
//!
//! 同一个逻辑会话存在三份持久化表示：
//! - 应用自身的会话记录（`session` 键，JSON blob）
//! - 认证提供方的默认记录（`sb-<ref>-auth-token` 键）
//! - 登录布尔标记（`isLoggedIn`，供同步快速检查）
//!
//! 三者允许短暂不一致（刷新后的初始化窗口），由回退链消解。
//! 存储/解析失败一律吞掉并按"未找到"处理，但会留下诊断日志。

use invomail_shared::auth::SessionPayload;
use invomail_shared::{
    LOGGED_IN_FLAG_KEY, PROVIDER_KEY_PREFIX, PROVIDER_KEY_SUFFIX, SESSION_STORAGE_KEY,
};
use serde::Deserialize;

/// 键值存储抽象：浏览器侧由 LocalStorage 实现，测试注入内存实现
pub trait KeyStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> bool;
    fn remove(&self, key: &str) -> bool;
    fn keys(&self) -> Vec<String>;
}

/// token 的来源（回退链的显式出处追踪）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// 认证提供方的实时会话
    Provider,
    /// 应用自身的持久化记录
    AppRecord,
    /// 提供方默认的持久化记录
    ProviderRecord,
}

/// 回退链的解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToken {
    pub token: String,
    pub source: TokenSource,
}

// =========================================================
// 存储形状归一化
// =========================================================

/// 持久化记录的已知形状：历史上存在三种嵌套层级，
/// 在边界处统一归一到 `SessionPayload`。
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredSession {
    Direct(SessionPayload),
    Nested {
        #[serde(rename = "currentSession")]
        current_session: SessionPayload,
    },
    Enveloped {
        data: EnvelopedData,
    },
}

#[derive(Debug, Deserialize)]
struct EnvelopedData {
    session: SessionPayload,
}

impl StoredSession {
    fn into_payload(self) -> SessionPayload {
        match self {
            StoredSession::Direct(payload) => payload,
            StoredSession::Nested { current_session } => current_session,
            StoredSession::Enveloped { data } => data.session,
        }
    }
}

/// 把任意已知形状的原始 JSON 归一为规范会话；解析失败返回 None
pub(crate) fn normalize_stored(raw: &str) -> Option<SessionPayload> {
    match serde_json::from_str::<StoredSession>(raw) {
        Ok(stored) => Some(stored.into_payload()),
        Err(err) => {
            log::warn!("session vault: unreadable stored session discarded: {err}");
            None
        }
    }
}

// =========================================================
// SessionVault
// =========================================================

/// 三份持久化表示之上的读写门面
pub struct SessionVault<S> {
    store: S,
}

impl<S: KeyStore> SessionVault<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 持久化一个具体会话：写应用记录并置登录标记
    pub fn persist(&self, session: &SessionPayload) {
        match serde_json::to_string(session) {
            Ok(json) => {
                if !self.store.set(SESSION_STORAGE_KEY, &json) {
                    log::warn!("session vault: persisting app record failed");
                }
                self.store.set(LOGGED_IN_FLAG_KEY, "true");
            }
            Err(err) => log::warn!("session vault: session not serializable: {err}"),
        }
    }

    /// 仅置登录标记（OAuth 回调未携带内联会话时的降级路径）
    pub fn mark_logged_in(&self) {
        self.store.set(LOGGED_IN_FLAG_KEY, "true");
    }

    /// 清除全部三份表示。只在显式登出时调用——启动期观察到
    /// "暂无会话"绝不能走到这里。
    pub fn clear(&self) {
        self.store.remove(SESSION_STORAGE_KEY);
        self.store.remove(LOGGED_IN_FLAG_KEY);
        if let Some(key) = self.provider_record_key() {
            self.store.remove(&key);
        }
    }

    /// 应用自身的持久化会话
    pub fn app_record(&self) -> Option<SessionPayload> {
        let raw = self.store.get(SESSION_STORAGE_KEY)?;
        normalize_stored(&raw)
    }

    /// 提供方默认记录（键模式匹配）
    pub fn provider_record(&self) -> Option<SessionPayload> {
        let key = self.provider_record_key()?;
        let raw = self.store.get(&key)?;
        normalize_stored(&raw)
    }

    fn provider_record_key(&self) -> Option<String> {
        self.store
            .keys()
            .into_iter()
            .find(|k| k.starts_with(PROVIDER_KEY_PREFIX) && k.ends_with(PROVIDER_KEY_SUFFIX))
    }

    /// 持久化表示中的 token（不触达提供方）：应用记录优先
    pub fn stored_token(&self) -> Option<ResolvedToken> {
        if let Some(session) = self.app_record() {
            if !session.access_token.is_empty() {
                return Some(ResolvedToken {
                    token: session.access_token,
                    source: TokenSource::AppRecord,
                });
            }
        }
        if let Some(session) = self.provider_record() {
            if !session.access_token.is_empty() {
                return Some(ResolvedToken {
                    token: session.access_token,
                    source: TokenSource::ProviderRecord,
                });
            }
        }
        None
    }

    /// 廉价的同步预检查：持久化存储里是否存在可用 token
    pub fn has_stored_token(&self) -> bool {
        self.stored_token().is_some()
    }

    /// 登录标记（同步快速检查）
    pub fn logged_in_flag(&self) -> bool {
        self.store
            .get(LOGGED_IN_FLAG_KEY)
            .map(|v| v == "true")
            .unwrap_or(false)
    }

    /// 任一持久化信号表明已登录
    pub fn any_persisted_signal(&self) -> bool {
        self.logged_in_flag() || self.app_record().is_some() || self.has_stored_token()
    }
}

// =========================================================
// 测试
// =========================================================

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    /// 内存键值存储（测试注入用）
    #[derive(Clone, Default)]
    pub struct MemoryStore {
        map: Rc<RefCell<BTreeMap<String, String>>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed(&self, key: &str, value: &str) {
            self.map.borrow_mut().insert(key.into(), value.into());
        }

        pub fn contains(&self, key: &str) -> bool {
            self.map.borrow().contains_key(key)
        }
    }

    impl KeyStore for MemoryStore {
        fn get(&self, key: &str) -> Option<String> {
            self.map.borrow().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) -> bool {
            self.map.borrow_mut().insert(key.into(), value.into());
            true
        }

        fn remove(&self, key: &str) -> bool {
            self.map.borrow_mut().remove(key).is_some()
        }

        fn keys(&self) -> Vec<String> {
            self.map.borrow().keys().cloned().collect()
        }
    }

    fn vault() -> (SessionVault<MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        (SessionVault::new(store.clone()), store)
    }

    #[test]
    fn persist_then_resolve_is_idempotent() {
        let (vault, _) = vault();
        let session = SessionPayload::new("T1");

        vault.persist(&session);
        vault.persist(&session);

        let resolved = vault.stored_token().unwrap();
        assert_eq!(resolved.token, "T1");
        assert_eq!(resolved.source, TokenSource::AppRecord);
        assert!(vault.logged_in_flag());
    }

    #[test]
    fn app_record_direct_shape() {
        let (vault, store) = vault();
        store.seed(SESSION_STORAGE_KEY, r#"{"access_token":"T"}"#);
        assert_eq!(vault.stored_token().unwrap().token, "T");
    }

    #[test]
    fn app_record_nested_shape() {
        let (vault, store) = vault();
        store.seed(
            SESSION_STORAGE_KEY,
            r#"{"currentSession":{"access_token":"N"}}"#,
        );
        assert_eq!(vault.app_record().unwrap().access_token, "N");
    }

    #[test]
    fn app_record_enveloped_shape() {
        let (vault, store) = vault();
        store.seed(
            SESSION_STORAGE_KEY,
            r#"{"data":{"session":{"access_token":"E","user":{"email":"a@b.c"}}}}"#,
        );
        let session = vault.app_record().unwrap();
        assert_eq!(session.access_token, "E");
        assert_eq!(session.email(), Some("a@b.c"));
    }

    #[test]
    fn provider_record_found_by_key_pattern() {
        let (vault, store) = vault();
        store.seed("sb-abcdef-auth-token", r#"{"access_token":"P"}"#);

        let resolved = vault.stored_token().unwrap();
        assert_eq!(resolved.token, "P");
        assert_eq!(resolved.source, TokenSource::ProviderRecord);
    }

    #[test]
    fn app_record_takes_priority_over_provider_record() {
        let (vault, store) = vault();
        store.seed(SESSION_STORAGE_KEY, r#"{"access_token":"APP"}"#);
        store.seed("sb-xyz-auth-token", r#"{"access_token":"SB"}"#);

        let resolved = vault.stored_token().unwrap();
        assert_eq!(resolved.token, "APP");
        assert_eq!(resolved.source, TokenSource::AppRecord);
    }

    #[test]
    fn corrupted_record_is_treated_as_absent() {
        let (vault, store) = vault();
        store.seed(SESSION_STORAGE_KEY, "{not json");
        store.seed("sb-ok-auth-token", r#"{"access_token":"GOOD"}"#);

        // 损坏的应用记录被跳过，链路继续走到提供方记录
        let resolved = vault.stored_token().unwrap();
        assert_eq!(resolved.source, TokenSource::ProviderRecord);
    }

    #[test]
    fn empty_token_is_not_a_match() {
        let (vault, store) = vault();
        store.seed(SESSION_STORAGE_KEY, r#"{"access_token":""}"#);
        assert!(vault.stored_token().is_none());
        assert!(!vault.has_stored_token());
    }

    #[test]
    fn clear_removes_all_three_representations() {
        let (vault, store) = vault();
        vault.persist(&SessionPayload::new("T"));
        store.seed("sb-ref-auth-token", r#"{"access_token":"T"}"#);

        vault.clear();

        assert!(!store.contains(SESSION_STORAGE_KEY));
        assert!(!store.contains(LOGGED_IN_FLAG_KEY));
        assert!(!store.contains("sb-ref-auth-token"));
        assert!(!vault.any_persisted_signal());
    }
}
