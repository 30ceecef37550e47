//! Process-wide in-memory session

use async_trait::async_trait;
use rbac_admin_api::TokenProvider;
use rbac_admin_core::{Session, UserProfile};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared holder of the current session
///
/// Starts empty. `set` swaps the whole session and `clear` empties it, so a
/// reader never sees a user from one login paired with tokens from another.
/// Clones share the same slot.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    pub async fn set(&self, session: Session) {
        *self.inner.write().await = Some(session);
    }

    /// Replace the user record of the current session, keeping its tokens
    pub async fn replace_user(&self, user: UserProfile) -> Option<Session> {
        let mut guard = self.inner.write().await;
        let session = guard.as_mut()?;
        session.user = user;
        Some(session.clone())
    }

    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_some()
    }
}

#[async_trait]
impl TokenProvider for SessionStore {
    async fn access_token(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(name: &str) -> Session {
        Session {
            user: UserProfile {
                user_id: "u-1".to_string(),
                name: name.to_string(),
                email: "a@x.com".to_string(),
                mobile_no: None,
                role_id: None,
                preferred_language: None,
                time_zone: None,
                is_super_admin: false,
                is_active: true,
            },
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
        }
    }

    #[tokio::test]
    async fn test_starts_empty_and_clears() {
        let store = SessionStore::new();
        assert!(!store.is_authenticated().await);
        assert_eq!(store.access_token().await, None);

        store.set(session("Ada")).await;
        assert_eq!(store.access_token().await.as_deref(), Some("access"));

        store.clear().await;
        assert!(store.get().await.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = SessionStore::new();
        let other = store.clone();
        store.set(session("Ada")).await;

        let updated = other.replace_user(session("Grace").user).await.unwrap();
        assert_eq!(updated.display_name(), "Grace");
        assert_eq!(updated.access_token, "access");
        assert_eq!(store.get().await.unwrap().display_name(), "Grace");
    }

    #[tokio::test]
    async fn test_replace_user_without_session_is_none() {
        let store = SessionStore::new();
        assert!(store.replace_user(session("Ada").user).await.is_none());
    }
}
