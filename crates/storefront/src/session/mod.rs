//! Authenticated identity and its persistence.
//!
//! [`SessionStore`] owns the token and user profile. Both are set and cleared
//! together, in memory and in [`SessionStorage`]. Every change is published on
//! a `tokio::sync::watch` channel and bumps the session epoch, which lets
//! consumers discard responses to requests made under an earlier identity.

mod storage;

pub use storage::{
    FileStorage, MemoryStorage, SessionStorage, StorageError, TOKEN_KEY, USER_KEY,
};

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::models::UserProfile;

/// Token and profile of the signed-in user.
#[derive(Debug)]
pub struct Identity {
    token: SecretString,
    user: UserProfile,
}

impl Identity {
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn user(&self) -> &UserProfile {
        &self.user
    }
}

impl Clone for Identity {
    fn clone(&self) -> Self {
        Self {
            token: SecretString::from(self.token.expose_secret().to_owned()),
            user: self.user.clone(),
        }
    }
}

/// Snapshot of the session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    identity: Option<Identity>,
    epoch: u64,
}

impl Session {
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        self.identity.as_ref().map(Identity::user)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(UserProfile::is_admin)
    }

    /// Counter bumped on every login and logout.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// A bearer token together with the session epoch it was issued under.
#[derive(Debug)]
pub struct Bearer {
    pub token: SecretString,
    pub epoch: u64,
}

// =============================================================================
// SessionStore
// =============================================================================

/// Owner of the authenticated identity.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    state: watch::Sender<Session>,
    storage: Box<dyn SessionStorage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Restore the persisted session.
    ///
    /// Both entries must be present, the token non-empty and the profile
    /// valid JSON. Anything else yields the empty session and purges both
    /// entries. Never fails.
    #[instrument(skip_all)]
    pub fn restore(storage: impl SessionStorage) -> Self {
        let identity = match read_identity(&storage) {
            Ok(Some(identity)) => {
                info!("Restored persisted session");
                Some(identity)
            }
            Ok(None) => {
                purge(&storage);
                None
            }
            Err(reason) => {
                warn!(%reason, "Discarding persisted session");
                purge(&storage);
                None
            }
        };

        let (state, _) = watch::channel(Session { identity, epoch: 0 });
        Self {
            inner: Arc::new(SessionStoreInner {
                state,
                storage: Box::new(storage),
            }),
        }
    }

    /// Establish a session, replacing any current one.
    ///
    /// If persisting fails both entries are removed and the session lives in
    /// memory only.
    #[instrument(skip_all, fields(user_id = ?user.id))]
    pub fn login(&self, token: impl Into<String>, user: UserProfile) {
        let token: String = token.into();
        if let Err(reason) = persist(self.inner.storage.as_ref(), &token, &user) {
            warn!(%reason, "Failed to persist session, keeping it in memory only");
            purge(self.inner.storage.as_ref());
        }

        self.inner.state.send_modify(|session| {
            session.identity = Some(Identity {
                token: SecretString::from(token),
                user,
            });
            session.epoch += 1;
        });
        info!("Session established");
    }

    /// Clear the session in memory and in storage.
    #[instrument(skip_all)]
    pub fn logout(&self) {
        purge(self.inner.storage.as_ref());
        let changed = self.inner.state.send_if_modified(|session| {
            if session.identity.take().is_some() {
                session.epoch += 1;
                true
            } else {
                false
            }
        });
        if changed {
            info!("Session cleared");
        }
    }

    /// Log out only if `epoch` is still the current session.
    ///
    /// Returns whether a logout happened.
    pub fn logout_if_current(&self, epoch: u64) -> bool {
        if self.is_current(epoch) && self.is_authenticated() {
            self.logout();
            true
        } else {
            false
        }
    }

    /// Receiver notified on every login and logout.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.inner.state.borrow().user().cloned()
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.inner.state.borrow().epoch
    }

    /// The token with the epoch it belongs to, if signed in.
    #[must_use]
    pub fn bearer(&self) -> Option<Bearer> {
        let session = self.inner.state.borrow();
        session.identity.as_ref().map(|identity| Bearer {
            token: SecretString::from(identity.token.expose_secret().to_owned()),
            epoch: session.epoch,
        })
    }

    /// Whether `epoch` still identifies the current session.
    #[must_use]
    pub fn is_current(&self, epoch: u64) -> bool {
        self.inner.state.borrow().epoch == epoch
    }
}

// =============================================================================
// Persistence helpers
// =============================================================================

fn read_identity(storage: &dyn SessionStorage) -> Result<Option<Identity>, String> {
    let token = storage.read(TOKEN_KEY).map_err(|e| e.to_string())?;
    let user = storage.read(USER_KEY).map_err(|e| e.to_string())?;

    match (token, user) {
        (None, None) => Ok(None),
        (Some(token), Some(user)) => {
            let token = token.trim();
            if token.is_empty() {
                return Err("empty token".to_string());
            }
            let user: UserProfile =
                serde_json::from_str(&user).map_err(|e| format!("malformed user profile: {e}"))?;
            Ok(Some(Identity {
                token: SecretString::from(token.to_owned()),
                user,
            }))
        }
        (Some(_), None) => Err("token without user profile".to_string()),
        (None, Some(_)) => Err("user profile without token".to_string()),
    }
}

fn persist(storage: &dyn SessionStorage, token: &str, user: &UserProfile) -> Result<(), String> {
    let user = serde_json::to_string(user).map_err(|e| e.to_string())?;
    storage.write(TOKEN_KEY, token).map_err(|e| e.to_string())?;
    storage.write(USER_KEY, &user).map_err(|e| e.to_string())
}

fn purge(storage: &dyn SessionStorage) {
    for key in [TOKEN_KEY, USER_KEY] {
        if let Err(e) = storage.remove(key) {
            warn!(key, error = %e, "Failed to remove persisted session entry");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(json: &str) -> UserProfile {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_restore_valid_session() {
        let storage = MemoryStorage::with_entries([
            (TOKEN_KEY, "tok-1"),
            (USER_KEY, r#"{"id":1,"email":"a@b.in","role":"user"}"#),
        ]);
        let store = SessionStore::restore(storage);
        let bearer = store.bearer().unwrap();
        assert_eq!(bearer.token.expose_secret(), "tok-1");
        assert_eq!(bearer.epoch, 0);
        assert_eq!(store.user().unwrap().email.as_deref(), Some("a@b.in"));
    }

    #[test]
    fn test_restore_corrupted_profile_purges_both_entries() {
        let storage = MemoryStorage::with_entries([(TOKEN_KEY, "tok"), (USER_KEY, "{not json")]);
        let store = SessionStore::restore(storage.clone());
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_restore_half_present_purges() {
        let storage = MemoryStorage::with_entries([(TOKEN_KEY, "tok")]);
        let store = SessionStore::restore(storage.clone());
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());

        let storage = MemoryStorage::with_entries([(TOKEN_KEY, "  "), (USER_KEY, "{}")]);
        assert!(!SessionStore::restore(storage.clone()).is_authenticated());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_login_and_logout_persist_together() {
        let storage = MemoryStorage::new();
        let store = SessionStore::restore(storage.clone());

        store.login("tok-2", user(r#"{"id":2,"name":"Ravi"}"#));
        assert_eq!(storage.read(TOKEN_KEY).unwrap().as_deref(), Some("tok-2"));
        assert!(storage.read(USER_KEY).unwrap().is_some());
        assert_eq!(store.epoch(), 1);

        let restored = SessionStore::restore(storage.clone());
        assert_eq!(restored.user().unwrap().display_name(), Some("Ravi"));

        store.logout();
        assert!(storage.is_empty());
        assert!(!store.is_authenticated());
        assert_eq!(store.epoch(), 2);

        store.logout();
        assert_eq!(store.epoch(), 2);
    }

    #[test]
    fn test_logout_if_current_ignores_stale_epoch() {
        let store = SessionStore::restore(MemoryStorage::new());
        store.login("a", UserProfile::default());
        let stale = store.epoch();
        store.login("b", UserProfile::default());
        assert!(!store.logout_if_current(stale));
        assert!(store.is_authenticated());
        assert!(store.logout_if_current(store.epoch()));
        assert!(!store.is_authenticated());
    }

    struct FailingUserWrites(MemoryStorage);

    impl SessionStorage for FailingUserWrites {
        fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.read(key)
        }

        fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == USER_KEY {
                return Err(StorageError::Unavailable("disk full".to_string()));
            }
            self.0.write(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    #[test]
    fn test_failed_persist_leaves_no_half_pair() {
        let backing = MemoryStorage::new();
        let store = SessionStore::restore(FailingUserWrites(backing.clone()));
        store.login("tok", UserProfile::default());
        assert!(store.is_authenticated());
        assert!(backing.is_empty());
    }

    #[test]
    fn test_file_backed_restore() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::restore(FileStorage::new(dir.path()));
        store.login("tok-f", user(r#"{"email":"f@b.in"}"#));

        let restored = SessionStore::restore(FileStorage::new(dir.path()));
        assert_eq!(
            restored.bearer().unwrap().token.expose_secret(),
            "tok-f"
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = SessionStore::restore(MemoryStorage::new());
        let mut rx = store.subscribe();
        store.login("tok", UserProfile::default());
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_authenticated());
        store.logout();
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_authenticated());
    }
}
