//! Session store.
//!
//! Holds the signed-in identity and mirrors it into storage as three keys:
//! the bearer token plus exactly one of the `seller` / `buyer` profile slots.
//! Which slot is populated is what decides the role on restore.
//!
//! The token is written last. A restore only accepts a token together with a
//! profile, so a write that fails part-way can never come back as a session
//! mixing two accounts.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;

use suturahub_core::Role;

use crate::binding::{Observable, Outbox, SubscriptionId, Subscribers};
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::models::session::{AuthenticatedSession, Session, UserProfile, UserRecord};
use crate::storage::{Storage, StorageError, keys};

/// Errors returned by [`SessionStore::login`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The token is empty or whitespace.
    #[error("authentication token cannot be empty")]
    EmptyToken,
}

/// Why persisted identity could not be restored.
#[derive(Debug, Error)]
enum RestoreError {
    #[error("stored {slot} profile is unreadable: {source}")]
    Parse {
        slot: &'static str,
        source: serde_json::Error,
    },

    #[error("stored identity is inconsistent: {0}")]
    Inconsistent(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Observable, persisted authentication session.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    session: Mutex<Session>,
    subscribers: Subscribers<Session>,
    outbox: Outbox<Session>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.lock())
            .field("subscribers", &self.subscribers)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Restore the session persisted in `storage`.
    ///
    /// Any inconsistency (a token with no profile, a profile with no token,
    /// both role slots filled, an unreadable profile) wipes every identity key
    /// and starts anonymous.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let session = match restore(storage.as_ref()) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding persisted session");
                wipe(storage.as_ref());
                Session::Anonymous
            }
        };

        if let Some(user) = session.user() {
            tracing::debug!(user_id = %user.id, role = %user.role, "Session restored");
            set_sentry_user(user.id.as_str(), Some(user.email.as_str()));
        }

        Self {
            storage,
            session: Mutex::new(session),
            subscribers: Subscribers::new(),
            outbox: Outbox::new(),
        }
    }

    /// Sign in, replacing any current session.
    ///
    /// Writes the token and the profile under the slot for `user.role`, and
    /// clears the other role's slot. If any write fails every identity key is
    /// removed, so the next start is anonymous; this session stays signed in.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyToken` for a blank token. The current
    /// session is left untouched in that case.
    #[instrument(skip(self, token, user), fields(user_id = %user.id, role = %user.role))]
    pub fn login(&self, token: SecretString, user: UserProfile) -> Result<(), SessionError> {
        if token.expose_secret().trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }

        let user_id = user.id.clone();
        let email = user.email.clone();

        {
            let mut session = self.lock();
            self.persist_login(&token, &user);
            *session = Session::Authenticated(AuthenticatedSession::new(token, user));
            self.outbox.push(session.clone());
        }

        set_sentry_user(user_id.as_str(), Some(email.as_str()));
        add_breadcrumb("auth", "Signed in", None);
        tracing::info!("User signed in");

        self.flush();
        Ok(())
    }

    /// Replace the signed-in user's profile without starting a new session.
    ///
    /// Only applies while the session still holds `token` for the same account
    /// and role as `profile`; otherwise nothing changes and `false` is
    /// returned. Only the profile slot is rewritten.
    #[instrument(skip(self, token, profile), fields(user_id = %profile.id))]
    pub fn update_profile(&self, token: &SecretString, profile: UserProfile) -> bool {
        {
            let mut session = self.lock();
            let Session::Authenticated(current) = &*session else {
                tracing::debug!("Profile update skipped, signed out meanwhile");
                return false;
            };
            let same_account = current.token().expose_secret() == token.expose_secret()
                && current.user().id == profile.id
                && current.user().role == profile.role;
            if !same_account {
                tracing::debug!("Profile update skipped, session changed meanwhile");
                return false;
            }

            let result = serde_json::to_string(&profile)
                .map_err(StorageError::from)
                .and_then(|text| self.storage.set(profile.role.as_str(), &text));
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to persist profile, keeping in-memory state");
            }

            let token = current.token().clone();
            *session = Session::Authenticated(AuthenticatedSession::new(token, profile));
            self.outbox.push(session.clone());
        }

        add_breadcrumb("auth", "Profile refreshed", None);
        tracing::debug!("Profile updated");
        self.flush();
        true
    }

    /// Sign out and remove every identity key.
    ///
    /// Returns `false` (and changes nothing) when already anonymous.
    #[instrument(skip(self))]
    pub fn logout(&self) -> bool {
        {
            let mut session = self.lock();
            if matches!(*session, Session::Anonymous) {
                return false;
            }
            wipe(self.storage.as_ref());
            *session = Session::Anonymous;
            self.outbox.push(session.clone());
        }

        clear_sentry_user();
        add_breadcrumb("auth", "Signed out", None);
        tracing::info!("User signed out");

        self.flush();
        true
    }

    /// Signed in with a non-empty token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.lock().is_seller()
    }

    #[must_use]
    pub fn is_buyer(&self) -> bool {
        self.lock().is_buyer()
    }

    /// The signed-in user's profile, if any.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.lock().user().cloned()
    }

    /// The bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.lock().token().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self) {
        self.outbox.drain(|snapshot| self.subscribers.notify(&snapshot));
    }

    /// Write the identity keys for `user`, token last.
    ///
    /// On failure every identity key is removed.
    fn persist_login(&self, token: &SecretString, user: &UserProfile) {
        let slot = user.role.as_str();
        let other = user.role.other().as_str();

        let result = serde_json::to_string(user)
            .map_err(StorageError::from)
            .and_then(|profile| {
                self.storage.remove(keys::TOKEN)?;
                self.storage.remove(other)?;
                self.storage.set(slot, &profile)?;
                self.storage.set(keys::TOKEN, token.expose_secret())
            });

        if let Err(e) = result {
            tracing::error!(
                error = %e,
                "Failed to persist session, clearing stored identity and keeping in-memory state"
            );
            wipe(self.storage.as_ref());
        }
    }
}

impl Observable for SessionStore {
    type State = Session;

    fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        let id = self.subscribers.add(callback);
        let current = self.snapshot();
        self.subscribers.notify_one(id, &current);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }
}

fn restore(storage: &dyn Storage) -> Result<Session, RestoreError> {
    let token = storage.get(keys::TOKEN)?;
    let seller = storage.get(keys::SELLER)?;
    let buyer = storage.get(keys::BUYER)?;

    let (token, role, profile) = match (token, seller, buyer) {
        (None, None, None) => return Ok(Session::Anonymous),
        (Some(token), Some(profile), None) => (token, Role::Seller, profile),
        (Some(token), None, Some(profile)) => (token, Role::Buyer, profile),
        (_, Some(_), Some(_)) => {
            return Err(RestoreError::Inconsistent("both seller and buyer slots are set"));
        }
        (Some(_), None, None) => {
            return Err(RestoreError::Inconsistent("token without a user profile"));
        }
        (None, _, _) => return Err(RestoreError::Inconsistent("user profile without a token")),
    };

    if token.trim().is_empty() {
        return Err(RestoreError::Inconsistent("empty token"));
    }

    let user = parse_profile(&profile, role)?;
    Ok(Session::Authenticated(AuthenticatedSession::new(
        SecretString::from(token),
        user,
    )))
}

/// Parse a stored profile. The slot decides the role, whatever `userType` says.
fn parse_profile(text: &str, role: Role) -> Result<UserProfile, RestoreError> {
    let parse_error = |source| RestoreError::Parse {
        slot: role.as_str(),
        source,
    };

    let record: UserRecord = serde_json::from_str(text).map_err(parse_error)?;
    Ok(record.with_role(role))
}

fn wipe(storage: &dyn Storage) {
    for key in keys::IDENTITY {
        if let Err(e) = storage.remove(key) {
            tracing::error!(key, error = %e, "Failed to remove identity key");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    /// Memory storage whose writes to one key can be made to fail.
    #[derive(Default)]
    struct FailingStorage {
        inner: MemoryStorage,
        broken: Mutex<Option<&'static str>>,
    }

    impl FailingStorage {
        fn break_key(&self, key: &'static str) {
            *self.broken.lock().unwrap() = Some(key);
        }

        fn check(&self, key: &str) -> Result<(), StorageError> {
            if *self.broken.lock().unwrap() == Some(key) {
                return Err(std::io::Error::other("disk full").into());
            }
            Ok(())
        }
    }

    impl Storage for FailingStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.check(key)?;
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    fn profile(role: Role) -> UserProfile {
        serde_json::from_value::<UserRecord>(serde_json::json!({
            "id": "u-1",
            "name": "Ama",
            "email": "ama@example.com",
            "phone": "0240000000",
        }))
        .unwrap()
        .with_role(role)
    }

    fn store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone());
        (storage, store)
    }

    #[test]
    fn test_login_writes_token_and_role_slot() {
        let (storage, store) = store();
        storage.set(keys::BUYER, "{}").unwrap();

        store
            .login(SecretString::from("tok-1"), profile(Role::Seller))
            .unwrap();

        assert_eq!(storage.get(keys::TOKEN).unwrap().as_deref(), Some("tok-1"));
        assert!(storage.get(keys::SELLER).unwrap().is_some());
        assert_eq!(storage.get(keys::BUYER).unwrap(), None);
        assert!(store.is_seller());
        assert!(!store.is_buyer());
    }

    #[test]
    fn test_login_rejects_blank_token() {
        let (storage, store) = store();
        assert!(matches!(
            store.login(SecretString::from("  "), profile(Role::Buyer)),
            Err(SessionError::EmptyToken)
        ));
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_restore_round_trip() {
        let (storage, store) = store();
        store
            .login(SecretString::from("tok-2"), profile(Role::Buyer))
            .unwrap();

        let restored = SessionStore::load(storage);
        assert!(restored.is_buyer());
        let user = restored.user().unwrap();
        assert_eq!(user.email.as_str(), "ama@example.com");
        assert_eq!(user.extra["phone"], "0240000000");
        assert_eq!(restored.token().unwrap().expose_secret(), "tok-2");
    }

    #[test]
    fn test_slot_decides_role() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::TOKEN, "tok").unwrap();
        storage
            .set(
                keys::SELLER,
                r#"{"id":"u-1","email":"a@b.co","userType":"buyer"}"#,
            )
            .unwrap();

        let store = SessionStore::load(storage);
        assert!(store.is_seller());
    }

    #[test]
    fn test_inconsistent_state_is_wiped() {
        let cases: [&[(&str, &str)]; 5] = [
            &[(keys::TOKEN, "tok")],
            &[(keys::BUYER, r#"{"id":"1","email":"a@b.co"}"#)],
            &[
                (keys::TOKEN, "tok"),
                (keys::SELLER, r#"{"id":"1","email":"a@b.co"}"#),
                (keys::BUYER, r#"{"id":"1","email":"a@b.co"}"#),
            ],
            &[(keys::TOKEN, "tok"), (keys::BUYER, "not json")],
            &[(keys::TOKEN, ""), (keys::BUYER, r#"{"id":"1","email":"a@b.co"}"#)],
        ];

        for entries in cases {
            let storage = Arc::new(MemoryStorage::new());
            for (key, value) in entries {
                storage.set(key, value).unwrap();
            }
            storage.set(keys::CART, "[]").unwrap();

            let store = SessionStore::load(storage.clone());
            assert!(!store.is_authenticated(), "{entries:?}");
            for key in keys::IDENTITY {
                assert_eq!(storage.get(key).unwrap(), None, "{entries:?}");
            }
            assert!(storage.get(keys::CART).unwrap().is_some());
        }
    }

    #[test]
    fn test_logout_clears_everything_and_is_idempotent() {
        let (storage, store) = store();
        store
            .login(SecretString::from("tok"), profile(Role::Seller))
            .unwrap();

        assert!(store.logout());
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        assert!(storage.is_empty());

        assert!(!store.logout());
    }

    #[test]
    fn test_subscribers_see_login_and_logout() {
        let (_, store) = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |s: &Session| sink.lock().unwrap().push(s.is_authenticated()));

        store
            .login(SecretString::from("tok"), profile(Role::Buyer))
            .unwrap();
        store.logout();
        store.logout();

        assert_eq!(*seen.lock().unwrap(), vec![false, true, false]);
    }

    #[test]
    fn test_failed_role_switch_does_not_restore_mixed_identity() {
        let storage = Arc::new(FailingStorage::default());
        let store = SessionStore::load(storage.clone());
        store
            .login(SecretString::from("buyer-tok"), profile(Role::Buyer))
            .unwrap();

        storage.break_key(keys::SELLER);
        let mut seller = profile(Role::Seller);
        seller.id = suturahub_core::UserId::parse("s-9").unwrap();
        store.login(SecretString::from("seller-tok"), seller).unwrap();

        // The live session is the new one.
        assert!(store.is_seller());
        assert_eq!(store.token().unwrap().expose_secret(), "seller-tok");

        for key in keys::IDENTITY {
            assert_eq!(storage.get(key).unwrap(), None, "{key} should be cleared");
        }
        let reloaded = SessionStore::load(storage);
        assert!(!reloaded.is_authenticated());
    }

    #[test]
    fn test_failed_token_write_does_not_restore_previous_account() {
        let storage = Arc::new(FailingStorage::default());
        let store = SessionStore::load(storage.clone());
        store
            .login(SecretString::from("old-tok"), profile(Role::Seller))
            .unwrap();

        storage.break_key(keys::TOKEN);
        let mut other = profile(Role::Seller);
        other.id = suturahub_core::UserId::parse("u-2").unwrap();
        store.login(SecretString::from("new-tok"), other).unwrap();

        let reloaded = SessionStore::load(storage);
        assert!(!reloaded.is_authenticated());
    }

    #[test]
    fn test_update_profile_keeps_token_and_rewrites_slot() {
        let (storage, store) = store();
        let token = SecretString::from("tok");
        store.login(token.clone(), profile(Role::Buyer)).unwrap();

        let mut refreshed = profile(Role::Buyer);
        refreshed.name = "Ama Mensah".to_owned();
        assert!(store.update_profile(&token, refreshed));

        assert_eq!(store.user().unwrap().name, "Ama Mensah");
        assert_eq!(store.token().unwrap().expose_secret(), "tok");
        let stored: serde_json::Value =
            serde_json::from_str(&storage.get(keys::BUYER).unwrap().unwrap()).unwrap();
        assert_eq!(stored["name"], "Ama Mensah");
    }

    #[test]
    fn test_update_profile_ignores_changed_session() {
        let (storage, store) = store();
        let old = SecretString::from("old-tok");
        store.login(old.clone(), profile(Role::Buyer)).unwrap();

        store
            .login(SecretString::from("new-tok"), profile(Role::Buyer))
            .unwrap();
        assert!(!store.update_profile(&old, profile(Role::Buyer)));
        assert_eq!(store.token().unwrap().expose_secret(), "new-tok");

        let current = store.token().unwrap();
        assert!(!store.update_profile(&current, profile(Role::Seller)));

        store.logout();
        assert!(!store.update_profile(&current, profile(Role::Buyer)));
        assert!(storage.is_empty());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_logout_from_subscriber_is_seen_last() {
        let store = Arc::new(SessionStore::load(Arc::new(MemoryStorage::new())));

        let inner = Arc::clone(&store);
        store.subscribe(move |s: &Session| {
            if s.is_authenticated() {
                inner.logout();
            }
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |s: &Session| sink.lock().unwrap().push(s.is_authenticated()));

        store
            .login(SecretString::from("tok"), profile(Role::Buyer))
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![false, true, false]);
        assert!(!store.is_authenticated());
    }
}
