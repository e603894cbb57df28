//! Session store: who is signed in, and the transitions between sessions.
//!
//! The store owns the identity registry and the "current identity"
//! observable, and mirrors the session into the key-value store under
//! `auth_token` / `current_user` so a fresh store can pick it back up.
//!
//! `login` and `register` complete after a simulated latency through the
//! injected scheduler; `logout` is synchronous.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use bistro_core::storage::keys;
use bistro_core::{DomainError, DomainResult, KeyValueStore};
use bistro_events::{InFlight, Observable, Pending, StoreContext, schedule};

use crate::{Credentials, Identity, IdentityRegistry, Registration, Role};

/// Default simulated latency of `login` / `register`.
pub const DEFAULT_AUTH_LATENCY: Duration = Duration::from_millis(1500);

/// Opaque session token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(format!("session_{}", Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Result of a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub identity: Identity,
    pub token: SessionToken,
}

struct SessionInner {
    ctx: StoreContext,
    kv: Arc<dyn KeyValueStore>,
    latency: Duration,
    registry: Mutex<IdentityRegistry>,
    identity: Observable<Option<Identity>>,
    in_flight: InFlight,
}

/// Holds the authenticated identity. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("identity", &self.inner.identity)
            .field("in_flight", &self.inner.in_flight.outstanding())
            .finish()
    }
}

impl SessionStore {
    /// Build the store and restore any session left in `kv`.
    ///
    /// A session is restored only when both the token and the identity
    /// payload are present. An unreadable identity payload ends the session
    /// (see [`SessionStore::logout`]) instead of surfacing an error.
    pub fn new(
        ctx: StoreContext,
        kv: Arc<dyn KeyValueStore>,
        registry: IdentityRegistry,
        latency: Duration,
    ) -> Self {
        let store = Self {
            inner: Arc::new(SessionInner {
                ctx,
                kv,
                latency,
                registry: Mutex::new(registry),
                identity: Observable::new(None),
                in_flight: InFlight::new(),
            }),
        };
        store.restore();
        store
    }

    fn restore(&self) {
        let kv = &self.inner.kv;
        let (Some(_token), Some(payload)) = (kv.get(keys::AUTH_TOKEN), kv.get(keys::CURRENT_USER))
        else {
            return;
        };

        match serde_json::from_str::<Identity>(&payload) {
            Ok(identity) => {
                info!(user_id = %identity.id, role = %identity.role, "session restored");
                self.inner.identity.set(Some(identity));
            }
            Err(err) => {
                warn!(error = %err, "stored identity unreadable; clearing session");
                self.logout();
            }
        }
    }

    /// Authenticate against the registry.
    ///
    /// Fails with `NotFound` for an unknown email and `InvalidCredentials`
    /// for a wrong password; either way nothing is persisted or emitted.
    pub fn login(&self, credentials: Credentials) -> Pending<AuthSession> {
        let guard = self.inner.in_flight.begin();
        let inner = Arc::clone(&self.inner);
        debug!(email = %credentials.email, "login requested");

        schedule(&*self.inner.ctx.scheduler, self.inner.latency, move || {
            let _guard = guard;
            let identity = inner.registry().authenticate(&credentials).inspect_err(|err| {
                info!(email = %credentials.email, error = %err, "login rejected");
            })?;
            inner.establish(identity)
        })
    }

    /// Create a new identity and sign it in.
    ///
    /// Fails with `AlreadyExists` if the email is registered. The role is
    /// taken as given.
    pub fn register(&self, registration: Registration) -> Pending<AuthSession> {
        let guard = self.inner.in_flight.begin();
        let inner = Arc::clone(&self.inner);
        debug!(email = %registration.email, role = %registration.role, "registration requested");

        schedule(&*self.inner.ctx.scheduler, self.inner.latency, move || {
            let _guard = guard;
            let now = inner.ctx.clock.now();
            let mut registry = inner.registry();
            let identity = registry.prepare(&registration, now).inspect_err(|err| {
                info!(email = %registration.email, error = %err, "registration rejected");
            })?;
            let payload = encode(&identity)?;
            registry.insert(identity.clone());
            drop(registry);

            info!(user_id = %identity.id, role = %identity.role, "identity registered");
            Ok(inner.persist(identity, payload))
        })
    }

    /// Clear the persisted session and emit `None`. Safe to call repeatedly.
    pub fn logout(&self) {
        self.inner.kv.remove(keys::AUTH_TOKEN);
        self.inner.kv.remove(keys::CURRENT_USER);
        self.inner.identity.set(None);
        info!("signed out");
    }

    /// True iff a session token is persisted.
    ///
    /// Reads the persisted token only; the identity observable is not consulted.
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .kv
            .get(keys::AUTH_TOKEN)
            .is_some_and(|token| !token.is_empty())
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.inner.identity.snapshot()
    }

    pub fn identity_stream(&self) -> &Observable<Option<Identity>> {
        &self.inner.identity
    }

    pub fn loading_stream(&self) -> &Observable<bool> {
        self.inner.in_flight.stream()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.in_flight.is_busy()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.inner
            .identity
            .read(|current| current.as_ref().is_some_and(|i| i.role == role))
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.inner
            .identity
            .read(|current| current.as_ref().is_some_and(|i| roles.contains(&i.role)))
    }
}

impl SessionInner {
    fn registry(&self) -> std::sync::MutexGuard<'_, IdentityRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn establish(&self, identity: Identity) -> DomainResult<AuthSession> {
        let payload = encode(&identity)?;
        info!(user_id = %identity.id, role = %identity.role, "login succeeded");
        Ok(self.persist(identity, payload))
    }

    fn persist(&self, identity: Identity, payload: String) -> AuthSession {
        let token = SessionToken::generate();
        self.kv.set(keys::AUTH_TOKEN, token.as_str().to_string());
        self.kv.set(keys::CURRENT_USER, payload);
        self.identity.set(Some(identity.clone()));
        AuthSession { identity, token }
    }
}

fn encode(identity: &Identity) -> DomainResult<String> {
    serde_json::to_string(identity)
        .map_err(|e| DomainError::validation(format!("identity not serializable: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_core::InMemoryKeyValueStore;
    use bistro_events::ManualScheduler;
    use chrono::Utc;

    use crate::DEMO_PASSWORD;

    fn store_with(kv: Arc<InMemoryKeyValueStore>) -> SessionStore {
        SessionStore::new(
            StoreContext::immediate(),
            kv,
            IdentityRegistry::demo(Utc::now()),
            DEFAULT_AUTH_LATENCY,
        )
    }

    fn registration(email: &str, role: Role) -> Registration {
        Registration {
            first_name: "Lena".to_string(),
            last_name: "Park".to_string(),
            email: email.to_string(),
            phone: "+1555010101".to_string(),
            password: "secret99".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn admin_login_persists_and_emits() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let store = store_with(Arc::clone(&kv));

        let session = store
            .login(Credentials::new("admin@restaurant.com", DEMO_PASSWORD))
            .await
            .unwrap();

        assert_eq!(session.identity.role, Role::Admin);
        assert_eq!(store.current_identity(), Some(session.identity.clone()));
        assert!(store.is_authenticated());
        assert_eq!(kv.get(keys::AUTH_TOKEN).as_deref(), Some(session.token.as_str()));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn wrong_password_leaves_session_untouched() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let store = store_with(Arc::clone(&kv));

        let err = store
            .login(Credentials::new("admin@restaurant.com", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::InvalidCredentials);
        assert_eq!(store.current_identity(), None);
        assert!(kv.is_empty());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn register_signs_in_with_next_id() {
        let store = store_with(Arc::new(InMemoryKeyValueStore::new()));

        let session = store
            .register(registration("lena@restaurant.com", Role::Chef))
            .await
            .unwrap();

        assert_eq!(session.identity.id.get(), 4);
        assert!(session.identity.is_active);
        assert!(store.has_role(Role::Chef));

        // The new account can log in afterwards.
        store.logout();
        let again = store
            .login(Credentials::new("lena@restaurant.com", DEMO_PASSWORD))
            .await
            .unwrap();
        assert_eq!(again.identity.id, session.identity.id);
    }

    #[tokio::test]
    async fn register_duplicate_email_already_exists() {
        let store = store_with(Arc::new(InMemoryKeyValueStore::new()));
        let err = store
            .register(registration("admin@restaurant.com", Role::Waiter))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(_)));
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let store = store_with(Arc::clone(&kv));
        store
            .login(Credentials::new("manager@restaurant.com", DEMO_PASSWORD))
            .await
            .unwrap();

        store.logout();
        store.logout();

        assert_eq!(store.current_identity(), None);
        assert!(!store.is_authenticated());
        assert!(kv.get(keys::CURRENT_USER).is_none());
    }

    #[test]
    fn restores_persisted_session() {
        let now = Utc::now();
        let waiter = IdentityRegistry::demo(now)
            .find_by_email("waiter@restaurant.com")
            .cloned()
            .unwrap();
        let kv = Arc::new(InMemoryKeyValueStore::with_entries([
            (keys::AUTH_TOKEN, "session_abc".to_string()),
            (keys::CURRENT_USER, serde_json::to_string(&waiter).unwrap()),
        ]));

        let store = store_with(kv);
        assert_eq!(store.current_identity(), Some(waiter));
        assert!(store.has_any_role(&[Role::Waiter, Role::Cashier]));
    }

    #[test]
    fn corrupt_payload_clears_everything() {
        let kv = Arc::new(InMemoryKeyValueStore::with_entries([
            (keys::AUTH_TOKEN, "session_abc"),
            (keys::CURRENT_USER, "{not json"),
        ]));

        let store = store_with(Arc::clone(&kv));
        assert_eq!(store.current_identity(), None);
        assert!(!store.is_authenticated());
        assert!(kv.is_empty());
    }

    #[test]
    fn token_without_identity_counts_as_authenticated() {
        let kv = Arc::new(InMemoryKeyValueStore::with_entries([(keys::AUTH_TOKEN, "session_abc")]));
        let store = store_with(kv);
        assert!(store.is_authenticated());
        assert_eq!(store.current_identity(), None);
    }

    #[test]
    fn loading_flag_spans_the_simulated_delay() {
        let scheduler = Arc::new(ManualScheduler::new());
        let ctx = StoreContext::new(Arc::new(bistro_core::SystemClock), scheduler.clone());
        let store = SessionStore::new(
            ctx,
            Arc::new(InMemoryKeyValueStore::new()),
            IdentityRegistry::demo(Utc::now()),
            DEFAULT_AUTH_LATENCY,
        );

        let mut pending = store.login(Credentials::new("admin@restaurant.com", DEMO_PASSWORD));
        assert!(store.is_loading());
        assert!(pending.try_take().is_none());

        scheduler.advance(Duration::from_millis(1499));
        assert!(store.is_loading());

        scheduler.advance(Duration::from_millis(1));
        assert!(!store.is_loading());
        assert!(pending.try_take().unwrap().is_ok());
    }

    #[test]
    fn abandoned_login_still_lands() {
        let scheduler = Arc::new(ManualScheduler::new());
        let ctx = StoreContext::new(Arc::new(bistro_core::SystemClock), scheduler.clone());
        let store = SessionStore::new(
            ctx,
            Arc::new(InMemoryKeyValueStore::new()),
            IdentityRegistry::demo(Utc::now()),
            DEFAULT_AUTH_LATENCY,
        );

        drop(store.login(Credentials::new("admin@restaurant.com", DEMO_PASSWORD)));
        scheduler.run_until_idle();

        assert!(store.has_role(Role::Admin));
        assert!(!store.is_loading());
    }
}
