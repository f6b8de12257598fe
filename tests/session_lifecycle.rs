//! End-to-end tests of the session lifecycle: restore, login, logout and
//! the navigation side effects they trigger.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use attendly::{
    AuthState, AuthenticationError, Authenticator, Credentials, MemoryBackend, Router, Session,
    SessionError, SessionManager, SessionProvider, SessionStore, StorageBackend, StorageError,
    UserProfile,
};

/// Install a subscriber once so `RUST_LOG` can surface session tracing
/// during test runs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("attendly=debug")),
        )
        .with_test_writer()
        .try_init();
}

fn sample_user() -> UserProfile {
    UserProfile {
        id: 1,
        name: "Ada".to_string(),
        email: "ada@example.edu".to_string(),
        is_staff: false,
    }
}

fn sample_session() -> Session {
    Session {
        access_token: "a".to_string(),
        refresh_token: "r".to_string(),
        user: sample_user(),
    }
}

/// Records every redirect the provider issues.
#[derive(Default)]
struct RecordingRouter {
    routes: Mutex<Vec<String>>,
}

impl RecordingRouter {
    fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Router for RecordingRouter {
    fn redirect_to(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}

struct StaticAuthenticator {
    session: Session,
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn exchange(&self, _credentials: &Credentials) -> Result<Session, AuthenticationError> {
        Ok(self.session.clone())
    }
}

struct RejectingAuthenticator;

#[async_trait]
impl Authenticator for RejectingAuthenticator {
    async fn exchange(&self, _credentials: &Credentials) -> Result<Session, AuthenticationError> {
        Err(AuthenticationError::InvalidCredentials(
            "invalid credentials".to_string(),
        ))
    }
}

/// Holds the credential exchange until released, to pin a login in flight.
struct GatedAuthenticator {
    session: Session,
    gate: Arc<tokio::sync::Notify>,
}

#[async_trait]
impl Authenticator for GatedAuthenticator {
    async fn exchange(&self, _credentials: &Credentials) -> Result<Session, AuthenticationError> {
        self.gate.notified().await;
        Ok(self.session.clone())
    }
}

/// Delegates to a memory backend but fails every remove.
struct WipeFailingBackend {
    inner: MemoryBackend,
}

#[async_trait]
impl StorageBackend for WipeFailingBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
    }
}

struct Harness {
    provider: SessionProvider,
    router: Arc<RecordingRouter>,
    backend: Arc<MemoryBackend>,
}

fn harness(authenticator: Arc<dyn Authenticator>) -> Harness {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    let store = SessionStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>);
    let manager = Arc::new(SessionManager::new(store, authenticator));
    let router = Arc::new(RecordingRouter::default());
    let provider = SessionProvider::new(manager, Arc::clone(&router) as Arc<dyn Router>);
    Harness {
        provider,
        router,
        backend,
    }
}

#[tokio::test]
async fn restore_of_empty_store_is_anonymous_without_redirect() {
    let h = harness(Arc::new(RejectingAuthenticator));

    assert_eq!(h.provider.state(), AuthState::Unknown);
    let state = h.provider.restore().await;

    assert_eq!(state, AuthState::Anonymous);
    assert!(h.provider.restoration_complete());
    // Restoration never navigates; route guards own that rendering.
    assert!(h.router.routes().is_empty());
}

#[tokio::test]
async fn restore_of_persisted_session_is_authenticated_without_redirect() {
    let h = harness(Arc::new(RejectingAuthenticator));
    let store = SessionStore::new(Arc::clone(&h.backend) as Arc<dyn StorageBackend>);
    store.save(&sample_session()).await.expect("seed");

    let state = h.provider.restore().await;

    assert_eq!(state, AuthState::Authenticated(sample_user()));
    assert!(h.router.routes().is_empty());
}

#[tokio::test]
async fn login_persists_session_and_redirects_to_dashboard_once() {
    let h = harness(Arc::new(StaticAuthenticator {
        session: sample_session(),
    }));
    h.provider.restore().await;

    let user = h
        .provider
        .login(&Credentials::new("x@y.com", "p"))
        .await
        .expect("login");

    assert_eq!(user, sample_user());
    assert_eq!(h.provider.state(), AuthState::Authenticated(sample_user()));
    assert_eq!(h.backend.len(), 3);
    assert_eq!(h.router.routes(), vec!["/dashboard".to_string()]);
}

#[tokio::test]
async fn failed_login_leaves_state_and_store_untouched() {
    let h = harness(Arc::new(RejectingAuthenticator));
    h.provider.restore().await;

    let err = h
        .provider
        .login(&Credentials::new("x@y.com", "wrong"))
        .await
        .expect_err("login should fail");

    match err {
        SessionError::Authentication(AuthenticationError::InvalidCredentials(message)) => {
            assert_eq!(message, "invalid credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.provider.state(), AuthState::Anonymous);
    assert!(h.backend.is_empty());
    assert!(h.router.routes().is_empty());
}

#[tokio::test]
async fn relogin_overwrites_session_without_second_redirect() {
    let h = harness(Arc::new(StaticAuthenticator {
        session: sample_session(),
    }));
    h.provider.restore().await;

    let credentials = Credentials::new("x@y.com", "p");
    h.provider.login(&credentials).await.expect("login");
    h.provider.login(&credentials).await.expect("re-login");

    assert!(h.provider.state().is_authenticated());
    assert_eq!(h.router.routes(), vec!["/dashboard".to_string()]);
}

#[tokio::test]
async fn logout_clears_store_and_redirects_to_login_once() {
    let h = harness(Arc::new(StaticAuthenticator {
        session: sample_session(),
    }));
    h.provider.restore().await;
    h.provider
        .login(&Credentials::new("x@y.com", "p"))
        .await
        .expect("login");

    h.provider.logout().await.expect("logout");

    assert_eq!(h.provider.state(), AuthState::Anonymous);
    assert!(h.backend.is_empty());
    assert_eq!(
        h.router.routes(),
        vec!["/dashboard".to_string(), "/login".to_string()]
    );
}

#[tokio::test]
async fn logout_while_anonymous_is_idempotent_and_silent() {
    let h = harness(Arc::new(RejectingAuthenticator));
    h.provider.restore().await;

    h.provider.logout().await.expect("logout");

    assert_eq!(h.provider.state(), AuthState::Anonymous);
    assert!(h.backend.is_empty());
    assert!(h.router.routes().is_empty());
}

#[tokio::test]
async fn logout_with_failing_wipe_still_goes_anonymous_and_redirects() {
    init_tracing();
    let backend = Arc::new(WipeFailingBackend {
        inner: MemoryBackend::new(),
    });
    let store = SessionStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>);
    let manager = Arc::new(SessionManager::new(
        store,
        Arc::new(StaticAuthenticator {
            session: sample_session(),
        }),
    ));
    let router = Arc::new(RecordingRouter::default());
    let provider = SessionProvider::new(manager, Arc::clone(&router) as Arc<dyn Router>);

    provider.restore().await;
    provider
        .login(&Credentials::new("x@y.com", "p"))
        .await
        .expect("login");

    let err = provider.logout().await.expect_err("wipe should fail");
    assert!(matches!(err, SessionError::Storage(_)));
    // Fail-safe: locally logged out even though the wipe failed.
    assert_eq!(provider.state(), AuthState::Anonymous);
    assert_eq!(
        router.routes(),
        vec!["/dashboard".to_string(), "/login".to_string()]
    );
}

#[tokio::test]
async fn logout_with_failing_wipe_while_anonymous_does_not_redirect() {
    init_tracing();
    let backend = Arc::new(WipeFailingBackend {
        inner: MemoryBackend::new(),
    });
    let store = SessionStore::new(backend as Arc<dyn StorageBackend>);
    let manager = Arc::new(SessionManager::new(store, Arc::new(RejectingAuthenticator)));
    let router = Arc::new(RecordingRouter::default());
    let provider = SessionProvider::new(manager, Arc::clone(&router) as Arc<dyn Router>);

    assert_eq!(provider.restore().await, AuthState::Anonymous);

    let err = provider.logout().await.expect_err("wipe should fail");
    assert!(matches!(err, SessionError::Storage(_)));
    // No session ended, so nothing navigates.
    assert!(router.routes().is_empty());
    assert_eq!(provider.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn update_profile_refreshes_state_without_navigation() {
    let h = harness(Arc::new(StaticAuthenticator {
        session: sample_session(),
    }));
    h.provider.restore().await;
    h.provider
        .login(&Credentials::new("x@y.com", "p"))
        .await
        .expect("login");

    let updated = UserProfile {
        name: "Ada Lovelace".to_string(),
        ..sample_user()
    };
    h.provider
        .update_profile(updated.clone())
        .await
        .expect("update_profile");

    assert_eq!(h.provider.state(), AuthState::Authenticated(updated));
    assert_eq!(h.router.routes(), vec!["/dashboard".to_string()]);
}

#[tokio::test]
async fn logout_issued_during_login_runs_after_it() {
    let gate = Arc::new(tokio::sync::Notify::new());
    let h = harness(Arc::new(GatedAuthenticator {
        session: sample_session(),
        gate: Arc::clone(&gate),
    }));
    let provider = Arc::new(h.provider);
    provider.restore().await;

    let login_provider = Arc::clone(&provider);
    let login_task = tokio::spawn(async move {
        login_provider
            .login(&Credentials::new("x@y.com", "p"))
            .await
    });

    // Let the login reach its suspension point inside the exchange.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let logout_provider = Arc::clone(&provider);
    let logout_task = tokio::spawn(async move { logout_provider.logout().await });

    // The queued logout must not have run while the login holds the lock.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(h.router.routes().is_empty());
    assert_eq!(provider.state(), AuthState::Anonymous);

    gate.notify_one();
    login_task.await.expect("join").expect("login");
    logout_task.await.expect("join").expect("logout");

    // Total order: the login completed first, then the logout undid it.
    assert_eq!(provider.state(), AuthState::Anonymous);
    assert!(h.backend.is_empty());
    assert_eq!(
        h.router.routes(),
        vec!["/dashboard".to_string(), "/login".to_string()]
    );
}

#[tokio::test]
async fn second_restore_returns_resolved_state_without_new_reads() {
    struct CountingBackend {
        inner: MemoryBackend,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl StorageBackend for CountingBackend {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key).await
        }
    }

    init_tracing();
    let backend = Arc::new(CountingBackend {
        inner: MemoryBackend::new(),
        reads: AtomicUsize::new(0),
    });
    let store = SessionStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>);
    let manager = Arc::new(SessionManager::new(store, Arc::new(RejectingAuthenticator)));
    let router = Arc::new(RecordingRouter::default());
    let provider = SessionProvider::new(manager, router as Arc<dyn Router>);

    let first = provider.restore().await;
    let reads_after_first = backend.reads.load(Ordering::SeqCst);

    let second = provider.restore().await;
    assert_eq!(first, second);
    assert_eq!(backend.reads.load(Ordering::SeqCst), reads_after_first);
}
