//! Integration tests for login, registration and logout.
//!
//! The session store runs on file storage in a temporary directory so the
//! tests also cover rehydration across "restarts".

use std::sync::Arc;

use secrecy::SecretString;
use shopfront_client::storage::keys;
use shopfront_client::{AuthError, FileStorage, SessionState, SessionStore, Storage};
use shopfront_core::{Role, UserId};
use shopfront_integration_tests::{
    ADMIN_EMAIL, CUSTOMER_EMAIL, CUSTOMER_ID, MockBackend, NO_TOKEN_EMAIL, PASSWORD, TAKEN_EMAIL,
};
use tempfile::TempDir;

struct Fixture {
    backend: MockBackend,
    dir: TempDir,
}

impl Fixture {
    async fn new() -> Self {
        Self {
            backend: MockBackend::start().await.expect("Failed to start mock backend"),
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    fn storage(&self) -> Arc<FileStorage> {
        Arc::new(FileStorage::open(self.dir.path()).expect("Failed to open storage"))
    }

    fn session(&self) -> SessionStore {
        SessionStore::hydrate(
            self.backend.api().expect("Failed to build client"),
            self.storage(),
        )
    }
}

fn password(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_persists_and_rehydrates() {
    let fx = Fixture::new().await;
    let mut session = fx.session();
    assert_eq!(session.state(), SessionState::Anonymous);

    let logged_in = session
        .login(CUSTOMER_EMAIL, &password(PASSWORD))
        .await
        .expect("login failed");
    assert_eq!(logged_in.user.id, UserId::new(CUSTOMER_ID));
    assert_eq!(logged_in.user.name, "Asha");
    assert_eq!(logged_in.user.role, Role::Customer);

    let request = &fx.backend.requests_to("/auth/login")[0];
    assert_eq!(request.method, "POST");
    assert_eq!(
        request.body,
        Some(serde_json::json!({"email": CUSTOMER_EMAIL, "password": PASSWORD}))
    );

    let storage = fx.storage();
    assert_eq!(
        storage.get(keys::TOKEN).expect("read failed").as_deref(),
        Some("tok-asha")
    );

    let restarted = fx.session();
    assert_eq!(restarted.state(), SessionState::Authenticated);
    assert_eq!(restarted.user().map(|u| u.email.as_str()), Some(CUSTOMER_EMAIL));
}

#[tokio::test]
async fn test_login_normalizes_sparse_user() {
    let fx = Fixture::new().await;
    let mut session = fx.session();

    let logged_in = session
        .login(ADMIN_EMAIL, &password(PASSWORD))
        .await
        .expect("login failed");

    // Backend sends a string ID and no name.
    assert_eq!(logged_in.user.id, UserId::new(1));
    assert_eq!(logged_in.user.name, ADMIN_EMAIL);
    assert!(session.is_admin());
    assert!(session.require_admin().is_ok());
}

#[tokio::test]
async fn test_invalid_credentials_message_and_state_unchanged() {
    let fx = Fixture::new().await;
    let mut session = fx.session();

    let err = session
        .login(CUSTOMER_EMAIL, &password("wrong"))
        .await
        .expect_err("login should fail");

    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(session.state(), SessionState::Anonymous);
    assert_eq!(fx.storage().get(keys::TOKEN).expect("read failed"), None);
}

#[tokio::test]
async fn test_login_without_token_keeps_previous_session() {
    let fx = Fixture::new().await;
    let mut session = fx.session();
    session
        .login(CUSTOMER_EMAIL, &password(PASSWORD))
        .await
        .expect("login failed");

    let err = session
        .login(NO_TOKEN_EMAIL, &password("anything"))
        .await
        .expect_err("login should fail");

    assert!(matches!(err, AuthError::NoToken));
    assert_eq!(err.to_string(), "no token received from server");
    assert_eq!(session.user().map(|u| u.id), Some(UserId::new(CUSTOMER_ID)));

    let storage = fx.storage();
    assert_eq!(
        storage.get(keys::TOKEN).expect("read failed").as_deref(),
        Some("tok-asha")
    );
    assert!(
        storage
            .get(keys::USER)
            .expect("read failed")
            .is_some_and(|u| u.contains(CUSTOMER_EMAIL))
    );
}

#[tokio::test]
async fn test_invalid_email_sends_no_request() {
    let fx = Fixture::new().await;
    let mut session = fx.session();

    let err = session
        .login("not-an-email", &password(PASSWORD))
        .await
        .expect_err("login should fail");

    assert!(matches!(err, AuthError::InvalidEmail(_)));
    assert!(fx.backend.requests().is_empty());
}

// ============================================================================
// Register / logout
// ============================================================================

#[tokio::test]
async fn test_register_sends_customer_role_and_stays_anonymous() {
    let fx = Fixture::new().await;
    let session = fx.session();

    session
        .register("Ben", "ben@example.com", &password("pw"))
        .await
        .expect("register failed");

    assert_eq!(session.state(), SessionState::Anonymous);
    let request = &fx.backend.requests_to("/auth/register")[0];
    assert_eq!(
        request.body,
        Some(serde_json::json!({
            "name": "Ben", "email": "ben@example.com", "password": "pw", "role": "customer"
        }))
    );
}

#[tokio::test]
async fn test_register_error_propagates() {
    let fx = Fixture::new().await;
    let session = fx.session();

    let err = session
        .register("Dup", TAKEN_EMAIL, &password("pw"))
        .await
        .expect_err("register should fail");

    assert_eq!(err.to_string(), "User already exists");
}

#[tokio::test]
async fn test_logout_clears_memory_and_storage() {
    let fx = Fixture::new().await;
    let mut session = fx.session();
    session
        .login(CUSTOMER_EMAIL, &password(PASSWORD))
        .await
        .expect("login failed");

    session.logout();

    assert_eq!(session.state(), SessionState::Anonymous);
    let storage = fx.storage();
    assert_eq!(storage.get(keys::TOKEN).expect("read failed"), None);
    assert_eq!(storage.get(keys::USER).expect("read failed"), None);
    assert_eq!(fx.session().state(), SessionState::Anonymous);
}
