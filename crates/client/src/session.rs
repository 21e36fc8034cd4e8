//! Authentication session store.
//!
//! Holds the logged-in user and their bearer token, mirrored to durable
//! storage under [`keys::TOKEN`] and [`keys::USER`].
//!
//! # States
//!
//! - **Anonymous** - no session. The only way out is a successful
//!   [`SessionStore::login`].
//! - **Authenticated** - user and token present together. The only way out
//!   is [`SessionStore::logout`].
//!
//! [`SessionStore::register`] creates an account on the backend but never
//! changes the state; callers log in separately.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shopfront_core::{Email, EmailError, Role, UserId};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::amount;
use crate::api::{ApiClient, ApiError};
use crate::storage::{Storage, StorageError, keys};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// A required form field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The login response carried no token.
    #[error("no token received from server")]
    NoToken,

    /// The login response carried a user ID that is not an integer.
    #[error("server sent an unusable user id: {0}")]
    InvalidUserId(String),

    /// The backend call failed. Displays the backend's message verbatim.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session could not be written to storage.
    #[error("failed to save session: {0}")]
    Storage(#[from] StorageError),

    /// The user record could not be encoded.
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),

    /// The operation needs a logged-in user.
    #[error("login required")]
    NotAuthenticated,

    /// The operation needs an admin account.
    #[error("admin access required")]
    NotAdmin,
}

/// Identity of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// A logged-in user paired with their bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: SecretString,
}

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    role: Role,
}

#[derive(Debug, Default, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<BackendUser>,
}

/// User record as the backend returns it; every field may be missing.
#[derive(Debug, Default, Deserialize)]
struct BackendUser {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// Owner of the authentication session.
pub struct SessionStore {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    session: Option<Session>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("api", &self.api)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Restore the session from storage.
    ///
    /// The store starts authenticated only if both the token and a well-formed
    /// user record are stored; anything else starts anonymous.
    pub fn hydrate(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        let session = load_session(storage.as_ref());
        tracing::debug!(authenticated = session.is_some(), "Session hydrated");
        Self {
            api,
            storage,
            session,
        }
    }

    /// Current session, if logged in.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Logged-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    /// Bearer token, if logged in.
    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.session.as_ref().map(|s| &s.token)
    }

    /// Anonymous or authenticated.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.session.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    /// True when a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// True when the logged-in user is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(|u| u.role.is_admin())
    }

    /// Current session or `AuthError::NotAuthenticated`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` when anonymous.
    pub fn require_session(&self) -> Result<&Session, AuthError> {
        self.session.as_ref().ok_or(AuthError::NotAuthenticated)
    }

    /// Current session if it belongs to an admin.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` when anonymous and
    /// `AuthError::NotAdmin` for customer accounts.
    pub fn require_admin(&self) -> Result<&Session, AuthError> {
        let session = self.require_session()?;
        if session.user.role.is_admin() {
            Ok(session)
        } else {
            Err(AuthError::NotAdmin)
        }
    }

    /// Log in and persist the resulting session.
    ///
    /// The backend's user record is normalized: a missing, zero or empty ID
    /// becomes the current timestamp in milliseconds, a missing name or email
    /// becomes the email used to log in, and a missing or unknown role becomes
    /// customer. An ID that is present but not an integer fails the login.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidEmail` / `AuthError::MissingField` for bad input
    ///   (no request is sent)
    /// - `AuthError::Api` if the backend rejects the login
    /// - `AuthError::NoToken` if the response carries no token
    /// - `AuthError::InvalidUserId` if the user ID is not an integer
    /// - `AuthError::Storage` if the session cannot be saved
    ///
    /// On error the previous session, in memory and in storage, is kept.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &mut self,
        email: &str,
        password: &SecretString,
    ) -> Result<&Session, AuthError> {
        let email = Email::parse(email)?;
        if password.expose_secret().is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        let request = LoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let response: Option<LoginResponse> =
            self.api.post("/auth/login", &request, None).await?;
        let response = response.unwrap_or_default();

        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NoToken)?;
        let user = normalize_user(response.user.unwrap_or_default(), &email)?;

        self.persist(&token, &user)?;
        info!(user_id = %user.id, role = %user.role, "Logged in");

        Ok(&*self.session.insert(Session {
            user,
            token: SecretString::from(token),
        }))
    }

    /// Register a customer account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns validation errors for blank or malformed input, or
    /// `AuthError::Api` if the backend rejects the registration.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<(), AuthError> {
        self.register_as(name, email, password, Role::Customer).await
    }

    /// Register an account with an explicit role. Does not log in.
    ///
    /// # Errors
    ///
    /// See [`SessionStore::register`].
    #[instrument(skip(self, name, password), fields(email = %email, role = %role))]
    pub async fn register_as(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
        role: Role,
    ) -> Result<(), AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingField("name"));
        }
        let email = Email::parse(email)?;
        if password.expose_secret().is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        let request = RegisterRequest {
            name,
            email: email.as_str(),
            password: password.expose_secret(),
            role,
        };
        let _: Value = self.api.post("/auth/register", &request, None).await?;

        info!("Registered account");
        Ok(())
    }

    /// End the session and forget it in storage. Always succeeds.
    pub fn logout(&mut self) {
        self.session = None;
        for key in [keys::TOKEN, keys::USER] {
            if let Err(e) = self.storage.remove(key) {
                warn!(error = %e, key, "Failed to remove session entry");
            }
        }
        info!("Logged out");
    }

    /// Write token and user; on a partial failure restore the previous token.
    fn persist(&self, token: &str, user: &User) -> Result<(), AuthError> {
        let user_json = serde_json::to_string(user)?;
        let previous_token = self.storage.get(keys::TOKEN).ok().flatten();

        self.storage.set(keys::TOKEN, token)?;
        if let Err(e) = self.storage.set(keys::USER, &user_json) {
            let rollback = match previous_token {
                Some(previous) => self.storage.set(keys::TOKEN, &previous),
                None => self.storage.remove(keys::TOKEN),
            };
            if let Err(rollback_err) = rollback {
                warn!(error = %rollback_err, "Failed to restore previous token");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

/// Fill the gaps in a backend user record.
fn normalize_user(raw: BackendUser, login_email: &Email) -> Result<User, AuthError> {
    let non_empty = |value: Option<String>| value.filter(|s| !s.trim().is_empty());

    let id = match raw.id {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => {
            let id = amount::parse(&value)
                .filter(|n| n.fract().is_zero())
                .and_then(|n| n.to_i64())
                .ok_or_else(|| AuthError::InvalidUserId(value.to_string()))?;
            Some(id).filter(|id| *id != 0)
        }
    };

    Ok(User {
        id: UserId::new(id.unwrap_or_else(|| Utc::now().timestamp_millis())),
        name: non_empty(raw.name).unwrap_or_else(|| login_email.to_string()),
        email: non_empty(raw.email).unwrap_or_else(|| login_email.to_string()),
        role: raw
            .role
            .as_deref()
            .and_then(|r| r.parse().ok())
            .unwrap_or_default(),
    })
}

/// Read a stored session; anything short of a complete, valid pair is `None`.
fn load_session(storage: &dyn Storage) -> Option<Session> {
    let read = |key: &str| match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, key, "Failed to read session entry");
            None
        }
    };

    let token = read(keys::TOKEN).filter(|t| !t.is_empty())?;
    let raw_user = read(keys::USER)?;

    match serde_json::from_str::<User>(&raw_user) {
        Ok(user) => Some(Session {
            user,
            token: SecretString::from(token),
        }),
        Err(e) => {
            warn!(error = %e, "Stored user record is malformed, starting anonymous");
            None
        }
    }
}
