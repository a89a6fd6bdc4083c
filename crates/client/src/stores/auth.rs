//! Account sign-in.
//!
//! The signed-in user is persisted; the session token is not. It lives only
//! in the remote client for the life of the process.

use barbuddy_core::Email;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use super::StoreContext;
use crate::error::{ClientError, Result};
use crate::remote::{AuthFlow, Endpoint, RemoteError};
use crate::store::{PersistedStore, StoreState};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<AuthUser>,
    pub is_authenticated: bool,
}

impl StoreState for AuthState {
    const KEY: &'static str = "auth-storage";
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserMetadata {
    first_name: String,
    last_name: String,
}

#[derive(Debug, Deserialize)]
struct SessionUser {
    id: String,
    email: String,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Deserialize)]
struct Session {
    access_token: Option<String>,
    user: SessionUser,
}

/// Body of a successful auth call. Sign-up answers with the bare user, and
/// no token, when email confirmation is pending.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthResponse {
    Session(Session),
    PendingConfirmation(SessionUser),
}

impl AuthResponse {
    fn into_parts(self) -> (Option<String>, SessionUser) {
        match self {
            Self::Session(session) => (session.access_token, session.user),
            Self::PendingConfirmation(user) => (None, user),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthStore {
    ctx: StoreContext,
    state: PersistedStore<AuthState>,
}

impl AuthStore {
    pub fn new(ctx: &StoreContext) -> Self {
        Self {
            ctx: ctx.clone(),
            state: ctx.open(),
        }
    }

    #[must_use]
    pub fn current_user(&self) -> Option<AuthUser> {
        self.state.read(|s| s.user.clone())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.read(|s| s.is_authenticated)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Email` or `ClientError::Validation` for bad
    /// input, `ClientError::Auth` when the credentials are rejected, and
    /// `ClientError::Remote` when the backend cannot be reached.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = Email::parse(email)?;
        check_password(password)?;

        if self.ctx.remote.is_demo() {
            let user = AuthUser {
                id: uuid::Uuid::new_v4().to_string(),
                first_name: email.local_part().to_owned(),
                last_name: String::new(),
                email,
                created_at: self.ctx.now(),
            };
            return Ok(self.establish(user));
        }

        let payload = json!({ "email": email.as_str(), "password": password });
        self.authenticate(AuthFlow::SignIn, &payload, &email).await
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Same as [`AuthStore::sign_in`].
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<AuthUser> {
        let email = Email::parse(email)?;
        check_password(password)?;
        let (first_name, last_name) = (first_name.trim(), last_name.trim());
        if first_name.is_empty() {
            return Err(ClientError::Validation("first name must not be empty".to_owned()));
        }

        if self.ctx.remote.is_demo() {
            let user = AuthUser {
                id: uuid::Uuid::new_v4().to_string(),
                email,
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
                created_at: self.ctx.now(),
            };
            return Ok(self.establish(user));
        }

        let payload = json!({
            "email": email.as_str(),
            "password": password,
            "data": { "first_name": first_name, "last_name": last_name },
        });
        self.authenticate(AuthFlow::SignUp, &payload, &email).await
    }

    async fn authenticate(&self, flow: AuthFlow, payload: &Value, email: &Email) -> Result<AuthUser> {
        let response = self
            .ctx
            .remote
            .mutate(&Endpoint::Auth(flow), payload)
            .await
            .map_err(|e| match e {
                RemoteError::Unauthorized(body) => {
                    warn!(?flow, "credentials rejected");
                    ClientError::Auth(body)
                }
                RemoteError::Status { status, body } if (400..500).contains(&status) => {
                    warn!(?flow, "credentials rejected");
                    ClientError::Auth(body)
                }
                other => other.into(),
            })?;

        let (token, account) = match serde_json::from_value::<AuthResponse>(response) {
            Ok(response) => response.into_parts(),
            Err(e) => {
                warn!(?flow, error = %e, "auth response did not include a user");
                return Err(ClientError::Auth("response did not include a user".to_owned()));
            }
        };
        let user = AuthUser {
            id: account.id,
            email: Email::parse(&account.email).unwrap_or_else(|_| email.clone()),
            first_name: account.user_metadata.first_name,
            last_name: account.user_metadata.last_name,
            created_at: account.created_at.unwrap_or_else(|| self.ctx.now()),
        };
        match token {
            Some(token) => self.ctx.remote.set_access_token(Some(SecretString::from(token))),
            None => info!(?flow, "no session yet, email confirmation pending"),
        }
        Ok(self.establish(user))
    }

    fn establish(&self, user: AuthUser) -> AuthUser {
        self.state.replace(AuthState {
            user: Some(user.clone()),
            is_authenticated: true,
        });
        info!(user = %user.id, "signed in");
        user
    }

    pub fn sign_out(&self) {
        self.ctx.remote.set_access_token(None);
        self.state.replace(AuthState::default());
        info!("signed out");
    }

    pub async fn flush(&self) {
        self.state.flush().await;
    }
}

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::remote::{DemoRemote, Remote};
    use crate::testing;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 20, 0, 0).unwrap()
    }

    /// Answers auth with a fixed session, or rejects everything.
    #[derive(Debug, Default)]
    struct ScriptedAuth {
        reject: bool,
        /// Answer with the bare user, as sign-up does before confirmation.
        pending: bool,
        token: std::sync::Mutex<Option<String>>,
    }

    #[async_trait]
    impl Remote for ScriptedAuth {
        async fn mutate(&self, _endpoint: &Endpoint, payload: &Value) -> std::result::Result<Value, RemoteError> {
            if self.reject {
                return Err(RemoteError::Status {
                    status: 400,
                    body: "Invalid login credentials".to_owned(),
                });
            }
            let user = json!({
                "id": "a1b2",
                "email": payload["email"],
                "created_at": "2026-09-01T12:00:00Z",
                "user_metadata": { "first_name": "Alex", "last_name": "Kim" }
            });
            if self.pending {
                return Ok(user);
            }
            Ok(json!({ "access_token": "jwt-token", "user": user }))
        }

        async fn query(&self, _endpoint: &Endpoint, _params: &Value) -> std::result::Result<Value, RemoteError> {
            Err(RemoteError::DemoMode)
        }

        fn set_access_token(&self, token: Option<SecretString>) {
            use secrecy::ExposeSecret;
            *self.token.lock().unwrap() = token.map(|t| t.expose_secret().to_owned());
        }
    }

    #[derive(Debug)]
    struct EmptyAuth;

    #[async_trait]
    impl Remote for EmptyAuth {
        async fn mutate(&self, _endpoint: &Endpoint, _payload: &Value) -> std::result::Result<Value, RemoteError> {
            Ok(json!({ "access_token": null }))
        }

        async fn query(&self, _endpoint: &Endpoint, _params: &Value) -> std::result::Result<Value, RemoteError> {
            Err(RemoteError::DemoMode)
        }
    }

    #[tokio::test]
    async fn test_demo_sign_in() {
        let (ctx, _) = testing::context(Arc::new(DemoRemote), start());
        let auth = AuthStore::new(&ctx);
        let user = auth.sign_in("alex@example.com", "hunter22").await.unwrap();
        assert_eq!(user.first_name, "alex");
        assert_eq!(user.created_at, start());
        assert!(auth.is_authenticated());
        assert_eq!(auth.current_user(), Some(user));

        auth.sign_out();
        assert!(!auth.is_authenticated());
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_input_validation() {
        let (ctx, _) = testing::context(Arc::new(DemoRemote), start());
        let auth = AuthStore::new(&ctx);
        assert!(matches!(
            auth.sign_in("not-an-email", "hunter22").await,
            Err(ClientError::Email(_))
        ));
        assert!(matches!(
            auth.sign_in("alex@example.com", "short").await,
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            auth.sign_up("alex@example.com", "hunter22", "  ", "Kim").await,
            Err(ClientError::Validation(_))
        ));
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_remote_sign_up_sets_token() {
        let remote = Arc::new(ScriptedAuth::default());
        let (ctx, _) = testing::context(remote.clone(), start());
        let auth = AuthStore::new(&ctx);
        let user = auth
            .sign_up("alex@example.com", "hunter22", "Alex", "Kim")
            .await
            .unwrap();
        assert_eq!(user.id, "a1b2");
        assert_eq!(user.last_name, "Kim");
        assert_eq!(remote.token.lock().unwrap().as_deref(), Some("jwt-token"));

        auth.sign_out();
        assert!(remote.token.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_pending_confirmation() {
        let remote = Arc::new(ScriptedAuth {
            pending: true,
            ..ScriptedAuth::default()
        });
        let (ctx, _) = testing::context(remote.clone(), start());
        let auth = AuthStore::new(&ctx);
        let user = auth
            .sign_up("alex@example.com", "hunter22", "Alex", "Kim")
            .await
            .unwrap();
        assert_eq!(user.id, "a1b2");
        assert_eq!(user.first_name, "Alex");
        assert!(auth.is_authenticated());
        assert!(remote.token.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_response_without_user() {
        let (ctx, _) = testing::context(Arc::new(EmptyAuth), start());
        let auth = AuthStore::new(&ctx);
        let err = auth.sign_in("alex@example.com", "hunter22").await.unwrap_err();
        assert!(matches!(err, ClientError::Auth(_)));
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let remote = Arc::new(ScriptedAuth {
            reject: true,
            ..ScriptedAuth::default()
        });
        let (ctx, _) = testing::context(remote, start());
        let auth = AuthStore::new(&ctx);
        let err = auth.sign_in("alex@example.com", "hunter22").await.unwrap_err();
        assert!(matches!(err, ClientError::Auth(ref body) if body.contains("Invalid login")));
        assert!(!auth.is_authenticated());
    }
}
