use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::IssuedToken;
use chrono::Utc;

use crate::domain::user::models::AuthenticatedIdentity;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::Principal;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserRecord;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;
use crate::user::ports::AuthGatePort;
use crate::user::ports::UserStore;

/// Domain service for registration, login and per-request authentication.
///
/// Holds no per-request state: every call works only on its arguments, the
/// injected store and the immutable authenticator.
pub struct AuthGate<S>
where
    S: UserStore,
{
    store: Arc<S>,
    authenticator: Arc<Authenticator>,
}

impl<S> AuthGate<S>
where
    S: UserStore,
{
    /// Create a new auth gate with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - User persistence implementation
    /// * `authenticator` - Password hashing and token handling
    pub fn new(store: Arc<S>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            store,
            authenticator,
        }
    }
}

#[async_trait]
impl<S> AuthGatePort for AuthGate<S>
where
    S: UserStore,
{
    async fn register(&self, command: RegisterCommand) -> Result<UserRecord, UserError> {
        let RegisterCommand { username, password } = command;

        // bcrypt is CPU bound; keep it off the async workers.
        let authenticator = Arc::clone(&self.authenticator);
        let password_hash =
            tokio::task::spawn_blocking(move || authenticator.hash_password(password.expose()))
                .await
                .map_err(|e| UserError::Unknown(format!("Hashing task failed: {}", e)))?
                .map_err(|e| UserError::Hashing(e.to_string()))?;

        let record = UserRecord {
            id: UserId::new(),
            username,
            password_hash,
            created_at: Utc::now(),
        };

        let saved = self.store.save(record).await?;

        tracing::info!(
            user_id = %saved.id,
            username = %saved.username,
            "User registered"
        );

        Ok(saved)
    }

    async fn login(&self, command: LoginCommand) -> Result<IssuedToken, UserError> {
        let LoginCommand { username, password } = command;

        let record = match Username::new(username.clone()) {
            Ok(username) => self.store.lookup(&username).await?,
            Err(_) => None,
        };

        let authenticator = Arc::clone(&self.authenticator);
        let outcome = tokio::task::spawn_blocking(move || match &record {
            Some(record) => authenticator.authenticate(
                &password,
                Some(record.password_hash.as_str()),
                record.username.as_str(),
            ),
            None => authenticator.authenticate(&password, None, ""),
        })
        .await
        .map_err(|e| UserError::Unknown(format!("Verification task failed: {}", e)))?;

        match outcome {
            Ok(token) => {
                tracing::info!(username = %token.subject, "Login succeeded");
                Ok(token)
            }
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::info!(username = %username, "Login rejected");
                Err(UserError::InvalidCredentials)
            }
            Err(AuthenticationError::JwtError(e)) => {
                tracing::error!(error = %e, "Token issuance failed");
                Err(UserError::TokenIssuance(e.to_string()))
            }
        }
    }

    async fn authenticate_request(&self, current: &Principal, token: Option<&str>) -> Principal {
        if current.is_authenticated() {
            return current.clone();
        }

        let Some(token) = token else {
            return Principal::Anonymous;
        };

        let tokens = self.authenticator.token_service();

        let subject = match tokens.extract_subject(token) {
            Ok(subject) => subject,
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token rejected");
                return Principal::Anonymous;
            }
        };

        let username = match Username::new(subject) {
            Ok(username) => username,
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token subject is not a valid username");
                return Principal::Anonymous;
            }
        };

        let record = match self.store.lookup(&username).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!(username = %username, "Bearer token subject has no account");
                return Principal::Anonymous;
            }
            Err(e) => {
                tracing::warn!(error = %e, "User lookup failed during request authentication");
                return Principal::Anonymous;
            }
        };

        if !tokens.validate(token, record.username.as_str()) {
            tracing::debug!(username = %record.username, "Bearer token failed validation");
            return Principal::Anonymous;
        }

        Principal::Authenticated(AuthenticatedIdentity::new(record.username))
    }
}
