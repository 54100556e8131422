use async_trait::async_trait;

use auth::IssuedToken;

use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::Principal;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::UserRecord;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;

/// Port for registration, login and request authentication.
#[async_trait]
pub trait AuthGatePort: Send + Sync + 'static {
    /// Register a new account.
    ///
    /// # Arguments
    /// * `command` - Validated username and plaintext password
    ///
    /// # Returns
    /// Stored record (carries the hash, never the plaintext)
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Store rejected a duplicate username
    /// * `Hashing` - Password hashing failed
    /// * `DatabaseError` - Store operation failed
    async fn register(&self, command: RegisterCommand) -> Result<UserRecord, UserError>;

    /// Verify credentials and issue a token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown user or wrong password (indistinguishable)
    /// * `TokenIssuance` - Token signing failed
    /// * `DatabaseError` - Store operation failed
    async fn login(&self, command: LoginCommand) -> Result<IssuedToken, UserError>;

    /// Decide who the current request acts as.
    ///
    /// Never fails. If `current` is already authenticated it is returned
    /// unchanged; otherwise a missing or invalid token yields `Anonymous`.
    ///
    /// # Arguments
    /// * `current` - Principal already attached to this request
    /// * `token` - Bearer token presented with the request, if any
    async fn authenticate_request(&self, current: &Principal, token: Option<&str>) -> Principal;
}

/// Persistence operations for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Find an account by username.
    ///
    /// # Returns
    /// Optional record (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn lookup(&self, username: &Username) -> Result<Option<UserRecord>, UserError>;

    /// Persist a new account.
    ///
    /// # Returns
    /// Persisted record
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `DatabaseError` - Database operation failed
    async fn save(&self, record: UserRecord) -> Result<UserRecord, UserError>;
}
