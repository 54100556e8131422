//! Authentication utilities library
//!
//! Credential primitives for the identity service:
//! - Password hashing (bcrypt, cost 12 by default)
//! - Signed, time-bounded identity tokens (HS256 JWT)
//! - Authentication coordination
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::with_cost(4).unwrap();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{SigningKey, TokenService};
//!
//! let key = SigningKey::from_secret(b"secret_key_at_least_32_bytes_long!").unwrap();
//! let tokens = TokenService::new(key);
//! let issued = tokens.issue("alice").unwrap();
//! assert!(tokens.validate(issued.as_str(), "alice"));
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, PasswordHasher, SigningKey, TokenService};
//!
//! let auth = Authenticator::new(
//!     PasswordHasher::with_cost(4).unwrap(),
//!     TokenService::new(SigningKey::generate()),
//! );
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue token
//! let issued = auth.authenticate("password123", Some(&hash), "alice").unwrap();
//!
//! // Validate token
//! assert_eq!(auth.token_service().extract_subject(issued.as_str()).unwrap(), "alice");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::Clock;
pub use jwt::IssuedToken;
pub use jwt::JwtError;
pub use jwt::KeyStrategy;
pub use jwt::ManualClock;
pub use jwt::SigningKey;
pub use jwt::SystemClock;
pub use jwt::TokenService;
pub use password::PasswordError;
pub use password::PasswordHasher;
