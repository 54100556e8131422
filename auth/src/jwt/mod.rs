pub mod claims;
pub mod clock;
pub mod errors;
pub mod keys;
pub mod service;

pub use claims::Claims;
pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use errors::JwtError;
pub use keys::KeyStrategy;
pub use keys::SigningKey;
pub use service::IssuedToken;
pub use service::TokenService;
