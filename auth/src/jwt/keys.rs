use std::fmt;

use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use rand::rngs::OsRng;
use rand::RngCore;

use super::errors::JwtError;

/// HMAC signing key, fixed for the life of the process.
///
/// Key material is never exposed after construction and is redacted from
/// `Debug` output. An optional key id is written to the `kid` header of every
/// token signed with this key so older keys can still be selected for
/// verification after a rotation.
#[derive(Clone)]
pub struct SigningKey {
    id: Option<String>,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    /// Shortest secret accepted for HS256.
    pub const MIN_SECRET_LEN: usize = 32;

    const GENERATED_LEN: usize = 64;

    /// Build a key from an externally configured secret.
    ///
    /// # Arguments
    /// * `secret` - Raw secret bytes (at least 32 bytes)
    ///
    /// # Errors
    /// * `KeyTooShort` - Secret is shorter than 256 bits
    pub fn from_secret(secret: &[u8]) -> Result<Self, JwtError> {
        if secret.len() < Self::MIN_SECRET_LEN {
            return Err(JwtError::KeyTooShort {
                min: Self::MIN_SECRET_LEN,
                actual: secret.len(),
            });
        }

        Ok(Self::from_bytes(secret))
    }

    /// Generate a random per-process key from the OS RNG.
    ///
    /// Tokens signed with a generated key do not survive a restart and cannot
    /// be verified by another instance.
    pub fn generate() -> Self {
        let mut secret = [0u8; Self::GENERATED_LEN];
        OsRng.fill_bytes(&mut secret);
        Self::from_bytes(&secret)
    }

    fn from_bytes(secret: &[u8]) -> Self {
        Self {
            id: None,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Attach a key id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Where the process signing key comes from.
///
/// `Configured` survives restarts and can be shared by several instances.
/// `Ephemeral` needs no configuration but invalidates every outstanding token
/// whenever the process restarts.
#[derive(Clone)]
pub enum KeyStrategy {
    Configured {
        secret: String,
        key_id: Option<String>,
    },
    Ephemeral,
}

impl KeyStrategy {
    /// Materialise the signing key.
    ///
    /// # Errors
    /// * `KeyTooShort` - Configured secret is shorter than 32 bytes
    pub fn signing_key(&self) -> Result<SigningKey, JwtError> {
        match self {
            KeyStrategy::Configured { secret, key_id } => {
                let key = SigningKey::from_secret(secret.as_bytes())?;
                Ok(match key_id {
                    Some(id) => key.with_id(id.clone()),
                    None => key,
                })
            }
            KeyStrategy::Ephemeral => Ok(SigningKey::generate()),
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, KeyStrategy::Ephemeral)
    }
}

impl fmt::Debug for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStrategy::Configured { key_id, .. } => f
                .debug_struct("Configured")
                .field("secret", &"<redacted>")
                .field("key_id", key_id)
                .finish(),
            KeyStrategy::Ephemeral => f.write_str("Ephemeral"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_secret_rejects_short_secret() {
        let result = SigningKey::from_secret(b"too_short");
        assert_eq!(
            result.unwrap_err(),
            JwtError::KeyTooShort {
                min: 32,
                actual: 9
            }
        );
    }

    #[test]
    fn test_from_secret_accepts_32_bytes() {
        let key = SigningKey::from_secret(b"secret_key_at_least_32_bytes_lng").expect("valid key");
        assert!(key.id().is_none());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let secret = "configured_secret_at_least_32_bytes_long";
        let key = SigningKey::from_secret(secret.as_bytes())
            .unwrap()
            .with_id("2026-01");
        let rendered = format!("{:?}", key);

        assert!(rendered.contains("2026-01"));
        assert!(rendered.contains("<redacted>"));

        let strategy = KeyStrategy::Configured {
            secret: secret.to_string(),
            key_id: None,
        };
        assert!(!format!("{:?}", strategy).contains(secret));
    }

    #[test]
    fn test_configured_strategy_carries_key_id() {
        let strategy = KeyStrategy::Configured {
            secret: "configured_secret_at_least_32_bytes_long".to_string(),
            key_id: Some("v2".to_string()),
        };

        let key = strategy.signing_key().expect("valid key");
        assert_eq!(key.id(), Some("v2"));
        assert!(!strategy.is_ephemeral());
    }

    #[test]
    fn test_configured_strategy_short_secret_fails() {
        let strategy = KeyStrategy::Configured {
            secret: "short".to_string(),
            key_id: None,
        };
        assert!(strategy.signing_key().is_err());
    }

    #[test]
    fn test_ephemeral_strategy() {
        let strategy = KeyStrategy::Ephemeral;
        assert!(strategy.is_ephemeral());
        assert!(strategy.signing_key().is_ok());
    }
}
