use super::errors::PasswordError;

/// Password hashing implementation.
///
/// Salted bcrypt hashes in modular crypt format (`$2b$<cost>$<salt+hash>`).
/// The salt is generated per call and embedded in the output, so hashing the
/// same password twice yields two different strings that both verify.
///
/// Passwords longer than 72 bytes are rejected rather than truncated.
pub struct PasswordHasher {
    cost: u32,
    decoy: String,
}

/// Well-formed bcrypt salt and digest with zero trailing bits.
const DECOY_SALT: &str = "decoysaltforunknownuse";
const DECOY_DIGEST: &str = "...............................";

impl PasswordHasher {
    /// Cost used when none is configured.
    pub const DEFAULT_COST: u32 = 12;
    pub const MIN_COST: u32 = 4;
    pub const MAX_COST: u32 = 31;
    /// Longest password bcrypt hashes in full.
    pub const MAX_PASSWORD_BYTES: usize = 72;

    /// Create a new password hasher with the default cost.
    ///
    /// # Returns
    /// PasswordHasher instance configured with cost 12
    pub fn new() -> Self {
        Self {
            cost: Self::DEFAULT_COST,
            decoy: decoy_hash(Self::DEFAULT_COST),
        }
    }

    /// Create a password hasher with an explicit bcrypt cost.
    ///
    /// # Arguments
    /// * `cost` - bcrypt work factor (log2 of the round count)
    ///
    /// # Errors
    /// * `InvalidCost` - Cost is outside the range bcrypt accepts
    pub fn with_cost(cost: u32) -> Result<Self, PasswordError> {
        if !(Self::MIN_COST..=Self::MAX_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost {
                cost,
                min: Self::MIN_COST,
                max: Self::MAX_COST,
            });
        }

        Ok(Self {
            cost,
            decoy: decoy_hash(cost),
        })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// Modular crypt format hash (includes algorithm, cost, salt, and digest)
    ///
    /// # Errors
    /// * `TooLong` - Password exceeds 72 bytes
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.len() > Self::MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong {
                max: Self::MAX_PASSWORD_BYTES,
                actual: password.len(),
            });
        }

        bcrypt::non_truncating_hash(password, self.cost)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// The digest comparison is constant-time. A malformed hash or any
    /// algorithm error is reported as a mismatch, never as an error. So is a
    /// password over 72 bytes, which no stored hash can match.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::non_truncating_verify(password, hash).unwrap_or(false)
    }

    /// Spend one verification's worth of work against a throwaway hash.
    ///
    /// Used on the unknown-user login path so it costs the same as a
    /// wrong-password attempt. Always returns false.
    pub fn verify_decoy(&self, password: &str) -> bool {
        let _ = self.verify(password, &self.decoy);
        false
    }
}

fn decoy_hash(cost: u32) -> String {
    format!("$2b${:02}${}{}", cost, DECOY_SALT, DECOY_DIGEST)
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
