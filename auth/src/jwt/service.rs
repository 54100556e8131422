use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::clock::Clock;
use super::clock::SystemClock;
use super::errors::JwtError;
use super::keys::SigningKey;

/// A freshly issued token together with the claims it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    pub fn as_str(&self) -> &str {
        &self.token
    }
}

/// Issues and validates signed, time-bounded identity tokens.
///
/// Tokens are HS256 JWTs signed with the current [`SigningKey`]. Retired keys
/// remain usable for verification and are picked by the token's `kid`
/// header. The signature is always checked before any claim is read; expiry
/// is then evaluated against the injected [`Clock`] with no leeway.
pub struct TokenService {
    current: SigningKey,
    retired: Vec<SigningKey>,
    validity: Duration,
    clock: Arc<dyn Clock>,
    algorithm: Algorithm,
}

impl TokenService {
    pub const DEFAULT_VALIDITY_HOURS: i64 = 10;

    /// Create a token service signing with `key`.
    ///
    /// # Arguments
    /// * `key` - Process-wide signing key
    ///
    /// # Returns
    /// TokenService using HS256, the system clock and a 10 hour validity window
    pub fn new(key: SigningKey) -> Self {
        Self {
            current: key,
            retired: Vec::new(),
            validity: Duration::hours(Self::DEFAULT_VALIDITY_HOURS),
            clock: Arc::new(SystemClock),
            algorithm: Algorithm::HS256,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Keep accepting tokens signed by a previous key.
    ///
    /// The key is only selected when a token's `kid` equals its id, so a
    /// retired key without an id is never used.
    pub fn with_retired_key(mut self, key: SigningKey) -> Self {
        self.retired.push(key);
        self
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a token for `subject`, valid from now for the validity window.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, JwtError> {
        let claims = Claims::for_subject(subject, self.clock.now(), self.validity);
        let token = self.sign(&claims)?;

        Ok(IssuedToken {
            token,
            subject: claims.sub.clone(),
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
        })
    }

    /// Encode and sign arbitrary claims with the current key.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        let mut header = Header::new(self.algorithm);
        header.kid = self.current.id().map(str::to_string);

        encode(&header, claims, self.current.encoding_key())
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify the signature and return the embedded subject.
    ///
    /// Expiry is not considered here.
    ///
    /// # Errors
    /// * `InvalidToken` - Signature does not verify or the token is malformed
    pub fn extract_subject(&self, token: &str) -> Result<String, JwtError> {
        self.decode_signed(token).map(|claims| claims.sub)
    }

    /// Verify the signature, then the expiry, and return the claims.
    ///
    /// # Errors
    /// * `InvalidToken` - Signature does not verify or the token is malformed
    /// * `TokenExpired` - Signature is valid but `now >= exp`
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.decode_signed(token)?;

        if claims.is_expired(self.clock.now().timestamp()) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }

    /// True iff the token verifies, is unexpired, and asserts `expected_subject`.
    pub fn validate(&self, token: &str, expected_subject: &str) -> bool {
        matches!(self.verify(token), Ok(claims) if claims.sub == expected_subject)
    }

    fn decode_signed(&self, token: &str) -> Result<Claims, JwtError> {
        let key = self.verification_key(token)?;

        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        decode::<Claims>(token, key.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }

    // Only the header is read here; it selects a key but is not trusted otherwise.
    fn verification_key(&self, token: &str) -> Result<&SigningKey, JwtError> {
        let header = decode_header(token).map_err(|e| JwtError::InvalidToken(e.to_string()))?;

        match header.kid.as_deref() {
            None => Ok(&self.current),
            Some(kid) if self.current.id() == Some(kid) => Ok(&self.current),
            Some(kid) => self
                .retired
                .iter()
                .find(|key| key.id() == Some(kid))
                .ok_or_else(|| JwtError::InvalidToken(format!("Unknown key id: {}", kid))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::jwt::clock::ManualClock;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";
    const OTHER_SECRET: &[u8] = b"other_secret_at_least_32_bytes_long!!";

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn service_at(secret: &[u8], clock: Arc<ManualClock>) -> TokenService {
        TokenService::new(SigningKey::from_secret(secret).unwrap()).with_clock(clock)
    }

    fn flip_signature(token: &str) -> String {
        let (signed, signature) = token.rsplit_once('.').unwrap();
        let mut chars: Vec<char> = signature.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        format!("{}.{}", signed, chars.into_iter().collect::<String>())
    }

    #[test]
    fn test_issue_and_validate() {
        let clock = Arc::new(ManualClock::new(start()));
        let service = service_at(SECRET, clock);

        let issued = service.issue("alice").expect("Failed to issue token");

        assert_eq!(issued.subject, "alice");
        assert_eq!(issued.issued_at, start());
        assert_eq!(issued.expires_at, start() + Duration::hours(10));
        assert_eq!(issued.as_str().split('.').count(), 3);
        assert!(service.validate(issued.as_str(), "alice"));
    }

    #[test]
    fn test_validate_with_system_clock() {
        let service = TokenService::new(SigningKey::from_secret(SECRET).unwrap());
        let issued = service.issue("alice").unwrap();

        assert!(service.validate(issued.as_str(), "alice"));
    }

    #[test]
    fn test_validate_rejects_other_subject() {
        let clock = Arc::new(ManualClock::new(start()));
        let service = service_at(SECRET, clock);
        let issued = service.issue("alice").unwrap();

        assert!(!service.validate(issued.as_str(), "bob"));
    }

    #[test]
    fn test_extract_subject() {
        let clock = Arc::new(ManualClock::new(start()));
        let service = service_at(SECRET, clock);
        let issued = service.issue("alice").unwrap();

        assert_eq!(service.extract_subject(issued.as_str()).unwrap(), "alice");
    }

    #[test]
    fn test_flipped_signature_fails_for_every_subject() {
        let clock = Arc::new(ManualClock::new(start()));
        let service = service_at(SECRET, clock);
        let issued = service.issue("alice").unwrap();
        let tampered = flip_signature(issued.as_str());

        assert!(!service.validate(&tampered, "alice"));
        assert!(!service.validate(&tampered, "bob"));
        assert!(matches!(
            service.extract_subject(&tampered),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expiry_window() {
        let clock = Arc::new(ManualClock::new(start()));
        let service = service_at(SECRET, Arc::clone(&clock));
        let issued = service.issue("alice").unwrap();

        clock.advance(Duration::hours(10) - Duration::seconds(1));
        assert!(service.validate(issued.as_str(), "alice"));

        clock.advance(Duration::seconds(1));
        assert!(!service.validate(issued.as_str(), "alice"));
        assert_eq!(
            service.verify(issued.as_str()).unwrap_err(),
            JwtError::TokenExpired
        );

        clock.advance(Duration::days(30));
        assert!(!service.validate(issued.as_str(), "alice"));
    }

    #[test]
    fn test_extract_subject_ignores_expiry() {
        let clock = Arc::new(ManualClock::new(start()));
        let service = service_at(SECRET, Arc::clone(&clock));
        let issued = service.issue("alice").unwrap();

        clock.advance(Duration::hours(11));
        assert_eq!(service.extract_subject(issued.as_str()).unwrap(), "alice");
    }

    #[test]
    fn test_custom_validity() {
        let clock = Arc::new(ManualClock::new(start()));
        let service = service_at(SECRET, Arc::clone(&clock)).with_validity(Duration::minutes(5));
        let issued = service.issue("alice").unwrap();

        assert_eq!(issued.expires_at, start() + Duration::minutes(5));

        clock.advance(Duration::minutes(5));
        assert!(!service.validate(issued.as_str(), "alice"));
    }

    #[test]
    fn test_extract_subject_with_wrong_key() {
        let clock = Arc::new(ManualClock::new(start()));
        let issuer = service_at(SECRET, Arc::clone(&clock));
        let verifier = service_at(OTHER_SECRET, clock);

        let issued = issuer.issue("alice").unwrap();

        assert!(matches!(
            verifier.extract_subject(issued.as_str()),
            Err(JwtError::InvalidToken(_))
        ));
        assert!(!verifier.validate(issued.as_str(), "alice"));
    }

    #[test]
    fn test_swapped_payload_is_rejected() {
        let clock = Arc::new(ManualClock::new(start()));
        let service = service_at(SECRET, clock);

        let alice = service.issue("alice").unwrap();
        let mallory = service.issue("mallory").unwrap();

        let alice_parts: Vec<&str> = alice.as_str().split('.').collect();
        let mallory_parts: Vec<&str> = mallory.as_str().split('.').collect();
        let forged = format!("{}.{}.{}", alice_parts[0], mallory_parts[1], alice_parts[2]);

        assert!(service.extract_subject(&forged).is_err());
        assert!(!service.validate(&forged, "mallory"));
    }

    #[test]
    fn test_malformed_tokens() {
        let service = TokenService::new(SigningKey::from_secret(SECRET).unwrap());

        for token in ["", "invalid.token.here", "a.b", "not-a-jwt"] {
            assert!(service.extract_subject(token).is_err(), "accepted {:?}", token);
            assert!(!service.validate(token, "alice"));
        }
    }

    #[test]
    fn test_extra_claims_round_trip_through_sign() {
        let clock = Arc::new(ManualClock::new(start()));
        let service = service_at(SECRET, clock);

        let claims = Claims::for_subject("alice", start(), Duration::hours(1))
            .with_extra("tenant", "blue");
        let token = service.sign(&claims).unwrap();

        let decoded = service.verify(&token).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_kid_header_and_rotation() {
        let clock = Arc::new(ManualClock::new(start()));
        let old_key = SigningKey::from_secret(SECRET).unwrap().with_id("v1");
        let new_key = SigningKey::from_secret(OTHER_SECRET).unwrap().with_id("v2");

        let old_service = TokenService::new(old_key.clone()).with_clock(clock.clone());
        let old_token = old_service.issue("alice").unwrap();
        assert_eq!(
            decode_header(old_token.as_str()).unwrap().kid.as_deref(),
            Some("v1")
        );

        let rotated = TokenService::new(new_key)
            .with_clock(clock.clone())
            .with_retired_key(old_key);
        assert!(rotated.validate(old_token.as_str(), "alice"));

        let new_token = rotated.issue("alice").unwrap();
        assert_eq!(
            decode_header(new_token.as_str()).unwrap().kid.as_deref(),
            Some("v2")
        );
        assert!(rotated.validate(new_token.as_str(), "alice"));

        // Without the retired key the old token no longer verifies.
        let new_only =
            TokenService::new(SigningKey::from_secret(OTHER_SECRET).unwrap().with_id("v2"))
                .with_clock(clock);
        assert!(matches!(
            new_only.extract_subject(old_token.as_str()),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_generated_keys_are_independent() {
        let clock = Arc::new(ManualClock::new(start()));
        let first = TokenService::new(SigningKey::generate()).with_clock(clock.clone());
        let second = TokenService::new(SigningKey::generate()).with_clock(clock);

        let issued = first.issue("alice").unwrap();

        assert!(first.validate(issued.as_str(), "alice"));
        assert!(!second.validate(issued.as_str(), "alice"));
    }
}
