//! Access token module
//!
//! Issues and verifies the signed tokens that carry an authenticated
//! user's identity between requests. Tokens are HS256 JWTs holding the
//! user ID and an expiry; no server-side session state is kept, so a
//! token stays valid until it expires even if the account changes.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried inside an access token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// Expiration time as a Unix timestamp
    pub exp: i64,
}

/// Issues and verifies access tokens with a shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_days: i64,
}

impl TokenService {
    /// Create a token service from the configured secret
    pub fn new(secret: &str, expiration_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_days,
        }
    }

    /// Token lifetime in days, as configured
    pub fn expiration_days(&self) -> i64 {
        self.expiration_days
    }

    /// Issue a token for the given user ID
    pub fn issue(&self, user_id: i64) -> Result<String> {
        let exp = Utc::now() + Duration::days(self.expiration_days);
        let claims = Claims {
            sub: user_id,
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to sign access token")
    }

    /// Verify a token and return the user ID it carries.
    ///
    /// Returns `None` for malformed, tampered, or expired tokens.
    pub fn verify(&self, token: &str) -> Option<i64> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims.sub)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = TokenService::new("test-secret", 7);
        let token = service.issue(42).expect("Failed to issue token");

        assert_eq!(service.verify(&token), Some(42));
    }

    #[test]
    fn test_verify_rejects_tampered_token() {
        let service = TokenService::new("test-secret", 7);
        let token = service.issue(42).expect("Failed to issue token");

        let mut tampered = token.clone();
        tampered.push('x');
        assert_eq!(service.verify(&tampered), None);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let issuer = TokenService::new("secret-a", 7);
        let verifier = TokenService::new("secret-b", 7);

        let token = issuer.issue(42).expect("Failed to issue token");
        assert_eq!(verifier.verify(&token), None);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let service = TokenService::new("test-secret", 7);
        assert_eq!(service.verify("not-a-token"), None);
        assert_eq!(service.verify(""), None);
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // Expiration in the past
        let service = TokenService::new("test-secret", -1);
        let token = service.issue(42).expect("Failed to issue token");

        assert_eq!(service.verify(&token), None);
    }
}
