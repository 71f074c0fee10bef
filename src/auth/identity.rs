//! Bearer credential verification
//!
//! Tokens are issued by the external identity provider and verified here
//! with the shared HS256 secret. The service never issues tokens itself;
//! its only job is to turn a bearer credential into a verified email.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::types::{HubError, Result};

/// Claims expected from the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Verified email of the principal
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// The verified principal behind a request
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub email: String,
}

/// Verifies bearer credentials against the identity provider's signing key
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<VerifiedIdentity>;
}

/// HS256 verifier using the provider's shared secret
#[derive(Clone)]
pub struct JwtIdentityVerifier {
    secret: String,
}

impl JwtIdentityVerifier {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn verify(&self, token: &str) -> Result<VerifiedIdentity> {
        let validation = Validation::default();

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            let message = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidToken => "Invalid token",
                ErrorKind::InvalidSignature => "Invalid signature",
                _ => "Token validation failed",
            };
            HubError::Unauthorized(message.to_string())
        })?;

        if token_data.claims.email.is_empty() {
            return Err(HubError::Unauthorized("Token missing email claim".into()));
        }

        Ok(VerifiedIdentity {
            email: token_data.claims.email,
        })
    }
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format and raw tokens.
pub fn extract_bearer(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    const TEST_SECRET: &str = "test-secret-that-is-at-least-32-characters-long";

    fn make_token(email: &str, exp_offset: i64) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let claims = Claims {
            email: email.to_string(),
            exp: (now + exp_offset) as u64,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = JwtIdentityVerifier::new(TEST_SECRET.into());
        let token = make_token("tutor@example.com", 3600);

        let identity = verifier.verify(&token).unwrap();
        assert_eq!(identity.email, "tutor@example.com");
    }

    #[test]
    fn test_verify_expired_token() {
        let verifier = JwtIdentityVerifier::new(TEST_SECRET.into());
        let token = make_token("tutor@example.com", -3600);

        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, HubError::Unauthorized(_)));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let verifier = JwtIdentityVerifier::new("another-secret-also-32-characters-x".into());
        let token = make_token("tutor@example.com", 3600);

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_verify_garbage_token() {
        let verifier = JwtIdentityVerifier::new(TEST_SECRET.into());
        assert!(verifier.verify("not-a-jwt").is_err());
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(extract_bearer(Some("abc123")), Some("abc123"));
        assert_eq!(extract_bearer(Some("Bearer ")), None);
        assert_eq!(extract_bearer(Some("Basic dXNlcg==")), None);
        assert_eq!(extract_bearer(None), None);
    }
}
