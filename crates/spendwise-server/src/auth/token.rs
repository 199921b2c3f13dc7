use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Fixed token lifetime. Expiry forces a full re-login; there is no refresh.
const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies signed bearer tokens (HS256). Stateless: the only
/// inputs are the process-wide signing secret and the clock.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: TOKEN_TTL_SECS,
        }
    }

    #[cfg(test)]
    pub fn with_ttl(secret: &str, ttl_secs: i64) -> Self {
        Self {
            ttl_secs,
            ..Self::new(secret)
        }
    }

    pub fn issue(&self, user_id: &str) -> AppResult<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp: iat + self.ttl_secs,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Returns the embedded user id, or Unauthorized if the token is
    /// malformed, carries a bad signature, or has expired.
    pub fn verify(&self, token: &str) -> AppResult<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: a token is invalid the second past its expiry
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims.sub)
            .map_err(|_| AppError::Unauthorized("Not authorized, token failed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify_round_trips_user_id() {
        let tokens = TokenService::new("test-secret");
        let token = tokens.issue("user-123").unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), "user-123");
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::with_ttl("test-secret", -2);
        let token = tokens.issue("user-123").unwrap();
        assert!(matches!(
            tokens.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn expiry_boundary_is_exact() {
        // Still accepted while exp lies ahead of the clock
        let tokens = TokenService::with_ttl("test-secret", 1);
        let token = tokens.issue("user-123").unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), "user-123");

        // Rejected one second past exp. jsonwebtoken's default 60s leeway
        // would accept this token.
        let tokens = TokenService::with_ttl("test-secret", -1);
        let token = tokens.issue("user-123").unwrap();
        assert!(matches!(
            tokens.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = TokenService::new("secret-a");
        let verifier = TokenService::new("secret-b");
        let token = issuer.issue("user-123").unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        let tokens = TokenService::new("test-secret");
        assert!(tokens.verify("not-a-jwt").is_err());
        assert!(tokens.verify("").is_err());
    }
}
