use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::types::Claims;
use crate::shared::AppError;

/// Configuration for JWT token operations
///
/// Built once at startup and carried in `AppState`; nothing reads the
/// signing secret from the environment after construction.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub expiration_days: i64,
}

impl TokenConfig {
    pub fn new() -> Self {
        // Allow configuring expiration via env var, default to 7 days
        let expiration_days = std::env::var("TOKEN_EXPIRATION_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(7);

        Self {
            secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            expiration_days,
        }
    }

    #[cfg(test)]
    pub fn with_expiration_days(expiration_days: i64) -> Self {
        Self {
            expiration_days,
            ..Self::new()
        }
    }

    /// Creates a signed token binding the given user id, expiring
    /// `expiration_days` from now
    #[instrument(skip(self, user_id))]
    pub fn create_token(&self, user_id: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = (now + Duration::days(self.expiration_days)).timestamp() as usize;

        debug!(
            expiration_days = self.expiration_days,
            exp_timestamp = exp,
            "Creating JWT token with expiration"
        );

        let claims = Claims {
            sub: user_id.to_string(),
            exp,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode JWT token");
            AppError::Internal
        })
    }

    /// Validates a token and returns the embedded claims if the signature
    /// verifies and the expiry has not passed
    #[instrument(skip(self, token))]
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        debug!("Decoding and validating JWT token");

        // No leeway: a token is rejected the second its expiry passes
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map(|data| {
            debug!(user_id = %data.claims.sub, exp = data.claims.exp, "JWT token decoded successfully");
            data.claims
        })
        .map_err(|e| {
            debug!(error = %e, "Failed to decode JWT token");
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            }
        })
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new()
    }
}
