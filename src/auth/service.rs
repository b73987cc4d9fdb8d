use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::UserModel,
    repository::UserRepository,
    token::TokenConfig,
    types::{AuthResponse, LoginRequest, RegisterRequest, UserResponse},
};
use crate::shared::AppError;

/// Service for credential verification and account registration
pub struct AuthService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    token_config: TokenConfig,
}

impl AuthService {
    pub fn new(
        repository: Arc<dyn UserRepository + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            repository,
            token_config,
        }
    }

    /// Registers a new account and returns its public identity plus a
    /// freshly issued token.
    ///
    /// Validation happens before any mutation; uniqueness is enforced
    /// atomically by the repository insert.
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        info!("Starting registration");

        let username = request.username.trim();
        if username.is_empty() || request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AppError::Validation("All fields are required".to_string()));
        }

        let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST).map_err(|e| {
            warn!(error = %e, "Password hashing failed");
            AppError::Internal
        })?;

        let user = UserModel::new(username, &request.email, password_hash);
        self.repository.create_user(&user).await?;

        let token = self.token_config.create_token(&user.id)?;

        info!(user_id = %user.id, username = %user.username, "User registered successfully");

        Ok(AuthResponse {
            user: UserResponse {
                id: user.id,
                username: user.username,
                email: user.email,
            },
            token,
        })
    }

    /// Verifies credentials and returns the public identity plus a token.
    ///
    /// An unknown identifier and a wrong password both produce the same
    /// `InvalidCredentials`, so callers cannot probe for account existence.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        info!("Starting login");

        if request.email_or_username.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation(
                "emailOrUsername and password required".to_string(),
            ));
        }

        let user = match self
            .repository
            .find_by_identifier(&request.email_or_username)
            .await?
        {
            Some(user) => user,
            None => {
                debug!("Login identifier matched no user");
                return Err(AppError::InvalidCredentials);
            }
        };

        let matches = bcrypt::verify(&request.password, &user.password_hash).map_err(|e| {
            warn!(error = %e, "Password verification failed");
            AppError::Internal
        })?;
        if !matches {
            debug!(user_id = %user.id, "Password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.token_config.create_token(&user.id)?;

        info!(user_id = %user.id, "Login successful");

        Ok(AuthResponse {
            user: UserResponse {
                id: user.id,
                username: user.username,
                email: user.email,
            },
            token,
        })
    }
}
