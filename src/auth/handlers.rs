use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::AuthService,
    types::{AuthResponse, LoginRequest, RegisterRequest},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for account registration
///
/// POST /auth/register
/// Returns 201 with the public identity and a bearer token
#[instrument(name = "register", skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    info!("Handling registration request");

    let service = AuthService::new(
        Arc::clone(&state.user_repository),
        state.token_config.clone(),
    );
    let response = service.register(request).await?;

    info!(user_id = %response.user.id, "Registration completed");

    Ok((StatusCode::CREATED, Json(response)))
}

/// HTTP handler for credential login
///
/// POST /auth/login
/// Returns 200 with the public identity and a bearer token
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    info!("Handling login request");

    let service = AuthService::new(
        Arc::clone(&state.user_repository),
        state.token_config.clone(),
    );
    let response = service.login(request).await?;

    info!(user_id = %response.user.id, "Login completed");

    Ok(Json(response))
}
