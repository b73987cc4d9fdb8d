use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use super::types::AuthUser;
use crate::shared::{AppError, AppState};

/// JWT authentication middleware - validates the Authorization Bearer header
/// and attaches the resolved identity to the request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), auth::jwt_auth))
/// Handlers can then extract Extension(user): Extension<AuthUser>.
#[instrument(skip(state, req, next))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    debug!(uri = %req.uri(), "Authenticating request");

    // Extract token from Authorization Bearer header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Unauthorized("No token provided".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Unauthorized("No token provided".to_string())
    })?;

    // Expired and malformed tokens both surface as 401 to the client
    let claims = match state.token_config.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Token validation failed: {}", e);
            return Err(e);
        }
    };

    debug!(user_id = %claims.sub, "Authentication successful, attaching identity to request");

    // The identity in extensions is the only way handlers learn who is calling
    req.extensions_mut().insert(AuthUser { id: claims.sub });

    Ok(next.run(req).await)
}
