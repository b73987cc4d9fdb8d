use serde::{Deserialize, Serialize};

/// JWT claims binding a user identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String, // User id
    pub exp: usize,  // Expiration timestamp (standard JWT claim)
    pub iat: usize,  // Issued at timestamp (standard JWT claim)
}

/// Authenticated identity attached to the request by the auth middleware.
/// This is the only way handlers learn who is calling.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
}

/// Request payload for POST /auth/register
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request payload for POST /auth/login
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email_or_username: String,
    pub password: String,
}

/// Public identity fields returned to clients; never carries the hash
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Response for both register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}
