use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the users table
///
/// The password is stored only as a bcrypt hash; the plaintext never
/// touches this struct.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub id: String, // UUID v4 as string
    pub username: String,
    pub email: String, // Stored lowercased
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserModel {
    /// Creates a new user model with generated ID and timestamps.
    /// Username is trimmed and email normalized to lowercase so uniqueness
    /// checks compare canonical forms.
    pub fn new(username: &str, email: &str, password_hash: String) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            username: username.trim().to_string(),
            email: email.trim().to_lowercase(),
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}
