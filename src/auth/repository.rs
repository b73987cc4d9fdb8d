use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    /// Inserts a new user, enforcing username and email uniqueness in the
    /// same atomic step. Returns `Conflict` without mutating state when
    /// either is already taken.
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;

    /// Looks up a user by username or (lowercased) email.
    async fn find_by_identifier(&self, identifier: &str)
        -> Result<Option<UserModel>, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
///
/// Data is stored in memory and lost when the application restarts.
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, UserModel>>, // keyed by user id
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of users in the repository
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, username = %user.username, "Creating user in memory");

        let mut users = self.users.lock().unwrap();

        // Uniqueness check and insert happen under the same lock
        let taken = users
            .values()
            .any(|u| u.username == user.username || u.email == user.email);
        if taken {
            warn!(username = %user.username, "Username or email already in use");
            return Err(AppError::Conflict(
                "Email or username already in use".to_string(),
            ));
        }
        users.insert(user.id.clone(), user.clone());

        debug!(user_id = %user.id, "User created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserModel>, AppError> {
        debug!("Looking up user by identifier in memory");

        let email_form = identifier.trim().to_lowercase();
        let users = self.users.lock().unwrap();
        let user = users
            .values()
            .find(|u| u.username == identifier || u.email == email_form)
            .cloned();

        match &user {
            Some(u) => debug!(user_id = %u.id, "User found in memory"),
            None => debug!("User not found in memory"),
        }

        Ok(user)
    }
}

/// PostgreSQL implementation of user repository
///
/// Uniqueness is enforced by unique constraints on `username` and `email`;
/// a constraint violation on insert maps to `Conflict`.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        // 23505 is the Postgres unique_violation code
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, username = %user.username, "Creating user in database");

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!(username = %user.username, "Username or email already in use");
                AppError::Conflict("Email or username already in use".to_string())
            } else {
                warn!(error = %e, "Failed to create user in database");
                AppError::Database(e.to_string())
            }
        })?;

        debug!(user_id = %user.id, "User created successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserModel>, AppError> {
        debug!("Looking up user by identifier in database");

        let email_form = identifier.trim().to_lowercase();
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, created_at, updated_at \
             FROM users WHERE username = $1 OR email = $2",
        )
        .bind(identifier)
        .bind(&email_form)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to look up user in database");
            AppError::Database(e.to_string())
        })?;

        let user = row.map(|row| UserModel {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        });

        match &user {
            Some(u) => debug!(user_id = %u.id, "User found in database"),
            None => debug!("User not found in database"),
        }

        Ok(user)
    }
}
