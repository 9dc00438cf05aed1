use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{NewUser, UserModel};
use crate::db::{db_error, DbConnection};
use crate::shared::AppError;

const EMAIL_EXISTS: &str = "Email already exists";

/// Trait for user (credential store) operations
#[async_trait]
pub trait UserRepository {
    /// Inserts a user; fails with `Conflict` if the email is already taken
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    /// Stamps the last-login time in a single conditional update
    async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), AppError>;
}

/// In-memory implementation of UserRepository for development and testing
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<i64, UserModel>>,
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

    /// Creates an in-memory repository with pre-populated users
    pub fn with_users(users: Vec<UserModel>) -> Self {
        Self {
            users: Mutex::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn get_user(&self, user_id: i64) -> Option<UserModel> {
        self.users.lock().unwrap().get(&user_id).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError> {
        debug!("Creating user in memory");

        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            warn!("Email already exists in memory");
            return Err(AppError::Conflict(EMAIL_EXISTS.to_string()));
        }

        let id = users.keys().max().copied().unwrap_or(0) + 1;
        let model = UserModel::from_new(id, user, Utc::now());
        users.insert(id, model.clone());

        debug!(user_id = id, "User created successfully in memory");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    #[instrument(skip(self))]
    async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&user_id) {
            Some(user) => {
                user.last_login = Some(at);
                Ok(())
            }
            None => Err(AppError::NotFound("User not found".to_string())),
        }
    }
}

/// SQLite implementation of the user repository
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(db: &DbConnection) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError> {
        debug!("Creating user in database");

        let now = Utc::now();
        let created = sqlx::query_as::<_, UserModel>(
            "INSERT INTO users (name, email, password_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, name, email, password_hash, role, is_active, created_at, updated_at, last_login",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation());
            if duplicate {
                warn!("Email already exists in database");
                AppError::Conflict(EMAIL_EXISTS.to_string())
            } else {
                warn!(error = %e, "Failed to create user in database");
                db_error(e)
            }
        })?;

        debug!(user_id = created.id, "User created successfully in database");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        debug!("Fetching user by email from database");

        sqlx::query_as::<_, UserModel>(
            "SELECT id, name, email, password_hash, role, is_active, created_at, updated_at, last_login \
             FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user from database");
            db_error(e)
        })
    }

    #[instrument(skip(self))]
    async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id, "Failed to record login");
                db_error(e)
            })?;

        if result.rows_affected() == 0 {
            warn!(user_id, "User not found when recording login");
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }
}
