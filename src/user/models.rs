use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const DEFAULT_ROLE: &str = "parent";

/// Database model for the users table. Deliberately not `Serialize`:
/// the password hash must never reach a response body.
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: i64,
    pub name: String,
    pub email: String, // Normalized: trimmed and lower-cased
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Fields supplied at registration; everything else is defaulted by the store
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl UserModel {
    /// Builds the stored form of a freshly registered user
    pub fn from_new(id: i64, user: &NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: DEFAULT_ROLE.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }
}
