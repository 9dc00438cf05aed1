use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{ChildModel, ChildProfile};
use crate::db::{db_error, DbConnection};
use crate::shared::AppError;

const CHILD_COLUMNS: &str = "id, user_id, name, age, avatar, age_group, created_at, updated_at";

/// Trait for child profile operations. Every method is scoped by the owner,
/// and a child owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait ChildRepository {
    /// Children of `owner_id`, newest first
    async fn list_children(&self, owner_id: i64) -> Result<Vec<ChildModel>, AppError>;
    async fn create_child(
        &self,
        owner_id: i64,
        profile: &ChildProfile,
    ) -> Result<ChildModel, AppError>;

    /// Ownership check and write happen as one operation; `None` when no
    /// child with that id belongs to `owner_id`
    async fn update_child(
        &self,
        owner_id: i64,
        child_id: i64,
        profile: &ChildProfile,
    ) -> Result<Option<ChildModel>, AppError>;

    /// Returns false when no child with that id belongs to `owner_id`
    async fn delete_child(&self, owner_id: i64, child_id: i64) -> Result<bool, AppError>;
}

/// In-memory implementation of ChildRepository for development and testing
pub struct InMemoryChildRepository {
    state: Mutex<InMemoryChildren>,
}

#[derive(Default)]
struct InMemoryChildren {
    next_id: i64,
    children: HashMap<i64, ChildModel>,
}

impl Default for InMemoryChildRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChildRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InMemoryChildren::default()),
        }
    }

    /// Returns the number of children across all owners
    pub fn child_count(&self) -> usize {
        self.state.lock().unwrap().children.len()
    }
}

#[async_trait]
impl ChildRepository for InMemoryChildRepository {
    #[instrument(skip(self))]
    async fn list_children(&self, owner_id: i64) -> Result<Vec<ChildModel>, AppError> {
        let state = self.state.lock().unwrap();
        let mut children: Vec<ChildModel> = state
            .children
            .values()
            .filter(|c| c.user_id == owner_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(children)
    }

    #[instrument(skip(self, profile))]
    async fn create_child(
        &self,
        owner_id: i64,
        profile: &ChildProfile,
    ) -> Result<ChildModel, AppError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;

        let now = Utc::now();
        let child = ChildModel {
            id: state.next_id,
            user_id: owner_id,
            name: profile.name.clone(),
            age: profile.age,
            avatar: profile.avatar.clone(),
            age_group: profile.age_group,
            created_at: now,
            updated_at: now,
        };
        state.children.insert(child.id, child.clone());

        debug!(child_id = child.id, "Child created in memory");
        Ok(child)
    }

    #[instrument(skip(self, profile))]
    async fn update_child(
        &self,
        owner_id: i64,
        child_id: i64,
        profile: &ChildProfile,
    ) -> Result<Option<ChildModel>, AppError> {
        let mut state = self.state.lock().unwrap();

        let child = match state.children.get_mut(&child_id) {
            Some(child) if child.user_id == owner_id => child,
            _ => {
                debug!("Child not found for owner in memory");
                return Ok(None);
            }
        };

        child.name = profile.name.clone();
        child.age = profile.age;
        child.avatar = profile.avatar.clone();
        child.age_group = profile.age_group;
        child.updated_at = Utc::now();

        Ok(Some(child.clone()))
    }

    #[instrument(skip(self))]
    async fn delete_child(&self, owner_id: i64, child_id: i64) -> Result<bool, AppError> {
        let mut state = self.state.lock().unwrap();

        let owned = state
            .children
            .get(&child_id)
            .is_some_and(|c| c.user_id == owner_id);
        if owned {
            state.children.remove(&child_id);
        }
        Ok(owned)
    }
}

/// SQLite implementation of the child repository
pub struct SqliteChildRepository {
    pool: SqlitePool,
}

impl SqliteChildRepository {
    pub fn new(db: &DbConnection) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl ChildRepository for SqliteChildRepository {
    #[instrument(skip(self))]
    async fn list_children(&self, owner_id: i64) -> Result<Vec<ChildModel>, AppError> {
        debug!("Listing children from database");

        sqlx::query_as::<_, ChildModel>(&format!(
            "SELECT {CHILD_COLUMNS} FROM children WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list children");
            db_error(e)
        })
    }

    #[instrument(skip(self, profile))]
    async fn create_child(
        &self,
        owner_id: i64,
        profile: &ChildProfile,
    ) -> Result<ChildModel, AppError> {
        debug!("Creating child in database");

        let now = Utc::now();
        let child = sqlx::query_as::<_, ChildModel>(&format!(
            "INSERT INTO children (user_id, name, age, avatar, age_group, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {CHILD_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(&profile.name)
        .bind(profile.age)
        .bind(&profile.avatar)
        .bind(profile.age_group.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create child");
            db_error(e)
        })?;

        debug!(child_id = child.id, "Child created in database");
        Ok(child)
    }

    #[instrument(skip(self, profile))]
    async fn update_child(
        &self,
        owner_id: i64,
        child_id: i64,
        profile: &ChildProfile,
    ) -> Result<Option<ChildModel>, AppError> {
        debug!("Updating child in database");

        sqlx::query_as::<_, ChildModel>(&format!(
            "UPDATE children SET name = ?, age = ?, avatar = ?, age_group = ?, updated_at = ? \
             WHERE id = ? AND user_id = ? RETURNING {CHILD_COLUMNS}"
        ))
        .bind(&profile.name)
        .bind(profile.age)
        .bind(&profile.avatar)
        .bind(profile.age_group.as_str())
        .bind(Utc::now())
        .bind(child_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to update child");
            db_error(e)
        })
    }

    #[instrument(skip(self))]
    async fn delete_child(&self, owner_id: i64, child_id: i64) -> Result<bool, AppError> {
        debug!("Deleting child from database");

        let result = sqlx::query("DELETE FROM children WHERE id = ? AND user_id = ?")
            .bind(child_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete child");
                db_error(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
