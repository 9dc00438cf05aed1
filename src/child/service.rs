use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::{AgeGroup, ChildModel, ChildProfile},
    repository::ChildRepository,
    types::ChildRequest,
};
use crate::shared::AppError;
use crate::validation::{char_len_between, Validator};

const CHILD_NOT_FOUND: &str = "Child not found";

/// Service for child profile business logic, always on behalf of one owner
pub struct ChildService {
    repository: Arc<dyn ChildRepository + Send + Sync>,
}

impl ChildService {
    pub fn new(repository: Arc<dyn ChildRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn list_children(&self, owner_id: i64) -> Result<Vec<ChildModel>, AppError> {
        self.repository.list_children(owner_id).await
    }

    #[instrument(skip(self, request))]
    pub async fn create_child(
        &self,
        owner_id: i64,
        request: ChildRequest,
    ) -> Result<ChildModel, AppError> {
        let profile = validate_profile(request)?;
        let child = self.repository.create_child(owner_id, &profile).await?;

        info!(child_id = child.id, "New child added");
        Ok(child)
    }

    #[instrument(skip(self, request))]
    pub async fn update_child(
        &self,
        owner_id: i64,
        child_id: i64,
        request: ChildRequest,
    ) -> Result<ChildModel, AppError> {
        let profile = validate_profile(request)?;

        match self
            .repository
            .update_child(owner_id, child_id, &profile)
            .await?
        {
            Some(child) => {
                info!("Child updated");
                Ok(child)
            }
            None => {
                warn!("Child not found or not owned by caller");
                Err(AppError::NotFound(CHILD_NOT_FOUND.to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_child(&self, owner_id: i64, child_id: i64) -> Result<(), AppError> {
        if self.repository.delete_child(owner_id, child_id).await? {
            info!("Child deleted");
            Ok(())
        } else {
            warn!("Child not found or not owned by caller");
            Err(AppError::NotFound(CHILD_NOT_FOUND.to_string()))
        }
    }
}

/// Trims and checks every field, reporting all violations together
fn validate_profile(request: ChildRequest) -> Result<ChildProfile, AppError> {
    let name = request.name.trim().to_string();
    let avatar = request.avatar.trim().to_string();
    let age_group = request.age_group.trim().parse::<AgeGroup>().ok();

    let mut validator = Validator::new();
    validator
        .check(
            char_len_between(&name, 2, 100),
            "name",
            "Name must be between 2 and 100 characters",
        )
        .check(
            (1..=18).contains(&request.age),
            "age",
            "Age must be between 1 and 18",
        )
        .check(
            char_len_between(&avatar, 1, 10),
            "avatar",
            "Avatar must be 1-10 characters",
        )
        .check(
            age_group.is_some(),
            "age_group",
            &format!("Age group must be {}", AgeGroup::describe_all()),
        );
    validator.finish()?;

    Ok(ChildProfile {
        name,
        age: request.age,
        avatar,
        // Present once the validator has passed
        age_group: age_group.ok_or(AppError::Internal)?,
    })
}
