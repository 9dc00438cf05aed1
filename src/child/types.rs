use serde::{Deserialize, Serialize};

use super::models::ChildModel;

/// Request payload for creating or replacing a child profile
#[derive(Debug, Clone, Deserialize)]
pub struct ChildRequest {
    pub name: String,
    pub age: i64,
    pub avatar: String,
    pub age_group: String, // Parsed during validation so bad values get a field error
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChildListResponse {
    pub success: bool,
    pub children: Vec<ChildModel>,
}

/// Response for child creation and update
#[derive(Debug, Serialize, Deserialize)]
pub struct ChildResponse {
    pub success: bool,
    pub message: String,
    pub child: ChildModel,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteChildResponse {
    pub success: bool,
    pub message: String,
}
