use serde::{Deserialize, Serialize};

/// JWT claims identifying the authenticated parent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub exp: i64, // Expiration timestamp (standard JWT claim)
    pub iat: i64, // Issued at timestamp (standard JWT claim)
}
