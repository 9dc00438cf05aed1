use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

/// Coarse age bucket a child profile is filed under
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString,
    IntoStaticStr,
)]
pub enum AgeGroup {
    #[serde(rename = "6-9")]
    #[strum(serialize = "6-9")]
    SixToNine,
    #[serde(rename = "10-13")]
    #[strum(serialize = "10-13")]
    TenToThirteen,
    #[serde(rename = "14-17")]
    #[strum(serialize = "14-17")]
    FourteenToSeventeen,
}

impl AgeGroup {
    /// "6-9, 10-13, or 14-17"
    pub fn describe_all() -> String {
        let labels: Vec<&'static str> = AgeGroup::iter().map(|g| g.as_str()).collect();
        match labels.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{}, or {}", rest.join(", "), last),
            _ => labels.join(""),
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl TryFrom<String> for AgeGroup {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Database model for the children table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ChildModel {
    pub id: i64,
    pub user_id: i64, // Owning parent; every query is scoped by it
    pub name: String,
    pub age: i64,
    pub avatar: String,
    #[sqlx(try_from = "String")]
    pub age_group: AgeGroup,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated profile fields, shared by create and update
#[derive(Debug, Clone, PartialEq)]
pub struct ChildProfile {
    pub name: String,
    pub age: i64,
    pub avatar: String,
    pub age_group: AgeGroup,
}
