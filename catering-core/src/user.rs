use catering_shared::pii::Masked;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::ParseStatusError;

/// Account status. A missing value in the store means `Active`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Blocked,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Blocked => "blocked",
            UserStatus::Inactive => "inactive",
        }
    }

    /// Reads a nullable status column.
    pub fn from_column(value: Option<&str>) -> Result<Self, ParseStatusError> {
        value.map_or(Ok(UserStatus::Active), |s| s.parse())
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "blocked" => Ok(UserStatus::Blocked),
            "inactive" => Ok(UserStatus::Inactive),
            other => Err(ParseStatusError {
                kind: "user_status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Masked<String>,
    pub status: UserStatus,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email: Masked::new(email),
            status: UserStatus::Active,
            avatar_url: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.status == UserStatus::Blocked
    }
}

/// A user plus the stored password hash, handed to the external login flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserCredentials {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: Masked<String>,
}
