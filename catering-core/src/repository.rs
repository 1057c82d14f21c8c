use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::{Booking, BookingUpdate, ExpectedState};
use crate::user::{User, UserCredentials, UserStatus};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt row {id}: {message}")]
    Corrupt { id: String, message: String },
}

/// One `GROUP BY status` row. `status` is the raw column value, which may be
/// missing or outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: Option<String>,
    pub count: i64,
}

impl StatusCount {
    pub fn new(status: Option<&str>, count: i64) -> Self {
        Self {
            status: status.map(str::to_string),
            count,
        }
    }
}

/// Result of a guarded single-row update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(Booking),
    NotFound,
    /// The row exists but no longer matches the expected state; carries the
    /// row as it is now.
    Conflict(Booking),
}

/// Repository trait for booking data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    /// All bookings, most recently created first.
    async fn list(&self) -> Result<Vec<Booking>, StoreError>;

    /// Apply `update` in a single atomic statement. When `expected` is given
    /// the row is only written if it still matches.
    async fn update(
        &self,
        id: Uuid,
        update: &BookingUpdate,
        expected: Option<ExpectedState>,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Approved, unpaid bookings whose deadline is strictly before `now`.
    async fn find_expirable(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, StoreError>;

    async fn status_counts(&self) -> Result<Vec<StatusCount>, StoreError>;

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, StoreError>;
}

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users, newest first.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, StoreError>;

    async fn update_user_status(
        &self,
        id: Uuid,
        status: UserStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError>;

    async fn user_status_counts(&self) -> Result<Vec<StatusCount>, StoreError>;
}

/// Connectivity check used by the health endpoint.
#[async_trait]
pub trait StoreProbe: Send + Sync {
    /// Returns the store's notion of the current time.
    async fn ping(&self) -> Result<DateTime<Utc>, StoreError>;
}
