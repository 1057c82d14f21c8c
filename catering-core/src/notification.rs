use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Approval,
    Rejection,
    PaymentReceived,
    Cancellation,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Approval => "approval",
            NotificationKind::Rejection => "rejection",
            NotificationKind::PaymentReceived => "payment_received",
            NotificationKind::Cancellation => "cancellation",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

/// Kind-specific fields of a lifecycle email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationDetails {
    Approval {
        total_price: Decimal,
        event_date: NaiveDate,
        payment_deadline: DateTime<Utc>,
    },
    Rejection {
        reason: String,
    },
    PaymentReceived {
        total_price: Decimal,
        event_date: NaiveDate,
    },
    Cancellation {
        reason: String,
    },
}

impl NotificationDetails {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationDetails::Approval { .. } => NotificationKind::Approval,
            NotificationDetails::Rejection { .. } => NotificationKind::Rejection,
            NotificationDetails::PaymentReceived { .. } => NotificationKind::PaymentReceived,
            NotificationDetails::Cancellation { .. } => NotificationKind::Cancellation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub booking_id: Uuid,
    pub recipient: Recipient,
    pub details: NotificationDetails,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        self.details.kind()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Email provider rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Email provider unreachable: {0}")]
    Transport(String),

    #[error("Notification misconfigured: {0}")]
    Configuration(String),
}

/// Delivery side of lifecycle emails. Implementations decide how a message is
/// rendered and sent; callers only decide whether to send one.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}
