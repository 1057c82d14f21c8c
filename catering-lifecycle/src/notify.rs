use catering_core::{Booking, Notification, NotificationDetails, NotificationDispatcher, NotificationKind};
use catering_shared::mask_email;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Skipped { reason: String },
    Failed { error: String },
}

/// What happened to the email attached to one lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationOutcome {
    pub booking_id: Uuid,
    pub kind: NotificationKind,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

impl NotificationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, DeliveryStatus::Failed { .. })
    }

    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

/// Send the email for a committed transition. Never fails: delivery problems
/// are logged and returned as data so the transition stands.
pub async fn deliver(
    dispatcher: &dyn NotificationDispatcher,
    booking: &Booking,
    details: NotificationDetails,
) -> NotificationOutcome {
    let kind = details.kind();

    let Some(recipient) = booking.recipient() else {
        warn!(booking_id = %booking.id, kind = %kind, "No recipient email on file, skipping notification");
        return NotificationOutcome {
            booking_id: booking.id,
            kind,
            status: DeliveryStatus::Skipped {
                reason: "no recipient email on file".to_string(),
            },
        };
    };

    let to = mask_email(&recipient.email);
    let notification = Notification {
        booking_id: booking.id,
        recipient,
        details,
    };

    let status = match dispatcher.send(&notification).await {
        Ok(()) => {
            info!(booking_id = %booking.id, kind = %kind, to = %to, "Notification sent");
            DeliveryStatus::Sent
        }
        Err(e) => {
            error!(booking_id = %booking.id, kind = %kind, to = %to, error = %e, "Notification failed");
            DeliveryStatus::Failed {
                error: e.to_string(),
            }
        }
    };

    NotificationOutcome {
        booking_id: booking.id,
        kind,
        status,
    }
}
