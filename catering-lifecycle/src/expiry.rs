use std::sync::Arc;

use catering_core::{
    Booking, BookingRepository, BookingStatus, BookingUpdate, Clock, ExpectedState,
    NotificationDetails, NotificationDispatcher, UpdateOutcome,
};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::controller::LifecycleError;
use crate::notify::{deliver, NotificationOutcome};

pub const CANCELLATION_REASON: &str = "Payment not received within 20-hour deadline";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub booking_id: Uuid,
    pub error: String,
}

/// Per-row result of one sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub swept_at: DateTime<Utc>,
    pub cancelled: Vec<Uuid>,
    /// Matched but changed before the cancel landed (paid in the meantime).
    pub skipped: Vec<Uuid>,
    pub store_failures: Vec<RowFailure>,
    pub notifications: Vec<NotificationOutcome>,
}

impl SweepReport {
    pub fn cancelled_count(&self) -> usize {
        self.cancelled.len()
    }

    pub fn failed_notifications(&self) -> Vec<&NotificationOutcome> {
        self.notifications.iter().filter(|n| n.is_failure()).collect()
    }
}

/// Cancels approved bookings whose payment window has lapsed.
pub struct ExpirySweeper {
    bookings: Arc<dyn BookingRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl ExpirySweeper {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        notifier: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            notifier,
            clock,
        }
    }

    /// Run one sweep at the clock's current time.
    ///
    /// Only the initial lookup can fail the sweep. After that every row is
    /// handled on its own: a failed update or email is recorded and the
    /// remaining rows are still processed.
    pub async fn sweep(&self) -> Result<SweepReport, LifecycleError> {
        let now = self.clock.now();
        let candidates = self.bookings.find_expirable(now).await?;

        let mut report = SweepReport {
            swept_at: now,
            cancelled: Vec::new(),
            skipped: Vec::new(),
            store_failures: Vec::new(),
            notifications: Vec::new(),
        };

        if candidates.is_empty() {
            info!("No expired bookings found");
            return Ok(report);
        }

        let update = BookingUpdate::at(now)
            .status(BookingStatus::Cancelled)
            .cancellation_reason(CANCELLATION_REASON);

        let mut cancelled: Vec<Booking> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let id = candidate.id;
            match self
                .bookings
                .update(id, &update, Some(ExpectedState::approved_unpaid()))
                .await
            {
                Ok(UpdateOutcome::Updated(booking)) => {
                    info!(booking_id = %id, deadline = ?booking.payment_deadline, "Booking cancelled for non-payment");
                    report.cancelled.push(id);
                    cancelled.push(booking);
                }
                Ok(UpdateOutcome::Conflict(current)) => {
                    warn!(
                        booking_id = %id,
                        status = %current.booking_status,
                        payment_status = %current.payment_status,
                        "Booking changed during sweep, leaving it alone"
                    );
                    report.skipped.push(id);
                }
                Ok(UpdateOutcome::NotFound) => {
                    warn!(booking_id = %id, "Booking vanished during sweep");
                    report.skipped.push(id);
                }
                Err(e) => {
                    error!(booking_id = %id, error = %e, "Failed to cancel expired booking");
                    report.store_failures.push(RowFailure {
                        booking_id: id,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.notifications = join_all(cancelled.iter().map(|booking| {
            deliver(
                self.notifier.as_ref(),
                booking,
                NotificationDetails::Cancellation {
                    reason: CANCELLATION_REASON.to_string(),
                },
            )
        }))
        .await;

        info!(
            cancelled = report.cancelled.len(),
            skipped = report.skipped.len(),
            store_failures = report.store_failures.len(),
            failed_notifications = report.failed_notifications().len(),
            "Expiry sweep finished"
        );

        Ok(report)
    }
}
