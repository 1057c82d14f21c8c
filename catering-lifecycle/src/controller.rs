use std::sync::Arc;

use catering_core::{
    payment_deadline_for, Booking, BookingRepository, BookingStatus, BookingUpdate, Clock,
    ExpectedState, NotificationDetails, NotificationDispatcher, PaymentStatus, StoreError,
    UpdateOutcome,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::notify::{deliver, NotificationOutcome};

const MONEY_SCALE: u32 = 2;
const MONEY_LIMIT: i64 = 10_000_000_000;

/// A committed transition plus the fate of its email.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionResult {
    pub booking: Booking,
    pub notification: NotificationOutcome,
}

/// Extra charge requested by staff. The caller computes `new_total`; it is
/// stored as given.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtraCharge {
    pub description: String,
    pub amount: Decimal,
    pub new_total: Decimal,
}

/// Manages booking lifecycle and state transitions
pub struct LifecycleController {
    bookings: Arc<dyn BookingRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl LifecycleController {
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

    pub async fn list_bookings(&self) -> Result<Vec<Booking>, LifecycleError> {
        Ok(self.bookings.list().await?)
    }

    pub async fn get_booking(&self, id: Uuid) -> Result<Booking, LifecycleError> {
        self.bookings
            .find(id)
            .await?
            .ok_or(LifecycleError::NotFound(id))
    }

    /// Entry point for the status dropdown in the admin UI.
    pub async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        rejection_reason: Option<&str>,
    ) -> Result<TransitionResult, LifecycleError> {
        match status {
            BookingStatus::Approved => self.approve(id).await,
            BookingStatus::Rejected => self.reject(id, rejection_reason.unwrap_or_default()).await,
            BookingStatus::Cancelled => {
                let booking = self.get_booking(id).await?;
                Err(LifecycleError::invalid(
                    booking.booking_status,
                    status,
                    "cancellation only happens when the payment deadline lapses",
                ))
            }
            BookingStatus::Pending => {
                let booking = self.get_booking(id).await?;
                Err(LifecycleError::invalid(
                    booking.booking_status,
                    status,
                    "bookings never return to pending",
                ))
            }
        }
    }

    /// Transition: Pending → Approved. Starts the payment window.
    pub async fn approve(&self, id: Uuid) -> Result<TransitionResult, LifecycleError> {
        let booking = self.get_booking(id).await?;
        ensure_transition(&booking, BookingStatus::Approved)?;

        let now = self.clock.now();
        let deadline = payment_deadline_for(now);
        let update = BookingUpdate::at(now)
            .status(BookingStatus::Approved)
            .approved_at(now)
            .payment_deadline(deadline);

        let booking = self
            .commit(id, &update, ExpectedState::status(BookingStatus::Pending), "approved")
            .await?;
        info!(booking_id = %id, payment_deadline = %deadline, "Booking approved");

        let notification = deliver(
            self.notifier.as_ref(),
            &booking,
            NotificationDetails::Approval {
                total_price: booking.total_price,
                event_date: booking.event_date,
                payment_deadline: deadline,
            },
        )
        .await;

        Ok(TransitionResult {
            booking,
            notification,
        })
    }

    /// Transition: Pending → Rejected. A reason is mandatory.
    pub async fn reject(&self, id: Uuid, reason: &str) -> Result<TransitionResult, LifecycleError> {
        let booking = self.get_booking(id).await?;
        ensure_transition(&booking, BookingStatus::Rejected)?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LifecycleError::invalid(
                booking.booking_status,
                BookingStatus::Rejected,
                "a rejection reason is required",
            ));
        }

        let update = BookingUpdate::at(self.clock.now())
            .status(BookingStatus::Rejected)
            .rejection_reason(reason);

        let booking = self
            .commit(id, &update, ExpectedState::status(BookingStatus::Pending), "rejected")
            .await?;
        info!(booking_id = %id, "Booking rejected");

        let notification = deliver(
            self.notifier.as_ref(),
            &booking,
            NotificationDetails::Rejection {
                reason: reason.to_string(),
            },
        )
        .await;

        Ok(TransitionResult {
            booking,
            notification,
        })
    }

    /// Payment axis: Unpaid → Paid, only while Approved.
    ///
    /// The write is guarded on `approved` + `unpaid`, so if the expiry sweep
    /// cancels the booking first this fails instead of reviving it.
    pub async fn mark_payment_paid(&self, id: Uuid) -> Result<TransitionResult, LifecycleError> {
        let booking = self.get_booking(id).await?;

        if booking.booking_status != BookingStatus::Approved {
            return Err(LifecycleError::InvalidTransition {
                from: booking.booking_status.to_string(),
                to: PaymentStatus::Paid.to_string(),
                detail: "only approved bookings can be paid".to_string(),
            });
        }
        if booking.payment_status == PaymentStatus::Paid {
            return Err(LifecycleError::InvalidTransition {
                from: PaymentStatus::Paid.to_string(),
                to: PaymentStatus::Paid.to_string(),
                detail: "payment already recorded".to_string(),
            });
        }

        let update = BookingUpdate::at(self.clock.now()).payment(PaymentStatus::Paid);
        let booking = self
            .commit(id, &update, ExpectedState::approved_unpaid(), "paid")
            .await?;
        info!(booking_id = %id, total_price = %booking.total_price, "Payment recorded");

        let notification = deliver(
            self.notifier.as_ref(),
            &booking,
            NotificationDetails::PaymentReceived {
                total_price: booking.total_price,
                event_date: booking.event_date,
            },
        )
        .await;

        Ok(TransitionResult {
            booking,
            notification,
        })
    }

    /// Replace `total_price` with the caller's `new_total`. Only pending and
    /// approved bookings take charges.
    pub async fn add_extra_charge(
        &self,
        id: Uuid,
        charge: &ExtraCharge,
    ) -> Result<Booking, LifecycleError> {
        if charge.description.trim().is_empty() {
            return Err(LifecycleError::Validation(
                "charge description is required".to_string(),
            ));
        }
        if charge.amount <= Decimal::ZERO {
            return Err(LifecycleError::Validation(format!(
                "charge amount must be positive, got {}",
                charge.amount
            )));
        }
        if charge.new_total.is_sign_negative() && !charge.new_total.is_zero() {
            return Err(LifecycleError::Validation(format!(
                "new total must not be negative, got {}",
                charge.new_total
            )));
        }
        check_money("charge amount", charge.amount)?;
        check_money("new total", charge.new_total)?;

        let booking = self.get_booking(id).await?;
        if !is_chargeable(booking.booking_status) {
            return Err(LifecycleError::NotChargeable(booking.booking_status));
        }

        let expected_total = booking.total_price.checked_add(charge.amount).ok_or_else(|| {
            LifecycleError::Validation(format!(
                "charge amount {} overflows the booking total",
                charge.amount
            ))
        })?;
        if expected_total != charge.new_total {
            warn!(
                booking_id = %id,
                expected = %expected_total,
                new_total = %charge.new_total,
                "Caller-supplied total differs from current total plus charge"
            );
        }

        let update = BookingUpdate::at(self.clock.now()).total_price(charge.new_total);
        let outcome = self
            .bookings
            .update(id, &update, Some(ExpectedState::status(booking.booking_status)))
            .await?;

        match outcome {
            UpdateOutcome::Updated(updated) => {
                info!(
                    booking_id = %id,
                    description = %charge.description,
                    amount = %charge.amount,
                    new_total = %updated.total_price,
                    "Extra charge added"
                );
                Ok(updated)
            }
            UpdateOutcome::NotFound => Err(LifecycleError::NotFound(id)),
            UpdateOutcome::Conflict(current) => {
                Err(LifecycleError::NotChargeable(current.booking_status))
            }
        }
    }

    /// Re-arm the payment window of an approved, unpaid booking to
    /// `now + 20h`. `approved_at` is left alone.
    pub async fn set_payment_deadline(&self, id: Uuid) -> Result<Booking, LifecycleError> {
        let booking = self.get_booking(id).await?;
        if !ExpectedState::approved_unpaid().matches(&booking) {
            return Err(LifecycleError::InvalidTransition {
                from: format!("{}/{}", booking.booking_status, booking.payment_status),
                to: "payment_deadline".to_string(),
                detail: "a deadline applies only to approved, unpaid bookings".to_string(),
            });
        }

        let now = self.clock.now();
        let deadline = payment_deadline_for(now);
        let update = BookingUpdate::at(now).payment_deadline(deadline);
        let booking = self
            .commit(id, &update, ExpectedState::approved_unpaid(), "payment_deadline")
            .await?;
        info!(booking_id = %id, payment_deadline = %deadline, "Payment deadline set");
        Ok(booking)
    }

    async fn commit(
        &self,
        id: Uuid,
        update: &BookingUpdate,
        expected: ExpectedState,
        target: &str,
    ) -> Result<Booking, LifecycleError> {
        match self.bookings.update(id, update, Some(expected)).await? {
            UpdateOutcome::Updated(booking) => Ok(booking),
            UpdateOutcome::NotFound => Err(LifecycleError::NotFound(id)),
            UpdateOutcome::Conflict(current) => {
                warn!(
                    booking_id = %id,
                    status = %current.booking_status,
                    payment_status = %current.payment_status,
                    to = target,
                    "Booking changed before the update landed"
                );
                Err(LifecycleError::InvalidTransition {
                    from: current.booking_status.to_string(),
                    to: target.to_string(),
                    detail: "booking was modified concurrently".to_string(),
                })
            }
        }
    }
}

fn ensure_transition(booking: &Booking, next: BookingStatus) -> Result<(), LifecycleError> {
    if booking.booking_status.can_transition_to(next) {
        Ok(())
    } else {
        Err(LifecycleError::invalid(
            booking.booking_status,
            next,
            "not allowed by the booking lifecycle",
        ))
    }
}

/// Amounts must fit `NUMERIC(12,2)`: at most two decimal places and below 10^10.
fn check_money(label: &str, value: Decimal) -> Result<(), LifecycleError> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(LifecycleError::Validation(format!(
            "{label} must have at most {MONEY_SCALE} decimal places, got {value}"
        )));
    }
    if value.abs() >= Decimal::from(MONEY_LIMIT) {
        return Err(LifecycleError::Validation(format!(
            "{label} must be below {MONEY_LIMIT}, got {value}"
        )));
    }
    Ok(())
}

fn is_chargeable(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Pending | BookingStatus::Approved)
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Booking not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid state transition from {from} to {to}: {detail}")]
    InvalidTransition {
        from: String,
        to: String,
        detail: String,
    },

    #[error("Extra charges are not allowed on {0} bookings")]
    NotChargeable(BookingStatus),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LifecycleError {
    fn invalid(from: BookingStatus, to: BookingStatus, detail: &str) -> Self {
        LifecycleError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
            detail: detail.to_string(),
        }
    }
}
