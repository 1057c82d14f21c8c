use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::notification::Recipient;
use crate::ParseStatusError;

/// Hours a customer has to pay after approval. Business rule, not configuration.
pub const PAYMENT_WINDOW_HOURS: i64 = 20;

/// Deadline for a booking approved at `approved_at`.
pub fn payment_deadline_for(approved_at: DateTime<Utc>) -> DateTime<Utc> {
    approved_at + Duration::hours(PAYMENT_WINDOW_HOURS)
}

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::Rejected,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Edges of the state machine. `Cancelled` and `Rejected` are terminal.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Approved)
                | (BookingStatus::Pending, BookingStatus::Rejected)
                | (BookingStatus::Approved, BookingStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Rejected | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "approved" => Ok(BookingStatus::Approved),
            "rejected" => Ok(BookingStatus::Rejected),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(ParseStatusError {
                kind: "booking_status",
                value: other.to_string(),
            }),
        }
    }
}

/// Payment axis, orthogonal to `BookingStatus`. One-way: unpaid → paid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(ParseStatusError {
                kind: "payment_status",
                value: other.to_string(),
            }),
        }
    }
}

/// Event details captured by the booking form. Opaque to the lifecycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingDetails {
    pub contact_number: Option<String>,
    pub celebrant_name: Option<String>,
    pub celebrant_age: Option<i32>,
    pub guest_count: Option<i32>,
    pub food_package: Option<String>,
    pub event_type: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub event_theme: Option<String>,
    pub custom_theme: Option<String>,
    pub theme_suggestions: Option<String>,
    #[serde(default)]
    pub selected_menus: serde_json::Value,
}

/// A single catering engagement request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub avatar_url: Option<String>,
    pub full_name: String,
    #[serde(flatten)]
    pub details: BookingDetails,
    pub event_date: NaiveDate,
    pub total_price: Decimal,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub rejection_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub payment_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        user_id: Option<Uuid>,
        full_name: String,
        event_date: NaiveDate,
        total_price: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            user_email: None,
            avatar_url: None,
            full_name,
            details: BookingDetails::default(),
            event_date,
            total_price,
            booking_status: BookingStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            rejection_reason: None,
            cancellation_reason: None,
            approved_at: None,
            payment_deadline: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Approved, unpaid and past its deadline at `now`.
    pub fn is_expirable(&self, now: DateTime<Utc>) -> bool {
        self.booking_status == BookingStatus::Approved
            && self.payment_status != PaymentStatus::Paid
            && self.payment_deadline.is_some_and(|deadline| deadline < now)
    }

    /// Who receives lifecycle emails. `None` when the requesting user is gone
    /// or never had an email on file.
    pub fn recipient(&self) -> Option<Recipient> {
        self.user_email
            .as_deref()
            .filter(|email| !email.trim().is_empty())
            .map(|email| Recipient {
                email: email.to_string(),
                name: self.full_name.clone(),
            })
    }

    /// Apply a partial update in place. Stores without native partial updates
    /// (the in-memory store) go through here.
    pub fn apply(&mut self, update: &BookingUpdate) {
        if let Some(status) = update.booking_status {
            self.booking_status = status;
        }
        if let Some(payment) = update.payment_status {
            self.payment_status = payment;
        }
        if let Some(reason) = &update.rejection_reason {
            self.rejection_reason = Some(reason.clone());
        }
        if let Some(reason) = &update.cancellation_reason {
            self.cancellation_reason = Some(reason.clone());
        }
        if let Some(approved_at) = update.approved_at {
            self.approved_at = Some(approved_at);
        }
        if let Some(deadline) = update.payment_deadline {
            self.payment_deadline = Some(deadline);
        }
        if let Some(total) = update.total_price {
            self.total_price = total;
        }
        self.updated_at = update.updated_at;
    }
}

/// Partial update of a booking row. Unset fields are left untouched;
/// `updated_at` is always stamped.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingUpdate {
    pub booking_status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub rejection_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub payment_deadline: Option<DateTime<Utc>>,
    pub total_price: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl BookingUpdate {
    pub fn at(updated_at: DateTime<Utc>) -> Self {
        Self {
            booking_status: None,
            payment_status: None,
            rejection_reason: None,
            cancellation_reason: None,
            approved_at: None,
            payment_deadline: None,
            total_price: None,
            updated_at,
        }
    }

    pub fn status(mut self, status: BookingStatus) -> Self {
        self.booking_status = Some(status);
        self
    }

    pub fn payment(mut self, payment: PaymentStatus) -> Self {
        self.payment_status = Some(payment);
        self
    }

    pub fn rejection_reason(mut self, reason: impl Into<String>) -> Self {
        self.rejection_reason = Some(reason.into());
        self
    }

    pub fn cancellation_reason(mut self, reason: impl Into<String>) -> Self {
        self.cancellation_reason = Some(reason.into());
        self
    }

    pub fn approved_at(mut self, approved_at: DateTime<Utc>) -> Self {
        self.approved_at = Some(approved_at);
        self
    }

    pub fn payment_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.payment_deadline = Some(deadline);
        self
    }

    pub fn total_price(mut self, total: Decimal) -> Self {
        self.total_price = Some(total);
        self
    }
}

/// Compare-and-swap guard evaluated in the same statement as the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedState {
    pub booking_status: BookingStatus,
    pub payment_status: Option<PaymentStatus>,
}

impl ExpectedState {
    pub fn status(booking_status: BookingStatus) -> Self {
        Self {
            booking_status,
            payment_status: None,
        }
    }

    pub fn approved_unpaid() -> Self {
        Self {
            booking_status: BookingStatus::Approved,
            payment_status: Some(PaymentStatus::Unpaid),
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        booking.booking_status == self.booking_status
            && self
                .payment_status
                .map_or(true, |payment| booking.payment_status == payment)
    }
}
