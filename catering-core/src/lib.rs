pub mod booking;
pub mod clock;
pub mod notification;
pub mod repository;
pub mod user;

pub use booking::{
    payment_deadline_for, Booking, BookingDetails, BookingStatus, BookingUpdate, ExpectedState,
    PaymentStatus, PAYMENT_WINDOW_HOURS,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use notification::{
    Notification, NotificationDetails, NotificationDispatcher, NotificationError,
    NotificationKind, Recipient,
};
pub use repository::{
    BookingRepository, StatusCount, StoreError, StoreProbe, UpdateOutcome, UserRepository,
};
pub use user::{User, UserCredentials, UserStatus};

/// Raised when a status string read from the store or a request does not name
/// a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} value: {value}")]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}
