pub mod analytics;
pub mod controller;
pub mod expiry;
pub mod notify;
pub mod stats;

pub use analytics::DashboardAnalytics;
pub use controller::{ExtraCharge, LifecycleController, LifecycleError, TransitionResult};
pub use expiry::{ExpirySweeper, SweepReport, CANCELLATION_REASON};
pub use notify::{DeliveryStatus, NotificationOutcome};
pub use stats::{BookingStats, UserStats};
