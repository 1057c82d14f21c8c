#![allow(dead_code)]

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use catering_core::{
    Booking, BookingRepository, Clock, ManualClock, Notification, NotificationDispatcher,
    NotificationError, NotificationKind, User,
};
use catering_lifecycle::{ExpirySweeper, LifecycleController};
use catering_store::InMemoryStore;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Captures every notification; can be switched to fail.
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl RecordingDispatcher {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.sent().iter().map(|n| n.kind()).collect()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Rejected {
                status: 500,
                message: "provider down".to_string(),
            });
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub mailer: Arc<RecordingDispatcher>,
    pub controller: LifecycleController,
    pub sweeper: ExpirySweeper,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::with_bookings(store.clone(), store)
    }

    /// Sweeper and controller read through `bookings`; `store` is used for
    /// seeding and assertions.
    pub fn with_bookings(store: Arc<InMemoryStore>, bookings: Arc<dyn BookingRepository>) -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let mailer = Arc::new(RecordingDispatcher::default());

        let controller = LifecycleController::new(
            store.clone(),
            mailer.clone(),
            clock.clone() as Arc<dyn Clock>,
        );
        let sweeper = ExpirySweeper::new(bookings, mailer.clone(), clock.clone() as Arc<dyn Clock>);

        Self {
            store,
            clock,
            mailer,
            controller,
            sweeper,
        }
    }

    /// A pending booking owned by a user with an email on file.
    pub async fn pending_booking(&self, total: &str) -> Uuid {
        let user = User::new(
            "Maria Santos".to_string(),
            "maria@example.com".to_string(),
            self.clock.now(),
        );
        let user_id = user.id;
        self.store.insert_user(user, "hash").await;

        let booking = Booking::new(
            Some(user_id),
            "Maria Santos".to_string(),
            NaiveDate::from_ymd_opt(2025, 4, 12).unwrap(),
            dec(total),
            self.clock.now(),
        );
        let id = booking.id;
        self.store.insert_booking(booking).await;
        id
    }

    /// A pending booking with no user behind it.
    pub async fn anonymous_booking(&self) -> Uuid {
        let booking = Booking::new(
            None,
            "Walk-in".to_string(),
            NaiveDate::from_ymd_opt(2025, 4, 12).unwrap(),
            dec("5000"),
            self.clock.now(),
        );
        let id = booking.id;
        self.store.insert_booking(booking).await;
        id
    }

    pub async fn approved_booking(&self, total: &str) -> Uuid {
        let id = self.pending_booking(total).await;
        self.controller.approve(id).await.unwrap();
        id
    }

    pub async fn booking(&self, id: Uuid) -> Booking {
        self.store.find(id).await.unwrap().unwrap()
    }
}
