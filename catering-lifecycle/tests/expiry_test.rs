mod common;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use catering_core::{
    Booking, BookingRepository, BookingStatus, BookingUpdate, Clock, ExpectedState, NotificationKind,
    PaymentStatus, StatusCount, StoreError, UpdateOutcome,
};
use catering_lifecycle::{LifecycleError, CANCELLATION_REASON};
use catering_store::InMemoryStore;
use chrono::{DateTime, Duration, Utc};
use common::{t0, Harness};
use uuid::Uuid;

/// Delegates to the in-memory store, but serves a fixed expirable list and can
/// fail updates for chosen rows.
struct ScriptedBookings {
    inner: Arc<InMemoryStore>,
    snapshot: Option<Vec<Booking>>,
    failing: HashSet<Uuid>,
}

#[async_trait]
impl BookingRepository for ScriptedBookings {
    async fn find(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        self.inner.find(id).await
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        self.inner.list().await
    }

    async fn update(
        &self,
        id: Uuid,
        update: &BookingUpdate,
        expected: Option<ExpectedState>,
    ) -> Result<UpdateOutcome, StoreError> {
        if self.failing.contains(&id) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.update(id, update, expected).await
    }

    async fn find_expirable(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, StoreError> {
        match &self.snapshot {
            Some(rows) => Ok(rows.clone()),
            None => self.inner.find_expirable(now).await,
        }
    }

    async fn status_counts(&self) -> Result<Vec<StatusCount>, StoreError> {
        self.inner.status_counts().await
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, StoreError> {
        self.inner.count_for_user(user_id).await
    }
}

#[tokio::test]
async fn test_deadline_boundary() {
    let h = Harness::new();
    let id = h.approved_booking("5000").await;

    h.clock.set(t0() + Duration::hours(19) + Duration::minutes(59));
    assert_eq!(h.sweeper.sweep().await.unwrap().cancelled_count(), 0);

    // Deadline must be strictly in the past.
    h.clock.set(t0() + Duration::hours(20));
    assert_eq!(h.sweeper.sweep().await.unwrap().cancelled_count(), 0);

    h.clock.set(t0() + Duration::hours(20) + Duration::seconds(1));
    let report = h.sweeper.sweep().await.unwrap();
    assert_eq!(report.cancelled, vec![id]);

    let booking = h.booking(id).await;
    assert_eq!(booking.booking_status, BookingStatus::Cancelled);
    assert_eq!(booking.cancellation_reason.as_deref(), Some(CANCELLATION_REASON));
    assert_eq!(booking.updated_at, t0() + Duration::hours(20) + Duration::seconds(1));
    assert_eq!(
        h.mailer.kinds(),
        vec![NotificationKind::Approval, NotificationKind::Cancellation]
    );
}

#[tokio::test]
async fn test_sweep_is_idempotent() {
    let h = Harness::new();
    let a = h.approved_booking("5000").await;
    let b = h.approved_booking("6000").await;

    h.clock.advance(Duration::hours(21));
    let first = h.sweeper.sweep().await.unwrap();
    let mut cancelled = first.cancelled.clone();
    cancelled.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(cancelled, expected);
    assert_eq!(first.notifications.len(), 2);

    let second = h.sweeper.sweep().await.unwrap();
    assert!(second.cancelled.is_empty());
    assert!(second.notifications.is_empty());

    let cancellations = h
        .mailer
        .kinds()
        .into_iter()
        .filter(|k| *k == NotificationKind::Cancellation)
        .count();
    assert_eq!(cancellations, 2);
}

#[tokio::test]
async fn test_paid_and_pending_bookings_survive() {
    let h = Harness::new();
    let paid = h.approved_booking("5000").await;
    h.controller.mark_payment_paid(paid).await.unwrap();
    let pending = h.pending_booking("5000").await;

    h.clock.advance(Duration::days(3));
    let report = h.sweeper.sweep().await.unwrap();
    assert!(report.cancelled.is_empty());

    let paid = h.booking(paid).await;
    assert_eq!(paid.booking_status, BookingStatus::Approved);
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(h.booking(pending).await.booking_status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_payment_recorded_mid_sweep_is_skipped() {
    let store = Arc::new(InMemoryStore::new());
    let setup = Harness::with_bookings(store.clone(), store.clone());
    let id = setup.approved_booking("5000").await;
    setup.clock.advance(Duration::hours(21));

    // The sweep saw the booking as expirable, then payment landed first.
    let snapshot = store.find_expirable(setup.clock.now()).await.unwrap();
    assert_eq!(snapshot.len(), 1);
    setup.controller.mark_payment_paid(id).await.unwrap();

    let scripted = Arc::new(ScriptedBookings {
        inner: store.clone(),
        snapshot: Some(snapshot),
        failing: HashSet::new(),
    });
    let h = Harness::with_bookings(store.clone(), scripted);
    h.clock.advance(Duration::hours(21));

    let report = h.sweeper.sweep().await.unwrap();
    assert!(report.cancelled.is_empty());
    assert_eq!(report.skipped, vec![id]);
    assert!(report.notifications.is_empty());

    let booking = store.find(id).await.unwrap().unwrap();
    assert_eq!(booking.booking_status, BookingStatus::Approved);
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    assert_eq!(booking.cancellation_reason, None);
}

#[tokio::test]
async fn test_row_failure_does_not_stop_sweep() {
    let store = Arc::new(InMemoryStore::new());
    let setup = Harness::with_bookings(store.clone(), store.clone());
    let broken = setup.approved_booking("5000").await;
    let healthy = setup.approved_booking("6000").await;

    let scripted = Arc::new(ScriptedBookings {
        inner: store.clone(),
        snapshot: None,
        failing: HashSet::from([broken]),
    });
    let h = Harness::with_bookings(store.clone(), scripted);
    h.clock.advance(Duration::hours(21));

    let report = h.sweeper.sweep().await.unwrap();
    assert_eq!(report.cancelled, vec![healthy]);
    assert_eq!(report.store_failures.len(), 1);
    assert_eq!(report.store_failures[0].booking_id, broken);

    assert_eq!(
        store.find(broken).await.unwrap().unwrap().booking_status,
        BookingStatus::Approved
    );
    assert_eq!(
        store.find(healthy).await.unwrap().unwrap().booking_status,
        BookingStatus::Cancelled
    );
}

#[tokio::test]
async fn test_email_failure_does_not_undo_cancellation() {
    let h = Harness::new();
    let id = h.approved_booking("5000").await;
    h.mailer.set_failing(true);

    h.clock.advance(Duration::hours(21));
    let report = h.sweeper.sweep().await.unwrap();
    assert_eq!(report.cancelled, vec![id]);
    assert_eq!(report.failed_notifications().len(), 1);
    assert_eq!(h.booking(id).await.booking_status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_store_outage_fails_sweep() {
    let h = Harness::new();
    h.approved_booking("5000").await;
    h.store.set_offline(true);

    h.clock.advance(Duration::hours(21));
    let err = h.sweeper.sweep().await.unwrap_err();
    assert!(matches!(err, LifecycleError::Store(StoreError::Unavailable(_))));
}
