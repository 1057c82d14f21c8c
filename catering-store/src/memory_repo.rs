use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use catering_core::{
    Booking, BookingRepository, BookingUpdate, ExpectedState, StatusCount, StoreError,
    StoreProbe, UpdateOutcome, User, UserCredentials, UserRepository, UserStatus,
};
use catering_shared::Masked;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

struct UserRecord {
    user: User,
    password_hash: String,
}

/// Process-local store with the same semantics as the Postgres repositories.
/// Bookings are joined with their user on every read, like the SQL view.
#[derive(Default)]
pub struct InMemoryStore {
    bookings: RwLock<HashMap<Uuid, Booking>>,
    users: RwLock<HashMap<Uuid, UserRecord>>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a booking. `user_email` and `avatar_url` on the
    /// input are ignored; they come from the users table.
    pub async fn insert_booking(&self, booking: Booking) {
        self.bookings.write().await.insert(booking.id, booking);
    }

    pub async fn insert_user(&self, user: User, password_hash: impl Into<String>) {
        self.users.write().await.insert(
            user.id,
            UserRecord {
                user,
                password_hash: password_hash.into(),
            },
        );
    }

    pub async fn remove_user(&self, id: Uuid) {
        self.users.write().await.remove(&id);
    }

    /// Make every call fail with `StoreError::Unavailable` until reset.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn joined(booking: &Booking, users: &HashMap<Uuid, UserRecord>) -> Booking {
        let mut booking = booking.clone();
        let user = booking.user_id.and_then(|id| users.get(&id)).map(|r| &r.user);
        booking.user_email = user.map(|u| u.email.expose().clone());
        booking.avatar_url = user.and_then(|u| u.avatar_url.clone());
        booking
    }

    async fn select<F>(&self, filter: F) -> Vec<Booking>
    where
        F: Fn(&Booking) -> bool,
    {
        let bookings = self.bookings.read().await;
        let users = self.users.read().await;
        bookings
            .values()
            .filter(|b| filter(b))
            .map(|b| Self::joined(b, &users))
            .collect()
    }
}

fn count_by<'a>(statuses: impl Iterator<Item = Option<&'a str>>) -> Vec<StatusCount> {
    let mut counts: HashMap<Option<&str>, i64> = HashMap::new();
    for status in statuses {
        *counts.entry(status).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(status, count)| StatusCount::new(status, count))
        .collect()
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        self.check_online()?;
        let bookings = self.bookings.read().await;
        let users = self.users.read().await;
        Ok(bookings.get(&id).map(|b| Self::joined(b, &users)))
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        self.check_online()?;
        let mut all = self.select(|_| true).await;
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update(
        &self,
        id: Uuid,
        update: &BookingUpdate,
        expected: Option<ExpectedState>,
    ) -> Result<UpdateOutcome, StoreError> {
        self.check_online()?;
        // Check and write under one write lock.
        let mut bookings = self.bookings.write().await;
        let users = self.users.read().await;

        let Some(booking) = bookings.get_mut(&id) else {
            return Ok(UpdateOutcome::NotFound);
        };
        if let Some(expected) = expected {
            if !expected.matches(booking) {
                return Ok(UpdateOutcome::Conflict(Self::joined(booking, &users)));
            }
        }
        booking.apply(update);
        Ok(UpdateOutcome::Updated(Self::joined(booking, &users)))
    }

    async fn find_expirable(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, StoreError> {
        self.check_online()?;
        let mut due = self.select(|b| b.is_expirable(now)).await;
        due.sort_by_key(|b| b.payment_deadline);
        Ok(due)
    }

    async fn status_counts(&self) -> Result<Vec<StatusCount>, StoreError> {
        self.check_online()?;
        let bookings = self.bookings.read().await;
        Ok(count_by(
            bookings.values().map(|b| Some(b.booking_status.as_str())),
        ))
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, StoreError> {
        self.check_online()?;
        let bookings = self.bookings.read().await;
        Ok(bookings
            .values()
            .filter(|b| b.user_id == Some(user_id))
            .count() as i64)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.check_online()?;
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().map(|r| r.user.clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        self.check_online()?;
        let users = self.users.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id))
            .map(|r| r.user.clone())
            .collect())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.check_online()?;
        Ok(self.users.read().await.get(&id).map(|r| r.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, StoreError> {
        self.check_online()?;
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|r| r.user.email.expose() == email)
            .map(|r| UserCredentials {
                user: r.user.clone(),
                password_hash: Masked::new(r.password_hash.clone()),
            }))
    }

    async fn update_user_status(
        &self,
        id: Uuid,
        status: UserStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        self.check_online()?;
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|record| {
            record.user.status = status;
            record.user.updated_at = now;
            record.user.clone()
        }))
    }

    async fn user_status_counts(&self) -> Result<Vec<StatusCount>, StoreError> {
        self.check_online()?;
        let users = self.users.read().await;
        Ok(count_by(users.values().map(|r| Some(r.user.status.as_str()))))
    }
}

#[async_trait]
impl StoreProbe for InMemoryStore {
    async fn ping(&self) -> Result<DateTime<Utc>, StoreError> {
        self.check_online()?;
        Ok(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catering_core::{BookingStatus, PaymentStatus};
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    fn booking_for(user_id: Option<Uuid>, created: DateTime<Utc>) -> Booking {
        Booking::new(
            user_id,
            "Lea Cruz".to_string(),
            NaiveDate::from_ymd_opt(2025, 8, 30).unwrap(),
            Decimal::new(800_000, 2),
            created,
        )
    }

    #[tokio::test]
    async fn test_bookings_joined_with_user_email() {
        let store = InMemoryStore::new();
        let created = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        let user = User::new("Lea".to_string(), "lea@example.com".to_string(), created);
        let user_id = user.id;
        store.insert_user(user, "hash").await;

        let booking = booking_for(Some(user_id), created);
        let id = booking.id;
        store.insert_booking(booking).await;

        let found = store.find(id).await.unwrap().unwrap();
        assert_eq!(found.user_email.as_deref(), Some("lea@example.com"));

        store.remove_user(user_id).await;
        let found = store.find(id).await.unwrap().unwrap();
        assert_eq!(found.user_email, None);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = InMemoryStore::new();
        let older = booking_for(None, Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap());
        let newer = booking_for(None, Utc.with_ymd_and_hms(2025, 7, 2, 0, 0, 0).unwrap());
        let (older_id, newer_id) = (older.id, newer.id);
        store.insert_booking(older).await;
        store.insert_booking(newer).await;

        let ids: Vec<Uuid> = store.list().await.unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![newer_id, older_id]);
    }

    #[tokio::test]
    async fn test_guarded_update_conflicts() {
        let store = InMemoryStore::new();
        let created = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        let booking = booking_for(None, created);
        let id = booking.id;
        store.insert_booking(booking).await;

        let update = BookingUpdate::at(created).payment(PaymentStatus::Paid);
        let outcome = store
            .update(id, &update, Some(ExpectedState::approved_unpaid()))
            .await
            .unwrap();
        match outcome {
            UpdateOutcome::Conflict(current) => {
                assert_eq!(current.booking_status, BookingStatus::Pending);
                assert_eq!(current.payment_status, PaymentStatus::Unpaid);
            }
            other => panic!("expected conflict, got {:?}", other),
        }

        let missing = store.update(Uuid::new_v4(), &update, None).await.unwrap();
        assert_eq!(missing, UpdateOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = InMemoryStore::new();
        store.set_offline(true);
        assert!(matches!(store.list().await, Err(StoreError::Unavailable(_))));
        assert!(store.ping().await.is_err());

        store.set_offline(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_status_counts() {
        let store = InMemoryStore::new();
        let created = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        for _ in 0..2 {
            store.insert_booking(booking_for(None, created)).await;
        }
        let mut approved = booking_for(None, created);
        approved.booking_status = BookingStatus::Approved;
        store.insert_booking(approved).await;

        let mut counts = store.status_counts().await.unwrap();
        counts.sort_by(|a, b| a.status.cmp(&b.status));
        assert_eq!(
            counts,
            vec![
                StatusCount::new(Some("approved"), 1),
                StatusCount::new(Some("pending"), 2),
            ]
        );
    }
}
