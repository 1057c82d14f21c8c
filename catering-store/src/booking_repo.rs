use async_trait::async_trait;
use catering_core::{
    Booking, BookingDetails, BookingRepository, BookingUpdate, ExpectedState, StatusCount,
    StoreError, UpdateOutcome,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::unavailable;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Columns of the joined booking view. `b` is either the table or an
// `UPDATE ... RETURNING *` CTE.
const BOOKING_COLUMNS: &str = r#"
    b.id, b.user_id, b.full_name, b.contact_number, b.celebrant_name, b.celebrant_age,
    b.guest_count, b.food_package, b.event_type, b.event_date, b.start_time, b.end_time,
    b.location, b.event_theme, b.custom_theme, b.theme_suggestions, b.selected_menus,
    b.total_price, b.booking_status, b.payment_status, b.rejection_reason,
    b.cancellation_reason, b.approved_at, b.payment_deadline, b.created_at, b.updated_at,
    u.email AS user_email, u.avatar_url
"#;

fn select_from(source: &str) -> String {
    format!("SELECT {BOOKING_COLUMNS} FROM {source} b LEFT JOIN users u ON b.user_id = u.id")
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Option<Uuid>,
    full_name: String,
    contact_number: Option<String>,
    celebrant_name: Option<String>,
    celebrant_age: Option<i32>,
    guest_count: Option<i32>,
    food_package: Option<String>,
    event_type: Option<String>,
    event_date: NaiveDate,
    start_time: Option<String>,
    end_time: Option<String>,
    location: Option<String>,
    event_theme: Option<String>,
    custom_theme: Option<String>,
    theme_suggestions: Option<String>,
    selected_menus: Option<Value>,
    total_price: Decimal,
    booking_status: String,
    payment_status: String,
    rejection_reason: Option<String>,
    cancellation_reason: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    payment_deadline: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_email: Option<String>,
    avatar_url: Option<String>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |e: catering_core::ParseStatusError| StoreError::Corrupt {
            id: id.to_string(),
            message: e.to_string(),
        };
        let booking_status = row.booking_status.parse().map_err(corrupt)?;
        let payment_status = row.payment_status.parse().map_err(corrupt)?;

        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            user_email: row.user_email,
            avatar_url: row.avatar_url,
            full_name: row.full_name,
            details: BookingDetails {
                contact_number: row.contact_number,
                celebrant_name: row.celebrant_name,
                celebrant_age: row.celebrant_age,
                guest_count: row.guest_count,
                food_package: row.food_package,
                event_type: row.event_type,
                start_time: row.start_time,
                end_time: row.end_time,
                location: row.location,
                event_theme: row.event_theme,
                custom_theme: row.custom_theme,
                theme_suggestions: row.theme_suggestions,
                selected_menus: row.selected_menus.unwrap_or_default(),
            },
            event_date: row.event_date,
            total_price: row.total_price,
            booking_status,
            payment_status,
            rejection_reason: row.rejection_reason,
            cancellation_reason: row.cancellation_reason,
            approved_at: row.approved_at,
            payment_deadline: row.payment_deadline,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, StoreError> {
    rows.into_iter().map(Booking::try_from).collect()
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn find(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let sql = format!("{} WHERE b.id = $1", select_from("bookings"));
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        row.map(Booking::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        let sql = format!("{} ORDER BY b.created_at DESC", select_from("bookings"));
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        into_bookings(rows)
    }

    async fn update(
        &self,
        id: Uuid,
        update: &BookingUpdate,
        expected: Option<ExpectedState>,
    ) -> Result<UpdateOutcome, StoreError> {
        let expected_status = expected.map(|e| e.booking_status.as_str());
        let expected_payment = expected.and_then(|e| e.payment_status).map(|p| p.as_str());

        // Guard and write in one statement so a concurrent transition cannot
        // slip between the check and the update.
        let sql = format!(
            r#"
            WITH updated AS (
                UPDATE bookings SET
                    booking_status = COALESCE($2, booking_status),
                    payment_status = COALESCE($3, payment_status),
                    rejection_reason = COALESCE($4, rejection_reason),
                    cancellation_reason = COALESCE($5, cancellation_reason),
                    approved_at = COALESCE($6, approved_at),
                    payment_deadline = COALESCE($7, payment_deadline),
                    total_price = COALESCE($8, total_price),
                    updated_at = $9
                WHERE id = $1
                  AND ($10::text IS NULL OR booking_status = $10)
                  AND ($11::text IS NULL OR payment_status = $11)
                RETURNING *
            )
            {}
            "#,
            select_from("updated")
        );

        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(update.booking_status.map(|s| s.as_str()))
            .bind(update.payment_status.map(|p| p.as_str()))
            .bind(update.rejection_reason.as_deref())
            .bind(update.cancellation_reason.as_deref())
            .bind(update.approved_at)
            .bind(update.payment_deadline)
            .bind(update.total_price)
            .bind(update.updated_at)
            .bind(expected_status)
            .bind(expected_payment)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        match row {
            Some(row) => Ok(UpdateOutcome::Updated(Booking::try_from(row)?)),
            None => Ok(match self.find(id).await? {
                Some(current) => UpdateOutcome::Conflict(current),
                None => UpdateOutcome::NotFound,
            }),
        }
    }

    async fn find_expirable(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, StoreError> {
        let sql = format!(
            r#"{}
            WHERE b.booking_status = 'approved'
              AND b.payment_status <> 'paid'
              AND b.payment_deadline IS NOT NULL
              AND b.payment_deadline < $1
            ORDER BY b.payment_deadline"#,
            select_from("bookings")
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        into_bookings(rows)
    }

    async fn status_counts(&self) -> Result<Vec<StatusCount>, StoreError> {
        let rows: Vec<(Option<String>, i64)> = sqlx::query_as(
            "SELECT booking_status, COUNT(*) FROM bookings GROUP BY booking_status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(rows
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, StoreError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)
    }
}
