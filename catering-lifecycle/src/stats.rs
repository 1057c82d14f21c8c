use catering_core::{BookingStatus, StatusCount, UserStatus};
use serde::{Deserialize, Serialize};

/// Booking counts per status. Status strings outside the known set land in
/// `other`, so `total` always equals the sum of the buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStats {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub cancelled: i64,
    pub other: i64,
    pub total: i64,
}

impl BookingStats {
    pub fn from_counts(rows: &[StatusCount]) -> Self {
        let mut stats = Self::default();
        for row in rows {
            let count = row.count.max(0);
            let bucket = match row.status.as_deref().map(str::parse::<BookingStatus>) {
                Some(Ok(BookingStatus::Pending)) => &mut stats.pending,
                Some(Ok(BookingStatus::Approved)) => &mut stats.approved,
                Some(Ok(BookingStatus::Rejected)) => &mut stats.rejected,
                Some(Ok(BookingStatus::Cancelled)) => &mut stats.cancelled,
                Some(Err(_)) | None => &mut stats.other,
            };
            *bucket += count;
            stats.total += count;
        }
        stats
    }
}

/// User counts per account status; a missing status counts as active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub active: i64,
    pub blocked: i64,
    pub inactive: i64,
    pub other: i64,
    pub total: i64,
}

impl UserStats {
    pub fn from_counts(rows: &[StatusCount]) -> Self {
        let mut stats = Self::default();
        for row in rows {
            let count = row.count.max(0);
            let bucket = match UserStatus::from_column(row.status.as_deref()) {
                Ok(UserStatus::Active) => &mut stats.active,
                Ok(UserStatus::Blocked) => &mut stats.blocked,
                Ok(UserStatus::Inactive) => &mut stats.inactive,
                Err(_) => &mut stats.other,
            };
            *bucket += count;
            stats.total += count;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_all_zeros() {
        assert_eq!(BookingStats::from_counts(&[]), BookingStats::default());
        assert_eq!(UserStats::from_counts(&[]), UserStats::default());
    }

    #[test]
    fn test_booking_stats_counts_each_status() {
        let rows = vec![
            StatusCount::new(Some("pending"), 3),
            StatusCount::new(Some("approved"), 2),
            StatusCount::new(Some("rejected"), 1),
        ];
        let stats = BookingStats::from_counts(&rows);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.approved, 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.cancelled, 0);
        assert_eq!(stats.total, 6);
    }

    #[test]
    fn test_cancelled_and_unknown_are_not_dropped() {
        let rows = vec![
            StatusCount::new(Some("pending"), 1),
            StatusCount::new(Some("cancelled"), 4),
            StatusCount::new(Some("archived"), 2),
            StatusCount::new(None, 1),
        ];
        let stats = BookingStats::from_counts(&rows);
        assert_eq!(stats.cancelled, 4);
        assert_eq!(stats.other, 3);
        assert_eq!(stats.total, 8);
        assert_eq!(
            stats.total,
            stats.pending + stats.approved + stats.rejected + stats.cancelled + stats.other
        );
    }

    #[test]
    fn test_user_stats_defaults_missing_status_to_active() {
        let rows = vec![
            StatusCount::new(Some("active"), 5),
            StatusCount::new(None, 2),
            StatusCount::new(Some("blocked"), 1),
            StatusCount::new(Some("inactive"), 3),
            StatusCount::new(Some("suspended"), 1),
        ];
        let stats = UserStats::from_counts(&rows);
        assert_eq!(stats.active, 7);
        assert_eq!(stats.blocked, 1);
        assert_eq!(stats.inactive, 3);
        assert_eq!(stats.other, 1);
        assert_eq!(stats.total, 12);
    }
}
