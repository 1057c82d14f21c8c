use std::collections::{BTreeMap, HashMap};

use catering_core::{Booking, PaymentStatus};
use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

const WINDOW_MONTHS: u32 = 12;
const TOP_PACKAGES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageCount {
    pub food_package: String,
    pub count: i64,
}

/// Dashboard charts: bookings and paid revenue per month over the trailing
/// year, plus the most requested food packages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardAnalytics {
    pub monthly_bookings: Vec<MonthlyCount>,
    pub revenue: Vec<MonthlyRevenue>,
    pub packages: Vec<PackageCount>,
}

impl DashboardAnalytics {
    pub fn compute(bookings: &[Booking], now: DateTime<Utc>) -> Self {
        let since = now
            .checked_sub_months(Months::new(WINDOW_MONTHS))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut per_month: BTreeMap<String, i64> = BTreeMap::new();
        let mut revenue: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut packages: HashMap<&str, i64> = HashMap::new();

        for booking in bookings {
            if let Some(package) = booking.details.food_package.as_deref() {
                *packages.entry(package).or_default() += 1;
            }

            if booking.created_at < since {
                continue;
            }
            let month = booking.created_at.format("%Y-%m").to_string();
            if booking.payment_status == PaymentStatus::Paid {
                *revenue.entry(month.clone()).or_default() += booking.total_price;
            }
            *per_month.entry(month).or_default() += 1;
        }

        let mut packages: Vec<PackageCount> = packages
            .into_iter()
            .map(|(food_package, count)| PackageCount {
                food_package: food_package.to_string(),
                count,
            })
            .collect();
        packages.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.food_package.cmp(&b.food_package)));
        packages.truncate(TOP_PACKAGES);

        Self {
            monthly_bookings: per_month
                .into_iter()
                .map(|(month, count)| MonthlyCount { month, count })
                .collect(),
            revenue: revenue
                .into_iter()
                .map(|(month, revenue)| MonthlyRevenue { month, revenue })
                .collect(),
            packages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use std::str::FromStr;

    fn booking(created: DateTime<Utc>, package: Option<&str>, price: &str, paid: bool) -> Booking {
        let mut b = Booking::new(
            None,
            "Guest".to_string(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            Decimal::from_str(price).unwrap(),
            created,
        );
        b.details.food_package = package.map(str::to_string);
        if paid {
            b.payment_status = PaymentStatus::Paid;
        }
        b
    }

    #[test]
    fn test_empty_analytics() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(DashboardAnalytics::compute(&[], now), DashboardAnalytics::default());
    }

    #[test]
    fn test_monthly_counts_and_revenue_within_window() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let bookings = vec![
            booking(Utc.with_ymd_and_hms(2025, 5, 2, 9, 0, 0).unwrap(), None, "1000.50", true),
            booking(Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).unwrap(), None, "2000.25", true),
            booking(Utc.with_ymd_and_hms(2025, 5, 21, 9, 0, 0).unwrap(), None, "9999", false),
            booking(Utc.with_ymd_and_hms(2025, 1, 3, 9, 0, 0).unwrap(), None, "500", false),
            // Outside the trailing year.
            booking(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(), None, "700", true),
        ];

        let analytics = DashboardAnalytics::compute(&bookings, now);
        assert_eq!(
            analytics.monthly_bookings,
            vec![
                MonthlyCount { month: "2025-01".to_string(), count: 1 },
                MonthlyCount { month: "2025-05".to_string(), count: 3 },
            ]
        );
        assert_eq!(
            analytics.revenue,
            vec![MonthlyRevenue {
                month: "2025-05".to_string(),
                revenue: Decimal::from_str("3000.75").unwrap(),
            }]
        );
    }

    #[test]
    fn test_top_packages_limited_and_ordered() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut bookings = Vec::new();
        for (package, n) in [("A", 1), ("B", 4), ("C", 2), ("D", 2), ("E", 3), ("F", 1)] {
            for _ in 0..n {
                bookings.push(booking(created, Some(package), "100", false));
            }
        }
        bookings.push(booking(created, None, "100", false));

        let analytics = DashboardAnalytics::compute(&bookings, now);
        let names: Vec<&str> = analytics.packages.iter().map(|p| p.food_package.as_str()).collect();
        assert_eq!(names, vec!["B", "E", "C", "D", "A"]);
        assert_eq!(analytics.packages[0].count, 4);
    }
}
