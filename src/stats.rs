//! Reporting periods and period-over-period delta arithmetic shared by the
//! statistics endpoints.

use chrono::{DateTime, Duration, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Closed set of reporting windows accepted at the request boundary.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AllowedPeriod {
    AllTime,
    Day,
    Week,
    Month,
    Year,
}

impl AllowedPeriod {
    /// Parse a path segment into a period, rejecting anything outside the
    /// enumerated set before it reaches query logic.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        raw.parse::<AllowedPeriod>().map_err(|_| {
            ServiceError::ValidationError(format!(
                "invalid period '{raw}', expected one of: all-time, day, week, month, year"
            ))
        })
    }
}

/// Two adjacent, non-overlapping time windows: the most recent period and
/// the one immediately before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRanges {
    pub current_start: DateTime<Utc>,
    pub current_end: DateTime<Utc>,
    pub previous_start: DateTime<Utc>,
    pub previous_end: DateTime<Utc>,
}

/// Compute the current and previous windows for a period, anchored at `now`.
///
/// Day and week windows are fixed spans; month and year windows use
/// calendar arithmetic so that e.g. "last month" from March 31 lands on
/// the correct boundary.
pub fn date_ranges(period: AllowedPeriod, now: DateTime<Utc>) -> Result<DateRanges, ServiceError> {
    let (current_start, previous_start) = match period {
        AllowedPeriod::Day => (now - Duration::days(1), now - Duration::days(2)),
        AllowedPeriod::Week => (now - Duration::days(7), now - Duration::days(14)),
        AllowedPeriod::Month => (
            sub_months(now, 1)?,
            sub_months(now, 2)?,
        ),
        AllowedPeriod::Year => (
            sub_months(now, 12)?,
            sub_months(now, 24)?,
        ),
        AllowedPeriod::AllTime => {
            return Err(ServiceError::InternalError(
                "all-time has no bounded window".to_string(),
            ))
        }
    };

    Ok(DateRanges {
        current_start,
        current_end: now,
        previous_start,
        previous_end: current_start,
    })
}

fn sub_months(now: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>, ServiceError> {
    now.checked_sub_months(Months::new(months))
        .ok_or_else(|| ServiceError::InternalError("date window out of range".to_string()))
}

/// Percentage change between two period values.
///
/// Policy for a zero previous period (division by zero otherwise): report
/// 100% when the current period has activity, 0% when both are empty.
pub fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (current - previous) / previous * 100.0
    }
}

/// Count statistic with its delta against the previous period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountStats {
    pub count: u64,
    pub percentage_change: f64,
}

/// Monetary statistic with its delta against the previous period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostStats {
    pub cost: Decimal,
    pub percentage_change: f64,
}
