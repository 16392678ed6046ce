use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::SearchError;

/// Schedules are published by the provider roughly a week out.
pub const MIN_LEAD_DAYS: i64 = 7;
/// Airlines publish schedules up to about eleven months ahead.
pub const MAX_HORIZON_MONTHS: u32 = 11;

/// Which provider surface a search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Current,
    Future,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStatus {
    InvalidFormat,
    Past,
    TooSoon,
    FarFuture,
    Valid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateValidation {
    pub status: DateStatus,
    pub message: String,
}

impl DateValidation {
    fn new(status: DateStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, SearchError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| SearchError::InvalidQuery(format!("'{}' is not a YYYY-MM-DD date", raw)))
}

/// Dates up to and including today go to the current/historical endpoint,
/// everything later to the future-schedule endpoint. Both inputs are already
/// day-resolution values, so no further truncation can diverge.
pub fn classify(date: NaiveDate, today: NaiveDate) -> SearchScope {
    if date <= today {
        SearchScope::Current
    } else {
        SearchScope::Future
    }
}

/// Earliest date the future-schedule endpoint can answer for. Shared by the
/// window check and its message so the two can never disagree.
pub fn earliest_schedule_date(today: NaiveDate) -> NaiveDate {
    today + Duration::days(MIN_LEAD_DAYS)
}

/// Last date inside the schedule-publication horizon.
pub fn horizon_end(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_months(Months::new(MAX_HORIZON_MONTHS))
        .unwrap_or(NaiveDate::MAX)
}

/// Window validation for a future-scope date. Returns a structured verdict
/// rather than an error so callers can render actionable guidance.
pub fn validate_future(date: NaiveDate, today: NaiveDate) -> DateValidation {
    if date <= today {
        return DateValidation::new(
            DateStatus::Past,
            format!("{} is not after today ({})", date, today),
        );
    }
    let earliest = earliest_schedule_date(today);
    if date < earliest {
        return DateValidation::new(
            DateStatus::TooSoon,
            format!(
                "Schedules are published about {} days in advance; the earliest searchable date is {}",
                MIN_LEAD_DAYS, earliest
            ),
        );
    }
    let horizon = horizon_end(today);
    if date > horizon {
        return DateValidation::new(
            DateStatus::FarFuture,
            format!(
                "Schedules are only published up to {} months ahead (until {})",
                MAX_HORIZON_MONTHS, horizon
            ),
        );
    }
    DateValidation::new(DateStatus::Valid, "Date is within the schedule window")
}

/// Parse-then-validate convenience for raw date strings. Fails fast with
/// `invalid_format` before anything touches the network.
pub fn validate_date_str(raw: &str, today: NaiveDate) -> DateValidation {
    match parse_date(raw) {
        Ok(date) => match classify(date, today) {
            SearchScope::Current => {
                DateValidation::new(DateStatus::Valid, "Date targets current flight data")
            }
            SearchScope::Future => validate_future(date, today),
        },
        Err(_) => DateValidation::new(
            DateStatus::InvalidFormat,
            format!("'{}' is not a YYYY-MM-DD date", raw),
        ),
    }
}
