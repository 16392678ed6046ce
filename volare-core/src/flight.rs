use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::query::TravelClass;

/// One side of a flight leg: the airport plus the position within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightStop {
    pub iata: String,
    pub airport: String,
    pub city: String,
    pub country: String,
    pub terminal: Option<String>,
    pub gate: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightDuration {
    pub hours: u32,
    pub minutes: u32,
}

impl FlightDuration {
    pub fn from_minutes(total: i64) -> Self {
        let total = total.max(0) as u32;
        Self {
            hours: total / 60,
            minutes: total % 60,
        }
    }

    pub fn total_minutes(&self) -> u32 {
        self.hours * 60 + self.minutes
    }
}

impl fmt::Display for FlightDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {:02}m", self.hours, self.minutes)
    }
}

/// Canonical flight record. Built once by the normalizer or the fallback
/// generator and treated as a value afterwards; the provenance flags are
/// mandatory so no path can hand out untagged data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub id: String,
    pub airline: String,
    pub flight_number: String,
    pub departure: FlightStop,
    pub arrival: FlightStop,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_date: NaiveDate,
    pub arrival_time: NaiveTime,
    pub duration: FlightDuration,
    pub status: String,
    pub delay_minutes: Option<u32>,
    pub price: u32,
    pub travel_class: TravelClass,
    pub is_real_data: bool,
    pub is_schedule_data: bool,
}

impl FlightRecord {
    pub fn with_price(mut self, price: u32) -> Self {
        self.price = price;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    CurrentApi,
    FutureApi,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMeta {
    pub source: DataSource,
    /// Total row count reported by upstream pagination, when available.
    pub total_upstream: Option<u32>,
    pub served_from_cache: bool,
    /// Diagnostic context for empty or degraded results.
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSearchResult {
    pub flights: Vec<FlightRecord>,
    pub meta: SearchMeta,
}
