//! Placeholder flights for when the provider cannot be reached within the
//! retry budget. Every record is tagged `is_real_data = false`; this path
//! never stands in for a genuinely empty real result.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use volare_core::flight::{
    DataSource, FlightDuration, FlightRecord, FlightSearchResult, FlightStop, SearchMeta,
};
use volare_core::query::SearchQuery;

use crate::normalize::FALLBACK_DURATION_MINUTES;
use crate::pricing::PriceEstimator;

/// Rotating airline table for placeholder records.
const AIRLINES: [(&str, &str); 5] = [
    ("United Airlines", "UA"),
    ("Delta Air Lines", "DL"),
    ("American Airlines", "AA"),
    ("British Airways", "BA"),
    ("Lufthansa", "LH"),
];

const FLIGHT_COUNT: usize = 5;
const FIRST_DEPARTURE_HOUR: u32 = 6;
const DEPARTURE_SPACING_HOURS: i64 = 3;

pub fn generate_fallback(
    query: &SearchQuery,
    estimator: &PriceEstimator,
    context: String,
) -> FlightSearchResult {
    let duration = FlightDuration::from_minutes(FALLBACK_DURATION_MINUTES);
    let first_departure = NaiveTime::from_hms_opt(FIRST_DEPARTURE_HOUR, 0, 0)
        .unwrap_or(NaiveTime::MIN);

    let flights = (0..FLIGHT_COUNT)
        .map(|index| {
            let (airline, code) = AIRLINES[index % AIRLINES.len()];
            let departure_time =
                first_departure + Duration::hours(DEPARTURE_SPACING_HOURS * index as i64);
            let arrival = NaiveDateTime::new(query.departure_date, departure_time)
                + Duration::minutes(FALLBACK_DURATION_MINUTES);
            let price = estimator.estimate(query.travel_class, duration, false);

            FlightRecord {
                id: Uuid::new_v4().to_string(),
                airline: airline.to_string(),
                flight_number: format!("{}{}", code, 100 + 50 * index),
                departure: placeholder_stop(query.origin.as_str()),
                arrival: placeholder_stop(query.destination.as_str()),
                departure_date: query.departure_date,
                departure_time,
                arrival_date: arrival.date(),
                arrival_time: arrival.time(),
                duration,
                status: "scheduled".to_string(),
                delay_minutes: None,
                price,
                travel_class: query.travel_class,
                is_real_data: false,
                is_schedule_data: false,
            }
        })
        .collect();

    FlightSearchResult {
        flights,
        meta: SearchMeta {
            source: DataSource::Synthetic,
            total_upstream: None,
            served_from_cache: false,
            context: Some(context),
        },
    }
}

fn placeholder_stop(iata: &str) -> FlightStop {
    FlightStop {
        iata: iata.to_string(),
        airport: format!("{} Airport", iata),
        city: String::new(),
        country: String::new(),
        terminal: None,
        gate: None,
    }
}
