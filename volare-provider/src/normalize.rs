//! Converts the two provider payload shapes into canonical `FlightRecord`s.
//! Each endpoint gets its own explicit parsing function with one declared
//! default per missing optional field; a row that fails to decode is
//! skipped with a warning instead of failing the whole search.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::warn;
use uuid::Uuid;

use volare_core::flight::{FlightDuration, FlightRecord, FlightStop};
use volare_core::query::SearchQuery;

use crate::wire::{CurrentFlight, CurrentStop, FutureFlight, FutureStop};

/// Assumed duration when the payload gives us nothing to compute one from.
/// A deliberate placeholder, not an estimate of the real flight time.
pub const FALLBACK_DURATION_MINUTES: i64 = 150;

pub const UNKNOWN_AIRPORT: &str = "Unknown Airport";
pub const UNKNOWN_AIRLINE: &str = "Unknown Airline";

/// Normalize a page of current-endpoint rows.
pub fn normalize_current(items: &[serde_json::Value], query: &SearchQuery) -> Vec<FlightRecord> {
    items
        .iter()
        .filter_map(|raw| match serde_json::from_value::<CurrentFlight>(raw.clone()) {
            Ok(item) => Some(from_current(&item, query)),
            Err(e) => {
                warn!("Skipping malformed current-flight row: {}", e);
                None
            }
        })
        .collect()
}

/// Normalize a page of future-schedule rows. The endpoint only filters by
/// the departure airport, so rows bound for other destinations are dropped
/// here.
pub fn normalize_future(items: &[serde_json::Value], query: &SearchQuery) -> Vec<FlightRecord> {
    items
        .iter()
        .filter_map(|raw| match serde_json::from_value::<FutureFlight>(raw.clone()) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed future-schedule row: {}", e);
                None
            }
        })
        .filter(|item| {
            item.arrival
                .as_ref()
                .and_then(|stop| stop.iata_code.as_deref())
                .map(|iata| iata.eq_ignore_ascii_case(query.destination.as_str()))
                .unwrap_or(false)
        })
        .map(|item| from_future(&item, query))
        .collect()
}

fn from_current(item: &CurrentFlight, query: &SearchQuery) -> FlightRecord {
    let departure = stop_from_current(item.departure.as_ref(), query.origin.as_str());
    let arrival = stop_from_current(item.arrival.as_ref(), query.destination.as_str());

    let departure_ts = item
        .departure
        .as_ref()
        .and_then(|stop| stop.scheduled.as_deref())
        .and_then(parse_timestamp);
    let arrival_ts = item
        .arrival
        .as_ref()
        .and_then(|stop| stop.scheduled.as_deref())
        .and_then(parse_timestamp);

    let query_date = item
        .flight_date
        .as_deref()
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .unwrap_or(query.departure_date);

    let (departure_date, departure_time) = match departure_ts {
        Some(ts) => (ts.date(), ts.time()),
        None => (query_date, NaiveTime::MIN),
    };
    let (arrival_date, arrival_time, duration) = match (departure_ts, arrival_ts) {
        (Some(dep), Some(arr)) => {
            let minutes = (arr - dep).num_minutes();
            if minutes > 0 {
                (arr.date(), arr.time(), FlightDuration::from_minutes(minutes))
            } else {
                // Inconsistent timestamps; keep the arrival as reported but
                // refuse to show a negative duration.
                (
                    arr.date(),
                    arr.time(),
                    FlightDuration::from_minutes(FALLBACK_DURATION_MINUTES),
                )
            }
        }
        _ => {
            let assumed =
                NaiveDateTime::new(departure_date, departure_time)
                    + Duration::minutes(FALLBACK_DURATION_MINUTES);
            (
                assumed.date(),
                assumed.time(),
                FlightDuration::from_minutes(FALLBACK_DURATION_MINUTES),
            )
        }
    };

    FlightRecord {
        id: Uuid::new_v4().to_string(),
        airline: item
            .airline
            .as_ref()
            .and_then(|airline| airline.name.clone())
            .unwrap_or_else(|| UNKNOWN_AIRLINE.to_string()),
        flight_number: designator(
            item.flight.as_ref().and_then(|f| f.iata.as_deref()),
            item.flight.as_ref().and_then(|f| f.number.as_deref()),
            item.airline.as_ref().and_then(|a| a.iata.as_deref()),
        ),
        departure,
        arrival,
        departure_date,
        departure_time,
        arrival_date,
        arrival_time,
        duration,
        status: item
            .flight_status
            .clone()
            .unwrap_or_else(|| "scheduled".to_string()),
        delay_minutes: item.departure.as_ref().and_then(|stop| stop.delay),
        price: 0,
        travel_class: query.travel_class,
        is_real_data: true,
        is_schedule_data: false,
    }
}

fn from_future(item: &FutureFlight, query: &SearchQuery) -> FlightRecord {
    let departure = stop_from_future(item.departure.as_ref(), query.origin.as_str());
    let arrival = stop_from_future(item.arrival.as_ref(), query.destination.as_str());

    let departure_time = item
        .departure
        .as_ref()
        .and_then(|stop| stop.scheduled_time.as_deref())
        .and_then(parse_time);
    let arrival_time = item
        .arrival
        .as_ref()
        .and_then(|stop| stop.scheduled_time.as_deref())
        .and_then(parse_time);

    let departure_date = query.departure_date;
    let (departure_time, arrival_date, arrival_time, duration) =
        match (departure_time, arrival_time) {
            (Some(dep), Some(arr)) => {
                // Only times-of-day are published. An arrival numerically
                // before the departure means the flight lands the next day.
                let arrival_date = if arr < dep {
                    departure_date + Duration::days(1)
                } else {
                    departure_date
                };
                let minutes = (NaiveDateTime::new(arrival_date, arr)
                    - NaiveDateTime::new(departure_date, dep))
                .num_minutes();
                (dep, arrival_date, arr, FlightDuration::from_minutes(minutes))
            }
            (Some(dep), None) => {
                let assumed = NaiveDateTime::new(departure_date, dep)
                    + Duration::minutes(FALLBACK_DURATION_MINUTES);
                (
                    dep,
                    assumed.date(),
                    assumed.time(),
                    FlightDuration::from_minutes(FALLBACK_DURATION_MINUTES),
                )
            }
            _ => (
                NaiveTime::MIN,
                departure_date,
                NaiveTime::MIN + Duration::minutes(FALLBACK_DURATION_MINUTES),
                FlightDuration::from_minutes(FALLBACK_DURATION_MINUTES),
            ),
        };

    FlightRecord {
        id: Uuid::new_v4().to_string(),
        airline: item
            .airline
            .as_ref()
            .and_then(|airline| airline.name.clone())
            .unwrap_or_else(|| UNKNOWN_AIRLINE.to_string()),
        flight_number: designator(
            item.flight.as_ref().and_then(|f| f.iata_code.as_deref()),
            item.flight.as_ref().and_then(|f| f.number.as_deref()),
            item.airline.as_ref().and_then(|a| a.iata_code.as_deref()),
        ),
        departure,
        arrival,
        departure_date,
        departure_time,
        arrival_date,
        arrival_time,
        duration,
        status: "scheduled".to_string(),
        delay_minutes: None,
        price: 0,
        travel_class: query.travel_class,
        is_real_data: true,
        is_schedule_data: true,
    }
}

fn stop_from_current(stop: Option<&CurrentStop>, query_iata: &str) -> FlightStop {
    match stop {
        Some(stop) => FlightStop {
            iata: stop
                .iata
                .clone()
                .unwrap_or_else(|| query_iata.to_string())
                .to_ascii_uppercase(),
            airport: stop
                .airport
                .clone()
                .unwrap_or_else(|| UNKNOWN_AIRPORT.to_string()),
            city: city_from_timezone(stop.timezone.as_deref()),
            country: String::new(),
            terminal: stop.terminal.clone(),
            gate: stop.gate.clone(),
        },
        None => unknown_stop(query_iata),
    }
}

fn stop_from_future(stop: Option<&FutureStop>, query_iata: &str) -> FlightStop {
    match stop {
        Some(stop) => FlightStop {
            iata: stop
                .iata_code
                .clone()
                .unwrap_or_else(|| query_iata.to_string())
                .to_ascii_uppercase(),
            airport: UNKNOWN_AIRPORT.to_string(),
            city: String::new(),
            country: String::new(),
            terminal: stop.terminal.clone(),
            gate: stop.gate.clone(),
        },
        None => unknown_stop(query_iata),
    }
}

fn unknown_stop(query_iata: &str) -> FlightStop {
    FlightStop {
        iata: query_iata.to_string(),
        airport: UNKNOWN_AIRPORT.to_string(),
        city: String::new(),
        country: String::new(),
        terminal: None,
        gate: None,
    }
}

/// Best displayable flight designator: the combined IATA designator when
/// present, otherwise airline code + number, otherwise the bare number.
fn designator(
    combined: Option<&str>,
    number: Option<&str>,
    airline_code: Option<&str>,
) -> String {
    if let Some(code) = combined {
        return code.to_string();
    }
    match (airline_code, number) {
        (Some(airline), Some(number)) => format!("{}{}", airline, number),
        (None, Some(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// The current endpoint carries no city field; the IANA timezone suffix
/// ("America/New_York") is the closest usable stand-in.
fn city_from_timezone(timezone: Option<&str>) -> String {
    timezone
        .and_then(|tz| tz.rsplit('/').next())
        .map(|city| city.replace('_', " "))
        .unwrap_or_default()
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .ok()
        .or_else(|| NaiveTime::parse_from_str(raw, "%H:%M:%S").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use volare_core::query::{AirportCode, TravelClass};

    fn query() -> SearchQuery {
        SearchQuery::new(
            AirportCode::new("JFK").unwrap(),
            AirportCode::new("LAX").unwrap(),
            NaiveDate::from_ymd_opt(2026, 8, 8).unwrap(),
            TravelClass::Economy,
            1,
        )
        .unwrap()
    }

    fn current_row() -> serde_json::Value {
        json!({
            "flight_date": "2026-08-08",
            "flight_status": "active",
            "departure": {
                "airport": "John F Kennedy International",
                "iata": "JFK",
                "timezone": "America/New_York",
                "terminal": "4",
                "gate": "B22",
                "delay": 10,
                "scheduled": "2026-08-08T08:30:00+00:00"
            },
            "arrival": {
                "airport": "Los Angeles International",
                "iata": "LAX",
                "timezone": "America/Los_Angeles",
                "scheduled": "2026-08-08T14:45:00+00:00"
            },
            "airline": { "name": "American Airlines", "iata": "AA" },
            "flight": { "number": "100", "iata": "AA100" }
        })
    }

    #[test]
    fn current_duration_equals_arrival_minus_departure() {
        let records = normalize_current(&[current_row()], &query());
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.duration.total_minutes(), 6 * 60 + 15);
        assert_eq!(record.airline, "American Airlines");
        assert_eq!(record.flight_number, "AA100");
        assert_eq!(record.departure.city, "New York");
        assert_eq!(record.delay_minutes, Some(10));
        assert!(record.is_real_data);
        assert!(!record.is_schedule_data);
    }

    #[test]
    fn malformed_row_is_skipped_not_fatal() {
        let rows = vec![json!({"departure": "not-an-object"}), current_row()];
        let records = normalize_current(&rows, &query());
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn missing_nested_fields_fall_back_to_defaults() {
        let row = json!({ "flight_date": "2026-08-08" });
        let records = normalize_current(&[row], &query());
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.airline, UNKNOWN_AIRLINE);
        assert_eq!(record.departure.airport, UNKNOWN_AIRPORT);
        assert_eq!(record.departure.iata, "JFK");
        assert_eq!(
            record.duration.total_minutes() as i64,
            FALLBACK_DURATION_MINUTES
        );
    }

    fn future_row(arrival_iata: &str, dep_time: &str, arr_time: &str) -> serde_json::Value {
        json!({
            "weekday": "6",
            "departure": { "iataCode": "JFK", "scheduledTime": dep_time },
            "arrival": { "iataCode": arrival_iata, "scheduledTime": arr_time },
            "airline": { "name": "Delta Air Lines", "iataCode": "DL" },
            "flight": { "number": "423" }
        })
    }

    #[test]
    fn future_rows_for_other_destinations_are_filtered_out() {
        let rows = vec![
            future_row("LAX", "09:15", "12:40"),
            future_row("SFO", "10:00", "13:30"),
        ];
        let records = normalize_future(&rows, &query());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].arrival.iata, "LAX");
        assert_eq!(records[0].flight_number, "DL423");
        assert!(records[0].is_schedule_data);
    }

    #[test]
    fn overnight_arrival_rolls_to_the_next_day() {
        let rows = vec![future_row("LAX", "23:30", "01:15")];
        let records = normalize_future(&rows, &query());
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(
            record.arrival_date,
            NaiveDate::from_ymd_opt(2026, 8, 9).unwrap()
        );
        assert_eq!(record.duration.total_minutes(), 105);
    }

    #[test]
    fn same_day_future_times_keep_the_query_date() {
        let rows = vec![future_row("LAX", "09:15", "12:40")];
        let records = normalize_future(&rows, &query());
        let record = &records[0];
        assert_eq!(record.departure_date, record.arrival_date);
        assert_eq!(record.duration.total_minutes(), 205);
    }
}
