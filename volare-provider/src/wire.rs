//! Serde models for the two provider payload shapes. The current endpoint
//! speaks snake_case with full timestamps; the future-schedule endpoint
//! speaks camelCase with bare time-of-day strings. Items are decoded
//! per-row from the envelope so one bad row never sinks a whole page.

use serde::Deserialize;

/// Top-level provider response. The provider embeds errors in a 200 body,
/// so `error` and `data` are both optional here and disambiguated by the
/// gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub info: Option<String>,
}

impl ApiErrorBody {
    /// Provider-side throttling shows up as one of a few error codes, or
    /// occasionally only in prose.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self.code.as_str(),
            "rate_limit_reached" | "usage_limit_reached" | "too_many_requests"
        ) || self.message.to_ascii_lowercase().contains("rate limit")
            || self.message.to_ascii_lowercase().contains("usage limit")
    }
}

/// One row from the current/historical `flights` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentFlight {
    pub flight_date: Option<String>,
    pub flight_status: Option<String>,
    pub departure: Option<CurrentStop>,
    pub arrival: Option<CurrentStop>,
    pub airline: Option<CurrentAirline>,
    pub flight: Option<CurrentDesignator>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentStop {
    pub airport: Option<String>,
    pub iata: Option<String>,
    pub timezone: Option<String>,
    pub terminal: Option<String>,
    pub gate: Option<String>,
    pub delay: Option<u32>,
    pub scheduled: Option<String>,
    pub estimated: Option<String>,
    pub actual: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentAirline {
    pub name: Option<String>,
    pub iata: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentDesignator {
    pub number: Option<String>,
    pub iata: Option<String>,
}

/// One row from the `flightsFuture` schedule endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FutureFlight {
    pub weekday: Option<String>,
    pub departure: Option<FutureStop>,
    pub arrival: Option<FutureStop>,
    pub airline: Option<FutureAirline>,
    pub flight: Option<FutureDesignator>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureStop {
    pub iata_code: Option<String>,
    pub icao_code: Option<String>,
    pub terminal: Option<String>,
    pub gate: Option<String>,
    pub scheduled_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureAirline {
    pub name: Option<String>,
    pub iata_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureDesignator {
    pub number: Option<String>,
    pub iata_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_with_embedded_error_decodes() {
        let body = json!({
            "error": {
                "code": "usage_limit_reached",
                "message": "Your monthly usage limit has been reached."
            }
        });
        let envelope: ApiEnvelope = serde_json::from_value(body).unwrap();
        let error = envelope.error.unwrap();
        assert!(error.is_rate_limit());
        assert!(envelope.data.is_empty());
    }

    #[test]
    fn non_limit_error_is_not_flagged() {
        let error = ApiErrorBody {
            code: "invalid_access_key".to_string(),
            message: "You have not supplied a valid API Access Key.".to_string(),
            info: None,
        };
        assert!(!error.is_rate_limit());
    }

    #[test]
    fn future_row_decodes_camel_case_fields() {
        let row = json!({
            "weekday": "5",
            "departure": { "iataCode": "JFK", "terminal": "4", "scheduledTime": "09:15" },
            "arrival": { "iataCode": "LAX", "scheduledTime": "12:40" },
            "airline": { "name": "Delta Air Lines", "iataCode": "DL" },
            "flight": { "number": "423", "iataCode": "DL423" }
        });
        let flight: FutureFlight = serde_json::from_value(row).unwrap();
        let departure = flight.departure.unwrap();
        assert_eq!(departure.iata_code.as_deref(), Some("JFK"));
        assert_eq!(departure.scheduled_time.as_deref(), Some("09:15"));
    }
}
