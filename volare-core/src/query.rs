use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::SearchError;

/// Validated three-letter IATA airport code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AirportCode(String);

impl AirportCode {
    pub fn new(raw: &str) -> Result<Self, SearchError> {
        let trimmed = raw.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(SearchError::InvalidQuery(format!(
                "'{}' is not a valid IATA airport code",
                raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AirportCode {
    type Error = SearchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AirportCode::new(&value)
    }
}

impl From<AirportCode> for String {
    fn from(code: AirportCode) -> Self {
        code.0
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl TravelClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelClass::Economy => "ECONOMY",
            TravelClass::PremiumEconomy => "PREMIUM_ECONOMY",
            TravelClass::Business => "BUSINESS",
            TravelClass::First => "FIRST",
        }
    }

    /// Fare multiplier relative to economy.
    pub fn price_multiplier(&self) -> f64 {
        match self {
            TravelClass::Economy => 1.0,
            TravelClass::PremiumEconomy => 1.5,
            TravelClass::Business => 2.5,
            TravelClass::First => 4.0,
        }
    }
}

impl Default for TravelClass {
    fn default() -> Self {
        TravelClass::Economy
    }
}

impl FromStr for TravelClass {
    type Err = SearchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ECONOMY" => Ok(TravelClass::Economy),
            "PREMIUM_ECONOMY" => Ok(TravelClass::PremiumEconomy),
            "BUSINESS" => Ok(TravelClass::Business),
            "FIRST" => Ok(TravelClass::First),
            _ => Err(SearchError::InvalidQuery(format!(
                "'{}' is not a valid travel class",
                raw
            ))),
        }
    }
}

/// Immutable search request. Built once at the API boundary; everything
/// downstream (cache keys, routing, normalization) reads from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub origin: AirportCode,
    pub destination: AirportCode,
    pub departure_date: NaiveDate,
    pub travel_class: TravelClass,
    pub passengers: u32,
}

impl SearchQuery {
    pub fn new(
        origin: AirportCode,
        destination: AirportCode,
        departure_date: NaiveDate,
        travel_class: TravelClass,
        passengers: u32,
    ) -> Result<Self, SearchError> {
        if origin == destination {
            return Err(SearchError::InvalidQuery(
                "origin and destination must differ".to_string(),
            ));
        }
        if !(1..=9).contains(&passengers) {
            return Err(SearchError::InvalidQuery(format!(
                "passenger count must be between 1 and 9, got {}",
                passengers
            )));
        }
        Ok(Self {
            origin,
            destination,
            departure_date,
            travel_class,
            passengers,
        })
    }

    /// Cache key for this query. Origin, destination and class are already
    /// case-normalized by their constructors, so equal queries always map to
    /// the same key.
    pub fn cache_key(&self) -> String {
        format!(
            "search:{}:{}:{}:{}",
            self.origin,
            self.destination,
            self.departure_date,
            self.travel_class.as_str()
        )
    }
}
