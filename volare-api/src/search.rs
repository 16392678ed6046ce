use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use volare_core::flight::FlightSearchResult;
use volare_core::query::{AirportCode, SearchQuery, TravelClass};
use volare_core::routing;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/flights/search", get(search_flights))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub origin: String,
    pub destination: String,
    pub date: String,
    #[serde(default)]
    pub travel_class: Option<String>,
    #[serde(default)]
    pub passengers: Option<u32>,
}

async fn search_flights(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<FlightSearchResult>, ApiError> {
    let query = build_query(&params)?;
    let result = state.search.search(&query).await?;
    Ok(Json(result))
}

fn build_query(params: &SearchParams) -> Result<SearchQuery, ApiError> {
    let origin = AirportCode::new(&params.origin)?;
    let destination = AirportCode::new(&params.destination)?;
    // Date format is checked before anything can touch the network.
    let date = routing::parse_date(&params.date)?;
    let travel_class = match params.travel_class.as_deref() {
        Some(raw) => raw.parse::<TravelClass>()?,
        None => TravelClass::default(),
    };
    let query = SearchQuery::new(
        origin,
        destination,
        date,
        travel_class,
        params.passengers.unwrap_or(1),
    )?;
    Ok(query)
}
