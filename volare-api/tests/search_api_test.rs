use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use volare_api::{app, AppState};
use volare_provider::client::{ProviderError, ProviderRequest};
use volare_provider::pricing::{PriceEstimator, PricingConfig};
use volare_provider::wire::ApiEnvelope;
use volare_provider::{
    FlightSearchService, ProviderGateway, RetryPolicy, ServiceConfig, UpstreamClient,
};
use volare_store::{MemoryCache, RateGovernor};

/// Gateway that always answers with the same canned envelope.
struct CannedGateway {
    envelope: ApiEnvelope,
}

#[async_trait]
impl ProviderGateway for CannedGateway {
    async fn fetch(&self, _request: &ProviderRequest) -> Result<ApiEnvelope, ProviderError> {
        Ok(self.envelope.clone())
    }
}

fn test_app(envelope: ApiEnvelope) -> axum::Router {
    let service = FlightSearchService::new(
        Arc::new(MemoryCache::new()),
        Arc::new(RateGovernor::new(Duration::ZERO)),
        UpstreamClient::new(Arc::new(CannedGateway { envelope }), RetryPolicy::default()),
        PriceEstimator::new(PricingConfig::default()),
        ServiceConfig::default(),
    );
    app(AppState {
        search: Arc::new(service),
    })
}

fn current_envelope_for_today() -> ApiEnvelope {
    let today = Utc::now().date_naive();
    let row = json!({
        "flight_date": today.to_string(),
        "flight_status": "scheduled",
        "departure": {
            "airport": "John F Kennedy International",
            "iata": "JFK",
            "timezone": "America/New_York",
            "scheduled": format!("{}T08:30:00+00:00", today)
        },
        "arrival": {
            "airport": "Los Angeles International",
            "iata": "LAX",
            "timezone": "America/Los_Angeles",
            "scheduled": format!("{}T14:45:00+00:00", today)
        },
        "airline": { "name": "American Airlines", "iata": "AA" },
        "flight": { "number": "100", "iata": "AA100" }
    });
    serde_json::from_value(json!({
        "pagination": { "limit": 100, "offset": 0, "count": 1, "total": 1 },
        "data": [row]
    }))
    .expect("envelope should decode")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

#[tokio::test]
async fn search_returns_normalized_priced_flights() {
    let app = test_app(current_envelope_for_today());
    let today = Utc::now().date_naive();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/v1/flights/search?origin=JFK&destination=LAX&date={}",
                    today
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let flights = body["flights"].as_array().unwrap();
    assert_eq!(flights.len(), 1);
    assert_eq!(flights[0]["airline"], "American Airlines");
    assert_eq!(flights[0]["is_real_data"], true);
    assert!(flights[0]["price"].as_u64().unwrap() > 0);
    assert_eq!(body["meta"]["source"], "current_api");
    assert_eq!(body["meta"]["served_from_cache"], false);
}

#[tokio::test]
async fn invalid_origin_is_rejected_with_400() {
    let app = test_app(ApiEnvelope::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/flights/search?origin=NEWYORK&destination=LAX&date=2026-09-15")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "invalid_query");
}

#[tokio::test]
async fn far_future_date_is_rejected_with_422() {
    let app = test_app(ApiEnvelope::default());
    let too_far = Utc::now().date_naive() + ChronoDuration::days(400);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/v1/flights/search?origin=JFK&destination=LAX&date={}",
                    too_far
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "date_out_of_range");
    assert_eq!(body["status"], "far_future");
}

#[tokio::test]
async fn health_endpoint_answers_ok() {
    let app = test_app(ApiEnvelope::default());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}
