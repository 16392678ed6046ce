use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use volare_core::SearchError;

/// Wrapper giving every `SearchError` a stable HTTP mapping. The body
/// always carries `error` and `kind`; date validation failures add the
/// structured `status` so the UI can render actionable guidance.
#[derive(Debug)]
pub struct ApiError(pub SearchError);

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            SearchError::InvalidQuery(_) => (StatusCode::BAD_REQUEST, "invalid_query"),
            SearchError::DateOutOfRange { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "date_out_of_range")
            }
            SearchError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            SearchError::UpstreamUnavailable(_) => {
                tracing::error!("Upstream failure surfaced to client: {}", self.0);
                (StatusCode::BAD_GATEWAY, "upstream_unavailable")
            }
        };

        let body = match &self.0 {
            SearchError::DateOutOfRange {
                status: date_status,
                message,
            } => json!({ "error": message, "kind": kind, "status": date_status }),
            other => json!({ "error": other.to_string(), "kind": kind }),
        };

        let mut response = (status, Json(body)).into_response();
        if let SearchError::RateLimited {
            retry_after: Some(wait),
        } = &self.0
        {
            if let Ok(value) = HeaderValue::from_str(&wait.as_secs().max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use volare_core::routing::DateStatus;

    #[test]
    fn error_kinds_map_to_distinct_statuses() {
        let invalid = ApiError(SearchError::InvalidQuery("bad".into())).into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let out_of_range = ApiError(SearchError::DateOutOfRange {
            status: DateStatus::FarFuture,
            message: "too far".into(),
        })
        .into_response();
        assert_eq!(out_of_range.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let unavailable =
            ApiError(SearchError::UpstreamUnavailable("down".into())).into_response();
        assert_eq!(unavailable.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn rate_limited_carries_retry_after() {
        let response = ApiError(SearchError::RateLimited {
            retry_after: Some(Duration::from_secs(42)),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER),
            Some(&HeaderValue::from_static("42"))
        );
    }
}
