use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::Rng;
use tracing::{debug, warn};

use crate::wire::ApiEnvelope;

/// Logical provider endpoints. `key()` doubles as the rate-governor key so
/// the governor and the client can never disagree on what they are gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderEndpoint {
    Flights,
    FlightsFuture,
}

impl ProviderEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            ProviderEndpoint::Flights => "flights",
            ProviderEndpoint::FlightsFuture => "flightsFuture",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ProviderEndpoint::Flights => "flights",
            ProviderEndpoint::FlightsFuture => "future-schedule",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub endpoint: ProviderEndpoint,
    pub params: Vec<(String, String)>,
}

impl ProviderRequest {
    /// Current/historical flights between two airports on one date.
    pub fn current(origin: &str, destination: &str, date: NaiveDate) -> Self {
        Self {
            endpoint: ProviderEndpoint::Flights,
            params: vec![
                ("dep_iata".to_string(), origin.to_string()),
                ("arr_iata".to_string(), destination.to_string()),
                ("flight_date".to_string(), date.to_string()),
            ],
        }
    }

    /// Future schedules departing one airport on one date. The endpoint has
    /// no counterpart-airport filter; the normalizer filters client-side.
    pub fn future_departures(airport: &str, date: NaiveDate) -> Self {
        Self {
            endpoint: ProviderEndpoint::FlightsFuture,
            params: vec![
                ("iataCode".to_string(), airport.to_string()),
                ("type".to_string(), "departure".to_string()),
                ("date".to_string(), date.to_string()),
            ],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Provider rate limit hit: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Provider error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Undecodable provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }

    /// Transient transport-level failures worth a bounded retry. Provider
    /// payload errors and 4xx responses are excluded: a malformed request
    /// will not succeed by retrying.
    pub fn is_transient_transport(&self) -> bool {
        match self {
            ProviderError::Network(_) | ProviderError::Timeout(_) => true,
            ProviderError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// One HTTP exchange against the provider, no retry. The seam tests and the
/// service use to substitute scripted gateways for the real transport.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    async fn fetch(&self, request: &ProviderRequest) -> Result<ApiEnvelope, ProviderError>;
}

pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    access_key: String,
    timeout: Duration,
}

impl HttpGateway {
    pub fn new(base_url: &str, access_key: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl ProviderGateway for HttpGateway {
    async fn fetch(&self, request: &ProviderRequest) -> Result<ApiEnvelope, ProviderError> {
        let url = format!("{}/{}", self.base_url, request.endpoint.path());
        let mut query: Vec<(&str, &str)> = vec![("access_key", self.access_key.as_str())];
        for (name, value) in &request.params {
            query.push((name.as_str(), value.as_str()));
        }

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout)
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|raw| raw.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited {
                message: "HTTP 429 Too Many Requests".to_string(),
                retry_after,
            });
        }
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        // The provider embeds errors in 200 bodies.
        if let Some(error) = &envelope.error {
            if error.is_rate_limit() {
                return Err(ProviderError::RateLimited {
                    message: error.message.clone(),
                    retry_after: None,
                });
            }
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                message: format!("{}: {}", error.code, error.message),
            });
        }

        Ok(envelope)
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_rate_limit_retries: u32,
    pub max_transport_retries: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rate_limit_retries: 3,
            max_transport_retries: 2,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (0-based): base x multiplier^attempt,
    /// capped, plus up to 10% jitter to spread concurrent retriers.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);
        let jitter = rand::thread_rng().gen_range(0.0..0.1) * capped;
        Duration::from_millis((capped + jitter) as u64)
    }
}

/// Retrying wrapper around a gateway. Rate-limit responses are retried with
/// exponential backoff; transient transport failures get a smaller budget;
/// everything else propagates immediately.
pub struct UpstreamClient {
    gateway: Arc<dyn ProviderGateway>,
    policy: RetryPolicy,
}

impl UpstreamClient {
    pub fn new(gateway: Arc<dyn ProviderGateway>, policy: RetryPolicy) -> Self {
        Self { gateway, policy }
    }

    pub async fn call(&self, request: &ProviderRequest) -> Result<ApiEnvelope, ProviderError> {
        let mut rate_limit_attempts = 0u32;
        let mut transport_attempts = 0u32;
        loop {
            match self.gateway.fetch(request).await {
                Ok(envelope) => {
                    debug!(
                        "{} returned {} rows",
                        request.endpoint.path(),
                        envelope.data.len()
                    );
                    return Ok(envelope);
                }
                Err(e) if e.is_rate_limit()
                    && rate_limit_attempts < self.policy.max_rate_limit_retries =>
                {
                    let delay = self.policy.backoff_delay(rate_limit_attempts);
                    rate_limit_attempts += 1;
                    warn!(
                        "Rate limited on {} (retry {}/{}), backing off {}ms",
                        request.endpoint.path(),
                        rate_limit_attempts,
                        self.policy.max_rate_limit_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient_transport()
                    && transport_attempts < self.policy.max_transport_retries =>
                {
                    let delay = self.policy.backoff_delay(transport_attempts);
                    transport_attempts += 1;
                    warn!(
                        "Transport failure on {} (retry {}/{}): {}",
                        request.endpoint.path(),
                        transport_attempts,
                        self.policy.max_transport_retries,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Gateway that plays back a fixed script of outcomes and records call
    /// instants so tests can assert on retry timing.
    struct ScriptedGateway {
        script: Mutex<Vec<Result<ApiEnvelope, ProviderError>>>,
        calls: AtomicUsize,
        call_times: Mutex<Vec<Instant>>,
    }

    impl ScriptedGateway {
        fn new(script: Vec<Result<ApiEnvelope, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
                call_times: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderGateway for ScriptedGateway {
        async fn fetch(&self, _request: &ProviderRequest) -> Result<ApiEnvelope, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.call_times.lock().unwrap().push(Instant::now());
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Ok(ApiEnvelope::default());
            }
            script.remove(0)
        }
    }

    fn rate_limited() -> ProviderError {
        ProviderError::RateLimited {
            message: "usage limit".to_string(),
            retry_after: None,
        }
    }

    fn request() -> ProviderRequest {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 8, 8).unwrap();
        ProviderRequest::current("JFK", "LAX", date)
    }

    #[tokio::test(start_paused = true)]
    async fn three_rate_limits_then_success_retries_exactly_three_times() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(rate_limited()),
            Err(rate_limited()),
            Err(rate_limited()),
            Ok(ApiEnvelope::default()),
        ]));
        let client = UpstreamClient::new(gateway.clone(), RetryPolicy::default());

        let result = client.call(&request()).await;
        assert!(result.is_ok());
        assert_eq!(gateway.calls(), 4);

        // Backoff between consecutive attempts must be non-decreasing.
        let times = gateway.call_times.lock().unwrap();
        let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(gaps.len(), 3);
        assert!(gaps[0] <= gaps[1] && gaps[1] <= gaps[2], "gaps: {:?}", gaps);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_rate_limit_budget_surfaces_rate_limited() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(rate_limited()),
            Err(rate_limited()),
            Err(rate_limited()),
            Err(rate_limited()),
        ]));
        let client = UpstreamClient::new(gateway.clone(), RetryPolicy::default());

        let result = client.call(&request()).await;
        assert!(matches!(result, Err(ProviderError::RateLimited { .. })));
        assert_eq!(gateway.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_payload_errors_are_not_retried() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Err(ProviderError::Upstream {
            status: 200,
            message: "invalid_access_key".to_string(),
        })]));
        let client = UpstreamClient::new(gateway.clone(), RetryPolicy::default());

        let result = client.call(&request()).await;
        assert!(matches!(result, Err(ProviderError::Upstream { .. })));
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_network_failures_get_a_bounded_budget() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(ProviderError::Network("connection reset".to_string())),
            Err(ProviderError::Upstream {
                status: 503,
                message: "unavailable".to_string(),
            }),
            Ok(ApiEnvelope::default()),
        ]));
        let client = UpstreamClient::new(gateway.clone(), RetryPolicy::default());

        let result = client.call(&request()).await;
        assert!(result.is_ok());
        assert_eq!(gateway.calls(), 3);
    }

    #[test]
    fn backoff_delay_is_capped() {
        let policy = RetryPolicy::default();
        let delay = policy.backoff_delay(30);
        // Cap plus at most 10% jitter.
        assert!(delay <= Duration::from_millis(11_000));
    }
}
