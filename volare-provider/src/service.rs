use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use volare_core::flight::{DataSource, FlightRecord, FlightSearchResult, SearchMeta};
use volare_core::query::SearchQuery;
use volare_core::routing::{self, DateStatus, SearchScope};
use volare_core::SearchError;
use volare_store::{Acquisition, RateGovernor, ResultCache};

use crate::client::{ProviderError, ProviderRequest, UpstreamClient};
use crate::normalize;
use crate::pricing::{self, PriceEstimator};
use crate::synthetic;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub current_ttl: Duration,
    pub future_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            current_ttl: Duration::from_secs(300),
            future_ttl: Duration::from_secs(6 * 3600),
        }
    }
}

/// The consumer-facing search pipeline: cache first, then the rate
/// governor, then the upstream client, then normalization and pricing,
/// writing the result back to the cache on the way out. All collaborators
/// are injected so tests can substitute fakes.
pub struct FlightSearchService {
    cache: Arc<dyn ResultCache>,
    governor: Arc<RateGovernor>,
    client: UpstreamClient,
    estimator: PriceEstimator,
    config: ServiceConfig,
}

impl FlightSearchService {
    pub fn new(
        cache: Arc<dyn ResultCache>,
        governor: Arc<RateGovernor>,
        client: UpstreamClient,
        estimator: PriceEstimator,
        config: ServiceConfig,
    ) -> Self {
        Self {
            cache,
            governor,
            client,
            estimator,
            config,
        }
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<FlightSearchResult, SearchError> {
        self.search_at(query, Utc::now().date_naive()).await
    }

    /// Same as `search` with "today" injected, so tests control the clock.
    pub async fn search_at(
        &self,
        query: &SearchQuery,
        today: NaiveDate,
    ) -> Result<FlightSearchResult, SearchError> {
        let scope = routing::classify(query.departure_date, today);
        if scope == SearchScope::Future {
            let verdict = routing::validate_future(query.departure_date, today);
            if verdict.status != DateStatus::Valid {
                return Err(SearchError::DateOutOfRange {
                    status: verdict.status,
                    message: verdict.message,
                });
            }
        }

        let key = query.cache_key();
        if let Some(mut hit) = self.cache.get(&key).await {
            debug!("Cache hit for {}", key);
            hit.meta.served_from_cache = true;
            return Ok(hit);
        }

        let request = match scope {
            SearchScope::Current => ProviderRequest::current(
                query.origin.as_str(),
                query.destination.as_str(),
                query.departure_date,
            ),
            SearchScope::Future => {
                ProviderRequest::future_departures(query.origin.as_str(), query.departure_date)
            }
        };

        match self.governor.try_acquire(request.endpoint.key()).await {
            Acquisition::Granted => {}
            Acquisition::MustWait(remaining) => {
                warn!(
                    "Rate window closed for {} ({}s left), serving placeholder data",
                    request.endpoint.key(),
                    remaining.as_secs()
                );
                return Ok(synthetic::generate_fallback(
                    query,
                    &self.estimator,
                    format!(
                        "Provider cool-down in effect (about {}s remaining); showing estimated schedules",
                        remaining.as_secs().max(1)
                    ),
                ));
            }
        }

        let envelope = match self.client.call(&request).await {
            Ok(envelope) => envelope,
            Err(e @ ProviderError::RateLimited { .. }) => {
                warn!("Retry budget exhausted, serving placeholder data: {}", e);
                return Ok(synthetic::generate_fallback(
                    query,
                    &self.estimator,
                    "Provider rate limit reached; showing estimated schedules".to_string(),
                ));
            }
            Err(e @ (ProviderError::Network(_) | ProviderError::Timeout(_))) => {
                warn!("Provider unreachable, serving placeholder data: {}", e);
                return Ok(synthetic::generate_fallback(
                    query,
                    &self.estimator,
                    "Flight data provider is unreachable; showing estimated schedules".to_string(),
                ));
            }
            Err(ProviderError::Malformed(message)) => {
                return Err(SearchError::UpstreamUnavailable(format!(
                    "undecodable provider response: {}",
                    message
                )));
            }
            Err(ProviderError::Upstream { status, message }) => {
                return Err(SearchError::UpstreamUnavailable(format!(
                    "provider returned {}: {}",
                    status, message
                )));
            }
        };

        let normalized = match scope {
            SearchScope::Current => normalize::normalize_current(&envelope.data, query),
            SearchScope::Future => normalize::normalize_future(&envelope.data, query),
        };

        let flights: Vec<FlightRecord> = normalized
            .into_iter()
            .map(|record| {
                let international = pricing::route_is_international(&record);
                let price =
                    self.estimator
                        .estimate(query.travel_class, record.duration, international);
                record.with_price(price)
            })
            .collect();

        let context = if flights.is_empty() {
            Some(match scope {
                SearchScope::Current => format!(
                    "No flights found from {} to {} on {}",
                    query.origin, query.destination, query.departure_date
                ),
                SearchScope::Future => format!(
                    "No published schedules from {} to {} on {}; the schedule may not be out yet",
                    query.origin, query.destination, query.departure_date
                ),
            })
        } else {
            None
        };

        let result = FlightSearchResult {
            flights,
            meta: SearchMeta {
                source: match scope {
                    SearchScope::Current => DataSource::CurrentApi,
                    SearchScope::Future => DataSource::FutureApi,
                },
                total_upstream: envelope.pagination.as_ref().map(|page| page.total),
                served_from_cache: false,
                context,
            },
        };

        let ttl = match scope {
            SearchScope::Current => self.config.current_ttl,
            SearchScope::Future => self.config.future_ttl,
        };
        self.cache.set(&key, &result, ttl).await;
        info!(
            "Search {} resolved: {} flights via {:?}",
            key,
            result.flights.len(),
            result.meta.source
        );
        Ok(result)
    }
}
