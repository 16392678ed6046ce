use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use volare_api::{app, AppState};
use volare_provider::client::ProviderEndpoint;
use volare_provider::pricing::{PriceEstimator, PricingConfig};
use volare_provider::{FlightSearchService, HttpGateway, RetryPolicy, ServiceConfig, UpstreamClient};
use volare_store::app_config::Config;
use volare_store::{MemoryCache, RateGovernor, RedisCache, ResultCache};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "volare_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Volare API on port {}", config.server.port);

    let cache: Arc<dyn ResultCache> = match &config.redis.url {
        Some(url) => {
            let redis = RedisCache::new(url).expect("Failed to open Redis client");
            tracing::info!("Result cache backed by Redis");
            Arc::new(redis)
        }
        None => {
            tracing::info!("No redis.url configured; using in-process cache");
            Arc::new(MemoryCache::new())
        }
    };

    let governor = Arc::new(
        RateGovernor::new(Duration::from_millis(config.rate.current_interval_ms)).with_interval(
            ProviderEndpoint::FlightsFuture.key(),
            Duration::from_secs(config.rate.future_cooldown_seconds),
        ),
    );

    let gateway = HttpGateway::new(
        &config.provider.base_url,
        &config.provider.access_key,
        Duration::from_secs(config.provider.timeout_seconds),
    )
    .expect("Failed to build provider HTTP client");

    let client = UpstreamClient::new(
        Arc::new(gateway),
        RetryPolicy {
            max_rate_limit_retries: config.provider.max_rate_limit_retries,
            max_transport_retries: config.provider.max_transport_retries,
            base_delay: Duration::from_millis(config.provider.backoff_base_ms),
            multiplier: config.provider.backoff_multiplier,
            max_delay: Duration::from_millis(config.provider.backoff_cap_ms),
        },
    );

    let service = FlightSearchService::new(
        cache,
        governor,
        client,
        PriceEstimator::new(PricingConfig::default()),
        ServiceConfig {
            current_ttl: Duration::from_secs(config.cache.current_ttl_seconds),
            future_ttl: Duration::from_secs(config.cache.future_ttl_seconds),
        },
    );

    let state = AppState {
        search: Arc::new(service),
    };
    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
