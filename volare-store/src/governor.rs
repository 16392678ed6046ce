use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Outcome of a rate-window check. `MustWait` carries the remaining
/// cool-down so the caller can decide between cache, synthetic data, or a
/// genuine wait; the governor itself never sleeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    Granted,
    MustWait(Duration),
}

/// Tracks the last granted call per logical endpoint and enforces a minimum
/// spacing between grants. One grant per interval per key; callers arriving
/// inside the window are told how long is left instead of being blocked.
pub struct RateGovernor {
    default_interval: Duration,
    intervals: HashMap<String, Duration>,
    last_grant: Mutex<HashMap<String, Instant>>,
}

impl RateGovernor {
    pub fn new(default_interval: Duration) -> Self {
        Self {
            default_interval,
            intervals: HashMap::new(),
            last_grant: Mutex::new(HashMap::new()),
        }
    }

    /// Override the spacing interval for one endpoint key.
    pub fn with_interval(mut self, endpoint: &str, interval: Duration) -> Self {
        self.intervals.insert(endpoint.to_string(), interval);
        self
    }

    pub async fn try_acquire(&self, endpoint: &str) -> Acquisition {
        let interval = self
            .intervals
            .get(endpoint)
            .copied()
            .unwrap_or(self.default_interval);
        let now = Instant::now();
        let mut last_grant = self.last_grant.lock().await;
        match last_grant.get(endpoint) {
            Some(previous) => {
                let elapsed = now.duration_since(*previous);
                if elapsed >= interval {
                    last_grant.insert(endpoint.to_string(), now);
                    Acquisition::Granted
                } else {
                    let remaining = interval - elapsed;
                    debug!(
                        "Rate window closed for {}: {}ms remaining",
                        endpoint,
                        remaining.as_millis()
                    );
                    Acquisition::MustWait(remaining)
                }
            }
            None => {
                last_grant.insert(endpoint.to_string(), now);
                Acquisition::Granted
            }
        }
    }
}
