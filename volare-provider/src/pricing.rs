use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use volare_core::flight::{FlightDuration, FlightRecord};
use volare_core::query::TravelClass;

/// Duration past which an unknown-country route is priced as international.
const INTERNATIONAL_DURATION_HOURS: u32 = 5;

#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Inclusive base fare range for domestic routes, in whole currency units.
    pub domestic_base: (u32, u32),
    /// Inclusive base fare range for international routes.
    pub international_base: (u32, u32),
    /// Added per flight hour before the class multiplier is applied.
    pub per_hour: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            domestic_base: (80, 250),
            international_base: (300, 900),
            per_hour: 40,
        }
    }
}

/// Placeholder fare estimator. The provider carries no pricing data, so
/// fares are derived from travel class and duration with bounded
/// randomness. Kept behind this one type so a real pricing integration can
/// replace it without touching normalization.
pub struct PriceEstimator {
    config: PricingConfig,
}

impl PriceEstimator {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn estimate(
        &self,
        travel_class: TravelClass,
        duration: FlightDuration,
        international: bool,
    ) -> u32 {
        self.estimate_with_rng(travel_class, duration, international, &mut rand::thread_rng())
    }

    /// Deterministic variant for tests: the same seed always yields the same
    /// fare.
    pub fn estimate_with_rng<R: Rng>(
        &self,
        travel_class: TravelClass,
        duration: FlightDuration,
        international: bool,
        rng: &mut R,
    ) -> u32 {
        let (low, high) = if international {
            self.config.international_base
        } else {
            self.config.domestic_base
        };
        let base = rng.gen_range(low..=high) as f64;
        let hours = duration.total_minutes() as f64 / 60.0;
        let fare = (base + hours * self.config.per_hour as f64) * travel_class.price_multiplier();
        fare.round().max(1.0) as u32
    }
}

/// A route is international when the two countries differ. The provider
/// frequently omits country data; long flights then default to
/// international.
pub fn route_is_international(record: &FlightRecord) -> bool {
    let origin = record.departure.country.trim();
    let destination = record.arrival.country.trim();
    if !origin.is_empty() && !destination.is_empty() {
        return !origin.eq_ignore_ascii_case(destination);
    }
    record.duration.hours >= INTERNATIONAL_DURATION_HOURS
}

/// Seeded RNG helper shared by the test suites.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
