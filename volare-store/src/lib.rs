pub mod app_config;
pub mod cache;
pub mod governor;

pub use cache::{MemoryCache, RedisCache, ResultCache};
pub use governor::{Acquisition, RateGovernor};
