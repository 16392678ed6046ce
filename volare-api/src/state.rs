use std::sync::Arc;

use volare_provider::FlightSearchService;

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<FlightSearchService>,
}
