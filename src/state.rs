use crate::analytics::service::AnalyticsService;
use crate::middleware::RateLimiter;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub analytics: AnalyticsService,
    pub session_key: Vec<u8>,
    pub summary_limiter: RateLimiter, // per-user window, reports Retry-After
}

pub type SharedState = Arc<AppState>;
