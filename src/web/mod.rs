pub mod analytics;
pub mod dashboard;
pub mod session;

use crate::error::AnalyticsError;
use crate::state::SharedState;
use axum::{http::StatusCode, routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/dashboard", dashboard::router(state.clone()))
        .nest("/api/surveys", analytics::router(state))
}

pub(crate) fn status_for(err: &AnalyticsError) -> StatusCode {
    match err {
        AnalyticsError::SurveyNotFound(_) => StatusCode::NOT_FOUND,
        AnalyticsError::InvalidDateRange => StatusCode::BAD_REQUEST,
        AnalyticsError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AnalyticsError::EntitlementCheckFailed(_) | AnalyticsError::SummaryGenerationFailed(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
