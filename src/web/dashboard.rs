use crate::analytics::dashboard::DashboardSummary;
use crate::analytics::service::Entitlements;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{extract::State, routing::get, Json, Router};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/entitlements", get(entitlements))
        .route("/summary", get(summary))
        .with_state(state)
}

async fn entitlements(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Json<Entitlements> {
    Json(state.analytics.entitlements(user_id).await)
}

/// Store failures degrade to the zero summary instead of failing the page.
async fn summary(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Json<DashboardSummary> {
    let summary = match state.analytics.dashboard_summary(user_id).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Failed to build dashboard summary for {}: {}", user_id, e);
            DashboardSummary::empty()
        }
    };
    Json(summary)
}
