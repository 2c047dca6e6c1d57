use crate::analytics::service::AnalyticsView;
use crate::analytics::summary::SummaryResult;
use crate::domain::models::DateRange;
use crate::state::SharedState;
use crate::web::session::UserSession;
use crate::web::status_for;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
struct RangeQuery {
    start: Option<String>,
    end: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/:id/analytics", get(survey_analytics))
        .route("/:id/summary", get(survey_summary))
        .with_state(state)
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

/// Accepts RFC3339 or a bare `YYYY-MM-DD`. A bare date covers the whole day.
fn parse_bound(raw: &str, bound: Bound) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let naive = match bound {
        Bound::Start => date.and_hms_opt(0, 0, 0)?,
        Bound::End => date.and_hms_nano_opt(23, 59, 59, 999_999_999)?,
    };
    Some(Utc.from_utc_datetime(&naive))
}

fn range_from_query(query: &RangeQuery) -> Result<DateRange, StatusCode> {
    let parse = |raw: &Option<String>, bound: Bound| -> Result<Option<DateTime<Utc>>, StatusCode> {
        match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(value) => parse_bound(value, bound)
                .map(Some)
                .ok_or(StatusCode::BAD_REQUEST),
        }
    };
    let start = parse(&query.start, Bound::Start)?;
    let end = parse(&query.end, Bound::End)?;
    DateRange::new(start, end).map_err(|e| status_for(&e))
}

async fn survey_analytics(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(survey_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<AnalyticsView>, StatusCode> {
    let range = range_from_query(&query)?;
    let view = state
        .analytics
        .survey_analytics(user_id, survey_id, range)
        .await
        .map_err(|e| {
            tracing::warn!("Analytics for survey {} refused for {}: {}", survey_id, user_id, e);
            status_for(&e)
        })?;
    Ok(Json(view))
}

async fn survey_summary(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(survey_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<SummaryResult>, Response> {
    let range = range_from_query(&query).map_err(IntoResponse::into_response)?;
    if let Err(retry_after) = state.summary_limiter.check(user_id).await {
        tracing::warn!("Summary rate limit exceeded for {}", user_id);
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, secs.max(1).to_string())],
        )
            .into_response());
    }

    let summary = state
        .analytics
        .narrative_summary(user_id, survey_id, range)
        .await
        .map_err(|e| {
            tracing::error!("Summary for survey {} failed: {}", survey_id, e);
            status_for(&e).into_response()
        })?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{SubscriptionTier, SurveyResponse, SurveyStatus, SurveyTemplate};
    use crate::store::memory::InMemoryStore;
    use crate::web::test_support::{app, get, get_json};
    use chrono::Duration;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn owned_survey(store: &mut InMemoryStore, owner: Uuid) -> Uuid {
        let base = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let id = Uuid::new_v4();
        store.add_survey(SurveyTemplate {
            id,
            owner_id: owner,
            name: "Spring pulse".to_string(),
            date: base,
            close_date: Some(base + Duration::days(14)),
            emails: Some("a@school.org, b@school.org".to_string()),
            status: SurveyStatus::Sent,
        });
        for (day, score) in [(0, 9), (3, 7)] {
            store.add_response(SurveyResponse {
                id: Uuid::new_v4(),
                survey_id: id,
                submitted_at: base + Duration::days(day),
                recommendation_score: Some(score),
                leaving_contemplation: Some("Strongly Disagree".to_string()),
                likert_answers: BTreeMap::new(),
                doing_well: Some("Team spirit".to_string()),
                could_improve: None,
            });
        }
        id
    }

    #[test]
    fn bare_dates_cover_the_whole_day() {
        let start = parse_bound("2026-03-02", Bound::Start).unwrap();
        let end = parse_bound("2026-03-02", Bound::End).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
        let last_micro = Utc.with_ymd_and_hms(2026, 3, 2, 23, 59, 59).unwrap()
            + Duration::microseconds(999_999);
        assert!(end >= last_micro);
        assert!(end < Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap());
        assert_eq!(
            parse_bound("2026-03-02T10:00:00+02:00", Bound::Start),
            Some(Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap())
        );
        assert_eq!(parse_bound("last tuesday", Bound::End), None);
    }

    #[test]
    fn empty_query_is_unbounded() {
        let range = range_from_query(&RangeQuery {
            start: Some("  ".to_string()),
            end: None,
        })
        .unwrap();
        assert_eq!(range, DateRange::unbounded());
    }

    #[tokio::test]
    async fn free_tier_payload_omits_national_fields() {
        let owner = Uuid::new_v4();
        let mut store = InMemoryStore::new();
        let survey = owned_survey(&mut store, owner);

        let (status, body) =
            get_json(&app(store, 5), &format!("/api/surveys/{survey}/analytics"), Some(owner)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nationalAccess"], false);
        assert_eq!(body["tier"], "free");

        let snapshot = body["snapshot"]["data"].as_object().unwrap();
        assert_eq!(snapshot["responseCount"], 2);
        assert_eq!(snapshot["recommendationScore"], 8.0);
        assert!(!snapshot.contains_key("nationalRecommendationAverage"));
        assert!(!snapshot.contains_key("nationalLeavingDistribution"));
    }

    #[tokio::test]
    async fn foundation_tier_payload_carries_national_fields() {
        let owner = Uuid::new_v4();
        let mut store = InMemoryStore::new();
        let survey = owned_survey(&mut store, owner);
        store.set_tier(owner, SubscriptionTier::Foundation);

        let (_, body) =
            get_json(&app(store, 5), &format!("/api/surveys/{survey}/analytics"), Some(owner)).await;
        assert_eq!(body["nationalAccess"], true);
        assert_eq!(body["snapshot"]["data"]["nationalRecommendationAverage"], 8.0);
    }

    #[tokio::test]
    async fn date_filter_applies_to_the_snapshot() {
        let owner = Uuid::new_v4();
        let mut store = InMemoryStore::new();
        let survey = owned_survey(&mut store, owner);

        let uri = format!("/api/surveys/{survey}/analytics?start=2026-03-02&end=2026-03-02");
        let (_, body) = get_json(&app(store, 5), &uri, Some(owner)).await;
        assert_eq!(body["snapshot"]["data"]["responseCount"], 1);
        assert_eq!(body["snapshot"]["data"]["recommendationScore"], 9.0);
    }

    #[tokio::test]
    async fn reversed_or_malformed_range_is_bad_request() {
        let owner = Uuid::new_v4();
        let mut store = InMemoryStore::new();
        let survey = owned_survey(&mut store, owner);
        let app = app(store, 5);

        let reversed = format!("/api/surveys/{survey}/analytics?start=2026-03-05&end=2026-03-01");
        assert_eq!(get_json(&app, &reversed, Some(owner)).await.0, StatusCode::BAD_REQUEST);

        let garbage = format!("/api/surveys/{survey}/analytics?start=yesterday");
        assert_eq!(get_json(&app, &garbage, Some(owner)).await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn another_owners_survey_is_not_found() {
        let mut store = InMemoryStore::new();
        let survey = owned_survey(&mut store, Uuid::new_v4());

        let (status, _) = get_json(
            &app(store, 5),
            &format!("/api/surveys/{survey}/analytics"),
            Some(Uuid::new_v4()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn small_sample_summary_reports_insufficient_data() {
        let owner = Uuid::new_v4();
        let mut store = InMemoryStore::new();
        let survey = owned_survey(&mut store, owner);

        let (status, body) =
            get_json(&app(store, 5), &format!("/api/surveys/{survey}/summary"), Some(owner)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "insufficientData": true }));
    }

    #[tokio::test]
    async fn summary_is_rate_limited_per_user() {
        let owner = Uuid::new_v4();
        let mut store = InMemoryStore::new();
        let survey = owned_survey(&mut store, owner);
        let app = app(store, 1);
        let uri = format!("/api/surveys/{survey}/summary");

        assert_eq!(get_json(&app, &uri, Some(owner)).await.0, StatusCode::OK);
        let limited = get(&app, &uri, Some(owner)).await;
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = limited.headers()[header::RETRY_AFTER]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=60).contains(&retry_after));

        let other = Uuid::new_v4();
        assert_eq!(get_json(&app, &uri, Some(other)).await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bare_end_date_includes_the_last_microsecond() {
        let owner = Uuid::new_v4();
        let mut store = InMemoryStore::new();
        let survey = owned_survey(&mut store, owner);
        let late = Utc.with_ymd_and_hms(2026, 3, 4, 23, 59, 59).unwrap()
            + Duration::microseconds(999_500);
        store.add_response(SurveyResponse {
            id: Uuid::new_v4(),
            survey_id: survey,
            submitted_at: late,
            recommendation_score: Some(4),
            leaving_contemplation: None,
            likert_answers: BTreeMap::new(),
            doing_well: None,
            could_improve: None,
        });

        let uri = format!("/api/surveys/{survey}/analytics?start=2026-03-04&end=2026-03-04");
        let (_, body) = get_json(&app(store, 5), &uri, Some(owner)).await;
        assert_eq!(body["snapshot"]["data"]["responseCount"], 1);
    }
}
