use crate::domain::models::SurveyTemplate;
use crate::error::AnalyticsResult;
use crate::store::ResponseStore;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_surveys: usize,
    pub total_respondents: i64,
    pub response_rate: String,
    pub benchmark_score: String,
}

impl DashboardSummary {
    pub fn empty() -> Self {
        Self {
            total_surveys: 0,
            total_respondents: 0,
            response_rate: "0%".to_string(),
            benchmark_score: "0".to_string(),
        }
    }
}

pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_PATTERN.is_match(candidate)
}

/// Syntactically valid addresses in a comma separated recipient list.
pub fn count_recipients(emails: &str) -> usize {
    emails
        .split(',')
        .map(str::trim)
        .filter(|e| is_valid_email(e))
        .count()
}

fn was_sent(survey: &SurveyTemplate, now: DateTime<Utc>) -> bool {
    survey.date < now
        && survey
            .emails
            .as_deref()
            .map(|e| !e.trim().is_empty())
            .unwrap_or(false)
}

pub fn format_response_rate(respondents: i64, recipients: usize) -> String {
    if recipients == 0 {
        return "0%".to_string();
    }
    let rate = (respondents as f64 / recipients as f64 * 100.0).round();
    format!("{}%", rate as i64)
}

pub async fn compute_dashboard_summary(
    store: &dyn ResponseStore,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> AnalyticsResult<DashboardSummary> {
    let surveys = store.surveys_for_owner(user_id).await?;
    if surveys.is_empty() {
        return Ok(DashboardSummary::empty());
    }

    let sent: Vec<&SurveyTemplate> = surveys.iter().filter(|s| was_sent(s, now)).collect();
    let total_recipients: usize = sent
        .iter()
        .filter_map(|s| s.emails.as_deref())
        .map(count_recipients)
        .sum();

    let counts = try_join_all(sent.iter().map(|s| store.response_count(s.id))).await?;
    let total_respondents: i64 = counts.into_iter().sum();

    let survey_ids: Vec<Uuid> = surveys.iter().map(|s| s.id).collect();
    let benchmark_score = store
        .recommendation_totals(&survey_ids)
        .await?
        .mean()
        .map(|mean| format!("{:.1}", mean))
        .unwrap_or_else(|| "0".to_string());

    tracing::debug!(
        "Dashboard for {}: {} surveys, {} sent, {} recipients, {} respondents",
        user_id,
        surveys.len(),
        sent.len(),
        total_recipients,
        total_respondents
    );

    Ok(DashboardSummary {
        total_surveys: surveys.len(),
        total_respondents,
        response_rate: format_response_rate(total_respondents, total_recipients),
        benchmark_score,
    })
}
