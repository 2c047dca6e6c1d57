use crate::analytics::benchmark::{withhold_national, BenchmarkGate};
use crate::analytics::custom::{summarize_custom_questions, CustomQuestionSummary};
use crate::analytics::dashboard::{compute_dashboard_summary, DashboardSummary};
use crate::analytics::metrics::{build_snapshot, MetricSnapshot, NationalComparison};
use crate::analytics::summary::{generate_summary, SummaryGenerator, SummaryResult};
use crate::domain::models::{DateRange, SubscriptionTier, SurveyTemplate};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::store::ResponseStore;
use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// One independently loaded section of the analytics page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "camelCase")]
pub enum Panel<T> {
    Ready(T),
    Unavailable { message: String },
}

impl<T> Panel<T> {
    fn from_result(result: AnalyticsResult<T>, panel: &str, survey_id: Uuid) -> Self {
        match result {
            Ok(value) => Panel::Ready(value),
            Err(e) => {
                tracing::warn!("Panel '{}' unavailable for survey {}: {}", panel, survey_id, e);
                Panel::Unavailable {
                    message: format!("{panel} could not be loaded"),
                }
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(value) => Some(value),
            Panel::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsView {
    pub survey_id: Uuid,
    pub survey_name: String,
    pub range: DateRange,
    pub tier: SubscriptionTier,
    pub national_access: bool,
    pub snapshot: Panel<MetricSnapshot>,
    pub custom_questions: Panel<Vec<CustomQuestionSummary>>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlements {
    pub tier: SubscriptionTier,
    pub national_access: bool,
}

#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn ResponseStore>,
    gate: BenchmarkGate,
    summarizer: Arc<dyn SummaryGenerator>,
    timeout: Duration,
    min_summary_responses: u32,
}

impl AnalyticsService {
    pub fn new(
        store: Arc<dyn ResponseStore>,
        gate: BenchmarkGate,
        summarizer: Arc<dyn SummaryGenerator>,
        timeout: Duration,
        min_summary_responses: u32,
    ) -> Self {
        Self {
            store,
            gate: gate.with_lookup_timeout(timeout),
            summarizer,
            timeout,
            min_summary_responses,
        }
    }

    async fn bounded<T, F>(&self, what: &str, fut: F) -> AnalyticsResult<T>
    where
        F: Future<Output = AnalyticsResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Store query '{}' timed out after {:?}", what, self.timeout);
                Err(AnalyticsError::StorageUnavailable(format!("{what} timed out")))
            }
        }
    }

    async fn owned_survey(&self, user_id: Uuid, survey_id: Uuid) -> AnalyticsResult<SurveyTemplate> {
        let survey = self
            .bounded("survey", self.store.survey(survey_id))
            .await?
            .filter(|s| s.owner_id == user_id);
        survey.ok_or(AnalyticsError::SurveyNotFound(survey_id))
    }

    pub async fn entitlements(&self, user_id: Uuid) -> Entitlements {
        let (tier, national_access) = self.gate.resolve(user_id).await;
        Entitlements {
            tier,
            national_access,
        }
    }

    async fn custom_question_panel(
        &self,
        survey_id: Uuid,
        range: &DateRange,
    ) -> AnalyticsResult<Vec<CustomQuestionSummary>> {
        let questions = self
            .bounded("custom questions", self.store.custom_questions(survey_id))
            .await?;
        let ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
        let answers = self
            .bounded("custom answers", self.store.custom_answers(&ids, range))
            .await?;
        Ok(summarize_custom_questions(&questions, &answers))
    }

    /// Builds every panel of the survey analytics page. Only a missing or
    /// foreign survey is an error; any other failure degrades its own panel.
    pub async fn survey_analytics(
        &self,
        user_id: Uuid,
        survey_id: Uuid,
        range: DateRange,
    ) -> AnalyticsResult<AnalyticsView> {
        let survey = self.owned_survey(user_id, survey_id).await?;

        let (responses, (tier, national_access), custom) = tokio::join!(
            self.bounded("responses", self.store.fetch_responses(survey_id, &range)),
            self.gate.resolve(user_id),
            self.custom_question_panel(survey_id, &range),
        );

        let national = if national_access {
            match self
                .bounded("national totals", self.store.national_totals(&range))
                .await
            {
                Ok(totals) => Some(NationalComparison::from_totals(&totals)),
                Err(e) => {
                    tracing::warn!("National comparison unavailable for survey {}: {}", survey_id, e);
                    None
                }
            }
        } else {
            None
        };

        let snapshot = responses.map(|rows| {
            let mut snapshot = build_snapshot(&rows, national.as_ref());
            if !national_access {
                withhold_national(&mut snapshot);
            }
            snapshot
        });

        tracing::debug!(
            "Analytics for survey {} (tier {}, national {})",
            survey_id,
            tier.as_str(),
            national_access
        );

        Ok(AnalyticsView {
            survey_id,
            survey_name: survey.name,
            range,
            tier,
            national_access,
            snapshot: Panel::from_result(snapshot, "responses", survey_id),
            custom_questions: Panel::from_result(custom, "custom questions", survey_id),
        })
    }

    pub async fn dashboard_summary(&self, user_id: Uuid) -> AnalyticsResult<DashboardSummary> {
        self.bounded(
            "dashboard",
            compute_dashboard_summary(self.store.as_ref(), user_id, Utc::now()),
        )
        .await
    }

    /// The narrative never carries national data, so the gate is not consulted.
    pub async fn narrative_summary(
        &self,
        user_id: Uuid,
        survey_id: Uuid,
        range: DateRange,
    ) -> AnalyticsResult<SummaryResult> {
        self.owned_survey(user_id, survey_id).await?;
        let responses = self
            .bounded("responses", self.store.fetch_responses(survey_id, &range))
            .await?;
        let snapshot = build_snapshot(&responses, None);
        Ok(generate_summary(&snapshot, self.summarizer.as_ref(), self.min_summary_responses).await)
    }
}
