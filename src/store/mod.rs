//! Read-only access to survey data and subscription records.
//!
//! The analytics core only ever talks to these traits, so calculators stay
//! pure and the whole pipeline can run against [`memory::InMemoryStore`].

pub mod demo;
pub mod memory;
pub mod postgres;

use crate::domain::models::{
    CustomAnswer, CustomQuestion, DateRange, SubscriptionTier, SurveyResponse, SurveyTemplate,
};
use crate::error::AnalyticsResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Sum and count of recommendation scores inside 0..=10.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreTotals {
    pub sum: i64,
    pub count: i64,
}

impl ScoreTotals {
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

/// Aggregates behind the national comparison. Labels are the raw stored
/// strings; recognising them is left to the calculators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NationalTotals {
    pub scores: ScoreTotals,
    /// `(label, count)` for the leaving-contemplation answer.
    pub leaving: Vec<(String, i64)>,
    /// `(question key, label, count)` for every wellbeing answer.
    pub answers: Vec<(String, String, i64)>,
}

#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Responses of one survey inside `range`, oldest first.
    async fn fetch_responses(
        &self,
        survey_id: Uuid,
        range: &DateRange,
    ) -> AnalyticsResult<Vec<SurveyResponse>>;

    /// Platform-wide counts inside `range`, aggregated by the store.
    async fn national_totals(&self, range: &DateRange) -> AnalyticsResult<NationalTotals>;

    /// Valid recommendation scores across the given surveys, summed by the store.
    async fn recommendation_totals(&self, survey_ids: &[Uuid]) -> AnalyticsResult<ScoreTotals>;

    async fn survey(&self, survey_id: Uuid) -> AnalyticsResult<Option<SurveyTemplate>>;

    async fn surveys_for_owner(&self, owner_id: Uuid) -> AnalyticsResult<Vec<SurveyTemplate>>;

    async fn response_count(&self, survey_id: Uuid) -> AnalyticsResult<i64>;

    async fn custom_questions(&self, survey_id: Uuid) -> AnalyticsResult<Vec<CustomQuestion>>;

    async fn custom_answers(
        &self,
        question_ids: &[Uuid],
        range: &DateRange,
    ) -> AnalyticsResult<Vec<CustomAnswer>>;
}

#[async_trait]
pub trait TierSource: Send + Sync {
    /// `None` when the user has no active subscription record.
    async fn current_tier(&self, user_id: Uuid) -> AnalyticsResult<Option<SubscriptionTier>>;
}
