use crate::domain::models::{
    CustomAnswer, CustomQuestion, DateRange, SubscriptionTier, SurveyResponse, SurveyTemplate,
};
use crate::analytics::metrics::score_totals;
use crate::error::AnalyticsResult;
use crate::store::{NationalTotals, ResponseStore, ScoreTotals, TierSource};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Store backed by plain vectors. Used by demo mode and by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    surveys: Vec<SurveyTemplate>,
    responses: Vec<SurveyResponse>,
    questions: Vec<CustomQuestion>,
    answers: Vec<CustomAnswer>,
    tiers: HashMap<Uuid, SubscriptionTier>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_survey(&mut self, survey: SurveyTemplate) {
        self.surveys.push(survey);
    }

    pub fn add_response(&mut self, response: SurveyResponse) {
        self.responses.push(response);
    }

    pub fn add_custom_question(&mut self, question: CustomQuestion) {
        self.questions.push(question);
    }

    pub fn add_custom_answer(&mut self, answer: CustomAnswer) {
        self.answers.push(answer);
    }

    pub fn set_tier(&mut self, user_id: Uuid, tier: SubscriptionTier) {
        self.tiers.insert(user_id, tier);
    }

    pub fn surveys(&self) -> &[SurveyTemplate] {
        &self.surveys
    }

    fn sorted(mut responses: Vec<SurveyResponse>) -> Vec<SurveyResponse> {
        responses.sort_by_key(|r| r.submitted_at);
        responses
    }
}

/// Groups rows into the same totals the Postgres aggregates return.
pub(crate) fn totals_of(responses: &[SurveyResponse]) -> NationalTotals {
    let mut leaving: BTreeMap<String, i64> = BTreeMap::new();
    let mut answers: BTreeMap<(String, String), i64> = BTreeMap::new();
    for response in responses {
        if let Some(label) = &response.leaving_contemplation {
            *leaving.entry(label.clone()).or_insert(0) += 1;
        }
        for (key, label) in &response.likert_answers {
            if let Some(label) = label {
                *answers.entry((key.clone(), label.clone())).or_insert(0) += 1;
            }
        }
    }
    NationalTotals {
        scores: score_totals(responses),
        leaving: leaving.into_iter().collect(),
        answers: answers
            .into_iter()
            .map(|((key, label), count)| (key, label, count))
            .collect(),
    }
}

#[async_trait]
impl ResponseStore for InMemoryStore {
    async fn fetch_responses(
        &self,
        survey_id: Uuid,
        range: &DateRange,
    ) -> AnalyticsResult<Vec<SurveyResponse>> {
        let matching = self
            .responses
            .iter()
            .filter(|r| r.survey_id == survey_id && range.contains(r.submitted_at))
            .cloned()
            .collect();
        Ok(Self::sorted(matching))
    }

    async fn national_totals(&self, range: &DateRange) -> AnalyticsResult<NationalTotals> {
        let matching: Vec<SurveyResponse> = self
            .responses
            .iter()
            .filter(|r| range.contains(r.submitted_at))
            .cloned()
            .collect();
        Ok(totals_of(&matching))
    }

    async fn recommendation_totals(&self, survey_ids: &[Uuid]) -> AnalyticsResult<ScoreTotals> {
        let matching: Vec<SurveyResponse> = self
            .responses
            .iter()
            .filter(|r| survey_ids.contains(&r.survey_id))
            .cloned()
            .collect();
        Ok(score_totals(&matching))
    }

    async fn survey(&self, survey_id: Uuid) -> AnalyticsResult<Option<SurveyTemplate>> {
        Ok(self.surveys.iter().find(|s| s.id == survey_id).cloned())
    }

    async fn surveys_for_owner(&self, owner_id: Uuid) -> AnalyticsResult<Vec<SurveyTemplate>> {
        Ok(self
            .surveys
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn response_count(&self, survey_id: Uuid) -> AnalyticsResult<i64> {
        Ok(self
            .responses
            .iter()
            .filter(|r| r.survey_id == survey_id)
            .count() as i64)
    }

    async fn custom_questions(&self, survey_id: Uuid) -> AnalyticsResult<Vec<CustomQuestion>> {
        Ok(self
            .questions
            .iter()
            .filter(|q| q.survey_id == survey_id)
            .cloned()
            .collect())
    }

    async fn custom_answers(
        &self,
        question_ids: &[Uuid],
        range: &DateRange,
    ) -> AnalyticsResult<Vec<CustomAnswer>> {
        let mut answers: Vec<CustomAnswer> = self
            .answers
            .iter()
            .filter(|a| question_ids.contains(&a.question_id) && range.contains(a.submitted_at))
            .cloned()
            .collect();
        answers.sort_by_key(|a| a.submitted_at);
        Ok(answers)
    }
}

#[async_trait]
impl TierSource for InMemoryStore {
    async fn current_tier(&self, user_id: Uuid) -> AnalyticsResult<Option<SubscriptionTier>> {
        Ok(self.tiers.get(&user_id).copied())
    }
}
