//! Pure calculators over already date-filtered response rows.
//!
//! None of these functions fail: rows with missing, unrecognised or
//! out-of-range values are skipped, and an empty input produces the empty
//! shape (zero mean, zeroed buckets, empty lists). The national side is
//! folded from store-side totals instead of rows.

use crate::domain::catalogue::WELLBEING_QUESTIONS;
use crate::domain::models::{LikertLabel, SurveyResponse};
use crate::store::{NationalTotals, ScoreTotals};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

pub const MIN_RECOMMENDATION: i32 = 0;
pub const MAX_RECOMMENDATION: i32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LikertDistribution {
    #[serde(rename = "Strongly Agree")]
    pub strongly_agree: u32,
    #[serde(rename = "Agree")]
    pub agree: u32,
    #[serde(rename = "Disagree")]
    pub disagree: u32,
    #[serde(rename = "Strongly Disagree")]
    pub strongly_disagree: u32,
}

/// Bucket shares as fractions in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LikertPercentages {
    #[serde(rename = "Strongly Agree")]
    pub strongly_agree: f64,
    #[serde(rename = "Agree")]
    pub agree: f64,
    #[serde(rename = "Disagree")]
    pub disagree: f64,
    #[serde(rename = "Strongly Disagree")]
    pub strongly_disagree: f64,
}

impl LikertDistribution {
    pub fn from_answers<'a, I>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut dist = Self::default();
        for label in answers.into_iter().flatten().filter_map(LikertLabel::parse) {
            dist.record(label);
        }
        dist
    }

    pub fn record(&mut self, label: LikertLabel) {
        self.add(label, 1);
    }

    pub fn add(&mut self, label: LikertLabel, count: u32) {
        let bucket = match label {
            LikertLabel::StronglyAgree => &mut self.strongly_agree,
            LikertLabel::Agree => &mut self.agree,
            LikertLabel::Disagree => &mut self.disagree,
            LikertLabel::StronglyDisagree => &mut self.strongly_disagree,
        };
        *bucket = bucket.saturating_add(count);
    }

    /// Folds `(raw label, count)` pairs; unrecognised labels are dropped.
    pub fn from_label_counts<'a, I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let mut dist = Self::default();
        for (raw, count) in counts {
            if let Some(label) = LikertLabel::parse(raw) {
                dist.add(label, u32::try_from(count.max(0)).unwrap_or(u32::MAX));
            }
        }
        dist
    }

    pub fn total(&self) -> u32 {
        self.strongly_agree + self.agree + self.disagree + self.strongly_disagree
    }

    pub fn percentages(&self) -> LikertPercentages {
        let total = self.total();
        if total == 0 {
            return LikertPercentages::default();
        }
        let share = |count: u32| count as f64 / total as f64;
        LikertPercentages {
            strongly_agree: share(self.strongly_agree),
            agree: share(self.agree),
            disagree: share(self.disagree),
            strongly_disagree: share(self.strongly_disagree),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDistribution {
    pub question_key: String,
    pub question: String,
    pub school_responses: LikertDistribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_responses: Option<LikertDistribution>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResponses {
    pub doing_well: Vec<String>,
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub response_count: usize,
    pub recommendation_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_recommendation_average: Option<f64>,
    pub leaving_distribution: LikertDistribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_leaving_distribution: Option<LikertDistribution>,
    pub per_question_distributions: Vec<QuestionDistribution>,
    pub text_responses: TextResponses,
}

/// National side of the comparison, built from [`NationalTotals`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NationalComparison {
    pub recommendation_average: f64,
    pub leaving: LikertDistribution,
    pub per_question: BTreeMap<String, LikertDistribution>,
}

impl NationalComparison {
    pub fn from_totals(totals: &NationalTotals) -> Self {
        let mut grouped: BTreeMap<&str, Vec<(&str, i64)>> = BTreeMap::new();
        for (key, label, count) in &totals.answers {
            grouped
                .entry(key.as_str())
                .or_default()
                .push((label.as_str(), *count));
        }

        Self {
            recommendation_average: totals
                .scores
                .mean()
                .map(round_one_decimal)
                .unwrap_or(0.0),
            leaving: LikertDistribution::from_label_counts(
                totals.leaving.iter().map(|(label, count)| (label.as_str(), *count)),
            ),
            per_question: grouped
                .into_iter()
                .map(|(key, counts)| (key.to_string(), LikertDistribution::from_label_counts(counts)))
                .collect(),
        }
    }

    pub fn question(&self, key: &str) -> LikertDistribution {
        self.per_question.get(key).copied().unwrap_or_default()
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn valid_score(score: i32) -> bool {
    (MIN_RECOMMENDATION..=MAX_RECOMMENDATION).contains(&score)
}

pub fn score_totals(responses: &[SurveyResponse]) -> ScoreTotals {
    responses
        .iter()
        .filter_map(|r| r.recommendation_score)
        .filter(|score| valid_score(*score))
        .fold(ScoreTotals::default(), |totals, score| ScoreTotals {
            sum: totals.sum + score as i64,
            count: totals.count + 1,
        })
}

/// Unrounded mean of the valid scores, `None` when there are none.
pub fn recommendation_mean(responses: &[SurveyResponse]) -> Option<f64> {
    score_totals(responses).mean()
}

pub fn recommendation_score(responses: &[SurveyResponse]) -> f64 {
    recommendation_mean(responses)
        .map(round_one_decimal)
        .unwrap_or(0.0)
}

pub fn leaving_distribution(responses: &[SurveyResponse]) -> LikertDistribution {
    LikertDistribution::from_answers(
        responses
            .iter()
            .map(|r| r.leaving_contemplation.as_deref()),
    )
}

fn question_distribution(responses: &[SurveyResponse], key: &str) -> LikertDistribution {
    LikertDistribution::from_answers(
        responses
            .iter()
            .map(|r| r.likert_answers.get(key).and_then(|a| a.as_deref())),
    )
}

/// One entry per tracked wellbeing question, in catalogue order. The national
/// side is only filled when a national comparison is supplied.
pub fn question_distributions(
    school: &[SurveyResponse],
    national: Option<&NationalComparison>,
) -> Vec<QuestionDistribution> {
    WELLBEING_QUESTIONS
        .iter()
        .map(|q| QuestionDistribution {
            question_key: q.key.to_string(),
            question: q.text.to_string(),
            school_responses: question_distribution(school, q.key),
            national_responses: national.map(|n| n.question(q.key)),
        })
        .collect()
}

/// Non-blank answers to both free-text prompts, newest first.
pub fn text_responses(responses: &[SurveyResponse]) -> TextResponses {
    let mut ordered: Vec<&SurveyResponse> = responses.iter().collect();
    // sort_by_key is stable, so rows sharing a timestamp keep their input order.
    ordered.sort_by_key(|r| Reverse(r.submitted_at));

    let collect = |pick: fn(&SurveyResponse) -> Option<&String>| -> Vec<String> {
        ordered
            .iter()
            .filter_map(|r| pick(*r))
            .filter(|text| !text.trim().is_empty())
            .cloned()
            .collect()
    };

    TextResponses {
        doing_well: collect(|r| r.doing_well.as_ref()),
        improvements: collect(|r| r.could_improve.as_ref()),
    }
}

pub fn build_snapshot(
    school: &[SurveyResponse],
    national: Option<&NationalComparison>,
) -> MetricSnapshot {
    MetricSnapshot {
        response_count: school.len(),
        recommendation_score: recommendation_score(school),
        national_recommendation_average: national.map(|n| n.recommendation_average),
        leaving_distribution: leaving_distribution(school),
        national_leaving_distribution: national.map(|n| n.leaving),
        per_question_distributions: question_distributions(school, national),
        text_responses: text_responses(school),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 2, 9, 0, 0).unwrap()
    }

    pub fn blank(survey_id: Uuid, minutes: i64) -> SurveyResponse {
        SurveyResponse {
            id: Uuid::new_v4(),
            survey_id,
            submitted_at: base_time() + Duration::minutes(minutes),
            recommendation_score: None,
            leaving_contemplation: None,
            likert_answers: BTreeMap::new(),
            doing_well: None,
            could_improve: None,
        }
    }

    pub fn scored(survey_id: Uuid, score: Option<i32>) -> SurveyResponse {
        SurveyResponse {
            recommendation_score: score,
            ..blank(survey_id, 0)
        }
    }

    pub fn leaving(survey_id: Uuid, label: &str) -> SurveyResponse {
        SurveyResponse {
            leaving_contemplation: Some(label.to_string()),
            ..blank(survey_id, 0)
        }
    }

    /// National comparison over `rows`, aggregated the way a store does.
    pub fn national_of(rows: &[SurveyResponse]) -> NationalComparison {
        NationalComparison::from_totals(&crate::store::memory::totals_of(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use uuid::Uuid;

    #[test]
    fn recommendation_score_ignores_nulls() {
        let survey = Uuid::new_v4();
        let rows = vec![
            scored(survey, Some(8)),
            scored(survey, Some(6)),
            scored(survey, None),
        ];
        assert_eq!(recommendation_score(&rows), 7.0);
    }

    #[test]
    fn recommendation_score_excludes_out_of_range_values() {
        let survey = Uuid::new_v4();
        let rows = vec![
            scored(survey, Some(9)),
            scored(survey, Some(11)),
            scored(survey, Some(-3)),
            scored(survey, Some(10)),
        ];
        assert_eq!(recommendation_score(&rows), 9.5);
    }

    #[test]
    fn recommendation_score_rounds_to_one_decimal() {
        let survey = Uuid::new_v4();
        let rows = vec![
            scored(survey, Some(7)),
            scored(survey, Some(8)),
            scored(survey, Some(8)),
        ];
        assert_eq!(recommendation_score(&rows), 7.7);
    }

    #[test]
    fn empty_inputs_produce_empty_shapes() {
        let snapshot = build_snapshot(&[], None);
        assert_eq!(snapshot.response_count, 0);
        assert_eq!(snapshot.recommendation_score, 0.0);
        assert_eq!(snapshot.leaving_distribution, LikertDistribution::default());
        assert_eq!(snapshot.text_responses, TextResponses::default());
        assert_eq!(snapshot.per_question_distributions.len(), WELLBEING_QUESTIONS.len());
        assert!(snapshot
            .per_question_distributions
            .iter()
            .all(|q| q.school_responses.total() == 0 && q.national_responses.is_none()));
        assert_eq!(recommendation_mean(&[scored(Uuid::new_v4(), None)]), None);
    }

    #[test]
    fn leaving_distribution_skips_unrecognised_labels() {
        let survey = Uuid::new_v4();
        let rows = vec![
            leaving(survey, "Agree"),
            leaving(survey, "Agree"),
            leaving(survey, "Disagree"),
            leaving(survey, "bogus"),
        ];
        let dist = leaving_distribution(&rows);
        assert_eq!(
            dist,
            LikertDistribution {
                strongly_agree: 0,
                agree: 2,
                disagree: 1,
                strongly_disagree: 0,
            }
        );
        assert_eq!(dist.total(), 3);

        let json = serde_json::to_value(dist).unwrap();
        assert_eq!(json["Agree"], 2);
        assert_eq!(json["Strongly Disagree"], 0);
    }

    #[test]
    fn percentages_are_fractions() {
        let dist = LikertDistribution {
            strongly_agree: 1,
            agree: 2,
            disagree: 1,
            strongly_disagree: 0,
        };
        let pct = dist.percentages();
        assert_eq!(pct.agree, 0.5);
        assert_eq!(pct.strongly_agree, 0.25);
        assert_eq!(pct.strongly_disagree, 0.0);
        assert_eq!(LikertDistribution::default().percentages(), LikertPercentages::default());
    }

    #[test]
    fn question_distributions_fill_national_side_only_when_given() {
        let survey = Uuid::new_v4();
        let mut school = blank(survey, 0);
        school
            .likert_answers
            .insert("workload_manageable".to_string(), Some("Strongly Disagree".to_string()));
        let mut elsewhere = blank(Uuid::new_v4(), 1);
        elsewhere
            .likert_answers
            .insert("workload_manageable".to_string(), Some("Agree".to_string()));
        let national = national_of(&[school.clone(), elsewhere]);

        let without = question_distributions(std::slice::from_ref(&school), None);
        assert!(without.iter().all(|q| q.national_responses.is_none()));

        let with = question_distributions(std::slice::from_ref(&school), Some(&national));
        let workload = with
            .iter()
            .find(|q| q.question_key == "workload_manageable")
            .unwrap();
        assert_eq!(workload.school_responses.strongly_disagree, 1);
        let national_side = workload.national_responses.unwrap();
        assert_eq!(national_side.total(), 2);
        assert_eq!(national_side.agree, 1);
    }

    #[test]
    fn national_labels_fold_like_row_answers() {
        let totals = NationalTotals {
            scores: ScoreTotals { sum: 23, count: 3 },
            leaving: vec![
                ("Agree".to_string(), 4),
                (" agree ".to_string(), 1),
                ("maybe".to_string(), 7),
            ],
            answers: vec![
                ("workload_manageable".to_string(), "Strongly Disagree".to_string(), 2),
                ("workload_manageable".to_string(), "STRONGLY DISAGREE".to_string(), 1),
                ("proud_to_work".to_string(), "Agree".to_string(), 5),
            ],
        };
        let national = NationalComparison::from_totals(&totals);
        assert_eq!(national.recommendation_average, 7.7);
        assert_eq!(national.leaving.agree, 5);
        assert_eq!(national.leaving.total(), 5);
        assert_eq!(national.question("workload_manageable").strongly_disagree, 3);
        assert_eq!(national.question("valued_member"), LikertDistribution::default());

        let empty = NationalComparison::from_totals(&NationalTotals::default());
        assert_eq!(empty.recommendation_average, 0.0);
    }

    #[test]
    fn text_responses_are_newest_first_and_skip_blanks() {
        let survey = Uuid::new_v4();
        let mut first = blank(survey, 0);
        first.doing_well = Some("Supportive SLT".to_string());
        first.could_improve = Some("   ".to_string());
        let mut second = blank(survey, 10);
        second.doing_well = Some("Team lunches".to_string());
        second.could_improve = Some("Marking load".to_string());
        let mut same_time = blank(survey, 10);
        same_time.doing_well = Some("Team lunches".to_string());

        let text = text_responses(&[first, second, same_time]);
        assert_eq!(
            text.doing_well,
            vec!["Team lunches", "Team lunches", "Supportive SLT"]
        );
        assert_eq!(text.improvements, vec!["Marking load"]);
    }

    fn arbitrary_rows() -> impl Strategy<Value = Vec<(Option<i32>, Option<String>)>> {
        let label = prop_oneof![
            Just(None),
            Just(Some("Strongly Agree".to_string())),
            Just(Some("Agree".to_string())),
            Just(Some("Disagree".to_string())),
            Just(Some("Strongly Disagree".to_string())),
            "[a-z ]{0,12}".prop_map(Some),
        ];
        prop::collection::vec((prop::option::of(-5i32..15), label), 0..40)
    }

    fn to_responses(rows: &[(Option<i32>, Option<String>)]) -> Vec<SurveyResponse> {
        let survey = Uuid::nil();
        rows.iter()
            .map(|(score, label)| SurveyResponse {
                recommendation_score: *score,
                leaving_contemplation: label.clone(),
                ..blank(survey, 0)
            })
            .collect()
    }

    proptest! {
        #[test]
        fn distribution_sums_to_recognised_answers(rows in arbitrary_rows()) {
            let responses = to_responses(&rows);
            let recognised = rows
                .iter()
                .filter(|(_, label)| label.as_deref().and_then(LikertLabel::parse).is_some())
                .count() as u32;
            prop_assert_eq!(leaving_distribution(&responses).total(), recognised);
        }

        #[test]
        fn recommendation_score_ignores_row_order(rows in arbitrary_rows()) {
            let responses = to_responses(&rows);
            let mut reversed = responses.clone();
            reversed.reverse();
            prop_assert_eq!(recommendation_score(&responses), recommendation_score(&reversed));
        }

        #[test]
        fn aggregated_national_side_matches_row_calculators(rows in arbitrary_rows()) {
            let responses = to_responses(&rows);
            let national = national_of(&responses);
            prop_assert_eq!(national.recommendation_average, recommendation_score(&responses));
            prop_assert_eq!(national.leaving, leaving_distribution(&responses));
        }
    }
}
