//! Narrative summary of a survey's results.
//!
//! The text itself comes from an external generator. This module owns the
//! policy around it: the minimum sample size, the payload shape, and the
//! placeholder returned when the generator fails.

use crate::analytics::metrics::{LikertDistribution, LikertPercentages, MetricSnapshot, TextResponses};
use crate::error::AnalyticsResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_RESPONSES: u32 = 20;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedResponse {
    pub question: String,
    pub responses: LikertDistribution,
    pub percentages: LikertPercentages,
}

/// JSON context handed to the generator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryContext {
    pub recommendation_score: f64,
    pub leaving_contemplation: LikertPercentages,
    pub detailed_responses: Vec<DetailedResponse>,
    pub text_responses: TextResponses,
}

impl SummaryContext {
    pub fn from_snapshot(snapshot: &MetricSnapshot) -> Self {
        Self {
            recommendation_score: snapshot.recommendation_score,
            leaving_contemplation: snapshot.leaving_distribution.percentages(),
            detailed_responses: snapshot
                .per_question_distributions
                .iter()
                .map(|q| DetailedResponse {
                    question: q.question.clone(),
                    responses: q.school_responses,
                    percentages: q.school_responses.percentages(),
                })
                .collect(),
            text_responses: snapshot.text_responses.clone(),
        }
    }
}

/// What a generator sends back.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSummary {
    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub insufficient_data: bool,
}

#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn generate(&self, context: &SummaryContext) -> AnalyticsResult<GeneratedSummary>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryResult {
    InsufficientData {
        #[serde(rename = "insufficientData")]
        insufficient_data: bool,
    },
    Ready(NarrativeSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeSummary {
    pub introduction: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    /// Set when the generator failed and this is stand-in text.
    pub placeholder: bool,
}

impl SummaryResult {
    pub fn insufficient() -> Self {
        SummaryResult::InsufficientData {
            insufficient_data: true,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, SummaryResult::InsufficientData { .. })
    }
}

fn placeholder_summary() -> NarrativeSummary {
    NarrativeSummary {
        introduction: "An automated summary is not available right now.".to_string(),
        strengths: vec![
            "Summary unavailable: review the response breakdown below for areas of strength."
                .to_string(),
        ],
        improvements: vec![
            "Summary unavailable: review the response breakdown below for areas to improve."
                .to_string(),
        ],
        placeholder: true,
    }
}

fn is_malformed(summary: &GeneratedSummary) -> bool {
    let blank = |items: &[String]| items.iter().all(|s| s.trim().is_empty());
    blank(&summary.strengths) && blank(&summary.improvements)
}

pub async fn generate_summary(
    snapshot: &MetricSnapshot,
    generator: &dyn SummaryGenerator,
    min_responses: u32,
) -> SummaryResult {
    let total_responses = snapshot.leaving_distribution.total();
    if total_responses < min_responses {
        tracing::debug!(
            "Skipping summary generation: {} responses, need {}",
            total_responses,
            min_responses
        );
        return SummaryResult::insufficient();
    }

    let context = SummaryContext::from_snapshot(snapshot);
    match generator.generate(&context).await {
        Ok(generated) if generated.insufficient_data => SummaryResult::insufficient(),
        Ok(generated) if is_malformed(&generated) => {
            tracing::warn!("Summary generator returned no strengths or improvements");
            SummaryResult::Ready(placeholder_summary())
        }
        Ok(generated) => SummaryResult::Ready(NarrativeSummary {
            introduction: generated.introduction,
            strengths: generated.strengths,
            improvements: generated.improvements,
            placeholder: false,
        }),
        Err(e) => {
            tracing::warn!("Summary generation failed, serving placeholder: {}", e);
            SummaryResult::Ready(placeholder_summary())
        }
    }
}
