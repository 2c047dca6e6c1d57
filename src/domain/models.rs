use crate::error::{AnalyticsError, AnalyticsResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    Saved,
    Scheduled,
    Sent,
    Completed,
    Archived,
}

impl TryFrom<&str> for SurveyStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "saved" | "draft" => Ok(SurveyStatus::Saved),
            "scheduled" => Ok(SurveyStatus::Scheduled),
            "sent" => Ok(SurveyStatus::Sent),
            "completed" => Ok(SurveyStatus::Completed),
            "archived" => Ok(SurveyStatus::Archived),
            _ => Err(()),
        }
    }
}

/// Subscription plans in entitlement order; the derived `Ord` is the tier ordering.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Foundation,
    Progress,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Foundation => "foundation",
            SubscriptionTier::Progress => "progress",
            SubscriptionTier::Premium => "premium",
        }
    }

    pub fn grants_national_comparison(&self) -> bool {
        *self >= SubscriptionTier::Foundation
    }
}

impl TryFrom<&str> for SubscriptionTier {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "free" => Ok(SubscriptionTier::Free),
            "foundation" => Ok(SubscriptionTier::Foundation),
            "progress" => Ok(SubscriptionTier::Progress),
            "premium" => Ok(SubscriptionTier::Premium),
            _ => Err(()),
        }
    }
}

/// The four fixed agreement labels used by every Likert question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LikertLabel {
    StronglyAgree,
    Agree,
    Disagree,
    StronglyDisagree,
}

impl LikertLabel {
    pub const ALL: [LikertLabel; 4] = [
        LikertLabel::StronglyAgree,
        LikertLabel::Agree,
        LikertLabel::Disagree,
        LikertLabel::StronglyDisagree,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LikertLabel::StronglyAgree => "Strongly Agree",
            LikertLabel::Agree => "Agree",
            LikertLabel::Disagree => "Disagree",
            LikertLabel::StronglyDisagree => "Strongly Disagree",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(normalized))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SurveyTemplate {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub date: DateTime<Utc>,
    pub close_date: Option<DateTime<Utc>>,
    pub emails: Option<String>,
    pub status: SurveyStatus,
}

impl SurveyTemplate {
    pub fn has_valid_schedule(&self) -> bool {
        self.close_date.map(|close| close >= self.date).unwrap_or(true)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub recommendation_score: Option<i32>,
    pub leaving_contemplation: Option<String>,
    /// Wellbeing question key -> raw Likert label.
    #[serde(default)]
    pub likert_answers: BTreeMap<String, Option<String>>,
    pub doing_well: Option<String>,
    pub could_improve: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CustomQuestionKind {
    Text,
    Dropdown,
}

impl TryFrom<&str> for CustomQuestionKind {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "text" => Ok(CustomQuestionKind::Text),
            "dropdown" | "select" => Ok(CustomQuestionKind::Dropdown),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomQuestion {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub text: String,
    pub kind: CustomQuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomAnswer {
    pub question_id: Uuid,
    pub response_id: Uuid,
    pub answer: String,
    pub submitted_at: DateTime<Utc>,
}

/// Only constructed through [`DateRange::new`], so `start <= end` always holds.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct DateRange {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> AnalyticsResult<Self> {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(AnalyticsError::InvalidDateRange);
            }
        }
        Ok(Self { start, end })
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Start is inclusive; only timestamps strictly after `end` fall outside.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.map(|start| ts >= start).unwrap_or(true)
            && self.end.map(|end| ts <= end).unwrap_or(true)
    }
}
