use crate::domain::models::{CustomAnswer, CustomQuestion, CustomQuestionKind};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomQuestionSummary {
    pub question_id: Uuid,
    pub text: String,
    pub kind: CustomQuestionKind,
    pub answers: Vec<String>,
    /// Option -> count, only for dropdown questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tally: Option<BTreeMap<String, u32>>,
}

pub fn summarize_custom_questions(
    questions: &[CustomQuestion],
    answers: &[CustomAnswer],
) -> Vec<CustomQuestionSummary> {
    questions
        .iter()
        .map(|question| {
            let collected: Vec<String> = answers
                .iter()
                .filter(|a| a.question_id == question.id)
                .map(|a| a.answer.trim())
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();

            let tally = match question.kind {
                CustomQuestionKind::Dropdown => Some(tally_options(&question.options, &collected)),
                CustomQuestionKind::Text => None,
            };

            CustomQuestionSummary {
                question_id: question.id,
                text: question.text.clone(),
                kind: question.kind,
                answers: collected,
                tally,
            }
        })
        .collect()
}

/// Configured options always appear (zero-filled) so charts keep a stable axis.
fn tally_options(options: &[String], answers: &[String]) -> BTreeMap<String, u32> {
    let mut tally: BTreeMap<String, u32> = options.iter().map(|o| (o.clone(), 0)).collect();
    for answer in answers {
        *tally.entry(answer.clone()).or_insert(0) += 1;
    }
    tally
}
