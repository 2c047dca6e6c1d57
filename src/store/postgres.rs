use crate::domain::models::{
    CustomAnswer, CustomQuestion, CustomQuestionKind, DateRange, SubscriptionTier, SurveyResponse,
    SurveyStatus, SurveyTemplate,
};
use crate::error::AnalyticsResult;
use crate::store::{NationalTotals, ResponseStore, ScoreTotals, TierSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct SurveyRow {
    id: Uuid,
    creator_id: Uuid,
    name: String,
    date: DateTime<Utc>,
    close_date: Option<DateTime<Utc>>,
    emails: Option<String>,
    status: String,
}

impl From<SurveyRow> for SurveyTemplate {
    fn from(row: SurveyRow) -> Self {
        let status = SurveyStatus::try_from(row.status.as_str()).unwrap_or_else(|_| {
            tracing::warn!("Unknown status '{}' on survey {}, treating as saved", row.status, row.id);
            SurveyStatus::Saved
        });
        let survey = SurveyTemplate {
            id: row.id,
            owner_id: row.creator_id,
            name: row.name,
            date: row.date,
            close_date: row.close_date,
            emails: row.emails,
            status,
        };
        if !survey.has_valid_schedule() {
            tracing::warn!("Survey {} closes before it is sent", survey.id);
        }
        survey
    }
}

#[derive(Debug, FromRow)]
struct ResponseRow {
    id: Uuid,
    survey_id: Uuid,
    created_at: DateTime<Utc>,
    recommendation_score: Option<i32>,
    leaving_contemplation: Option<String>,
    likert_answers: Option<serde_json::Value>,
    doing_well: Option<String>,
    could_improve: Option<String>,
}

impl From<ResponseRow> for SurveyResponse {
    fn from(row: ResponseRow) -> Self {
        SurveyResponse {
            id: row.id,
            survey_id: row.survey_id,
            submitted_at: row.created_at,
            recommendation_score: row.recommendation_score,
            leaving_contemplation: row.leaving_contemplation,
            likert_answers: likert_answers_from_json(row.likert_answers),
            doing_well: row.doing_well,
            could_improve: row.could_improve,
        }
    }
}

/// Non-object payloads yield no answers; non-string values become unanswered.
fn likert_answers_from_json(value: Option<serde_json::Value>) -> BTreeMap<String, Option<String>> {
    let Some(serde_json::Value::Object(map)) = value else {
        return BTreeMap::new();
    };
    map.into_iter()
        .map(|(key, value)| {
            let answer = value.as_str().map(|s| s.to_string());
            (key, answer)
        })
        .collect()
}

#[derive(Debug, FromRow)]
struct CustomQuestionRow {
    id: Uuid,
    survey_id: Uuid,
    question: String,
    question_type: String,
    options: Option<serde_json::Value>,
}

#[derive(Debug, FromRow)]
struct CustomAnswerRow {
    question_id: Uuid,
    response_id: Uuid,
    answer: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const RESPONSE_COLUMNS: &str = r#"
    id,
    survey_id,
    created_at,
    recommendation_score,
    leaving_contemplation,
    likert_answers,
    doing_well,
    could_improve
"#;

#[async_trait]
impl ResponseStore for PgStore {
    async fn fetch_responses(
        &self,
        survey_id: Uuid,
        range: &DateRange,
    ) -> AnalyticsResult<Vec<SurveyResponse>> {
        let sql = format!(
            r#"
            SELECT {RESPONSE_COLUMNS}
            FROM survey_responses
            WHERE survey_id = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
            ORDER BY created_at ASC
            "#
        );
        let rows = sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(survey_id)
            .bind(range.start())
            .bind(range.end())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch responses for survey {}: {}", survey_id, e);
                e
            })?;
        Ok(rows.into_iter().map(SurveyResponse::from).collect())
    }

    async fn national_totals(&self, range: &DateRange) -> AnalyticsResult<NationalTotals> {
        let scores = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COALESCE(SUM(recommendation_score), 0)::bigint, COUNT(recommendation_score)::bigint
            FROM survey_responses
            WHERE recommendation_score BETWEEN 0 AND 10
              AND ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at <= $2)
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .fetch_one(&self.pool);

        let leaving = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT leaving_contemplation, COUNT(*)::bigint
            FROM survey_responses
            WHERE leaving_contemplation IS NOT NULL
              AND ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at <= $2)
            GROUP BY leaving_contemplation
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool);

        // Non-object payloads and non-string answers count as unanswered,
        // matching likert_answers_from_json.
        let answers = sqlx::query_as::<_, (String, String, i64)>(
            r#"
            SELECT a.key, a.value #>> '{}', COUNT(*)::bigint
            FROM survey_responses r
            CROSS JOIN LATERAL jsonb_each(
                CASE WHEN jsonb_typeof(r.likert_answers) = 'object'
                     THEN r.likert_answers ELSE '{}'::jsonb END
            ) AS a
            WHERE jsonb_typeof(a.value) = 'string'
              AND ($1::timestamptz IS NULL OR r.created_at >= $1)
              AND ($2::timestamptz IS NULL OR r.created_at <= $2)
            GROUP BY a.key, a.value #>> '{}'
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool);

        let ((sum, count), leaving, answers) = tokio::try_join!(scores, leaving, answers)
            .map_err(|e| {
                tracing::error!("Failed to aggregate national totals: {}", e);
                e
            })?;

        Ok(NationalTotals {
            scores: ScoreTotals { sum, count },
            leaving,
            answers,
        })
    }

    async fn recommendation_totals(&self, survey_ids: &[Uuid]) -> AnalyticsResult<ScoreTotals> {
        if survey_ids.is_empty() {
            return Ok(ScoreTotals::default());
        }
        let (sum, count) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COALESCE(SUM(recommendation_score), 0)::bigint, COUNT(recommendation_score)::bigint
            FROM survey_responses
            WHERE survey_id = ANY($1)
              AND recommendation_score BETWEEN 0 AND 10
            "#,
        )
        .bind(survey_ids)
        .fetch_one(&self.pool)
        .await?;
        Ok(ScoreTotals { sum, count })
    }

    async fn survey(&self, survey_id: Uuid) -> AnalyticsResult<Option<SurveyTemplate>> {
        let row = sqlx::query_as::<_, SurveyRow>(
            r#"
            SELECT id, creator_id, name, date, close_date, emails, status
            FROM survey_templates
            WHERE id = $1
            "#,
        )
        .bind(survey_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SurveyTemplate::from))
    }

    async fn surveys_for_owner(&self, owner_id: Uuid) -> AnalyticsResult<Vec<SurveyTemplate>> {
        let rows = sqlx::query_as::<_, SurveyRow>(
            r#"
            SELECT id, creator_id, name, date, close_date, emails, status
            FROM survey_templates
            WHERE creator_id = $1
            ORDER BY date DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch surveys for owner {}: {}", owner_id, e);
            e
        })?;
        Ok(rows.into_iter().map(SurveyTemplate::from).collect())
    }

    async fn response_count(&self, survey_id: Uuid) -> AnalyticsResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)::bigint FROM survey_responses WHERE survey_id = $1",
        )
        .bind(survey_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn custom_questions(&self, survey_id: Uuid) -> AnalyticsResult<Vec<CustomQuestion>> {
        let rows = sqlx::query_as::<_, CustomQuestionRow>(
            r#"
            SELECT q.id, l.survey_id, q.question, q.question_type, q.options
            FROM survey_custom_questions l
            JOIN custom_questions q ON q.id = l.question_id
            WHERE l.survey_id = $1
            ORDER BY q.created_at ASC
            "#,
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;

        let questions = rows
            .into_iter()
            .filter_map(|row| {
                let Ok(kind) = CustomQuestionKind::try_from(row.question_type.as_str()) else {
                    tracing::warn!(
                        "Skipping custom question {} with unsupported type '{}'",
                        row.id,
                        row.question_type
                    );
                    return None;
                };
                let options = match row.options {
                    Some(serde_json::Value::Array(values)) => values
                        .into_iter()
                        .filter_map(|v| v.as_str().map(|s| s.to_string()))
                        .collect(),
                    _ => Vec::new(),
                };
                Some(CustomQuestion {
                    id: row.id,
                    survey_id: row.survey_id,
                    text: row.question,
                    kind,
                    options,
                })
            })
            .collect();
        Ok(questions)
    }

    async fn custom_answers(
        &self,
        question_ids: &[Uuid],
        range: &DateRange,
    ) -> AnalyticsResult<Vec<CustomAnswer>> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, CustomAnswerRow>(
            r#"
            SELECT question_id, response_id, answer, created_at
            FROM custom_question_responses
            WHERE question_id = ANY($1)
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
            ORDER BY created_at ASC
            "#,
        )
        .bind(question_ids)
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                row.answer.map(|answer| CustomAnswer {
                    question_id: row.question_id,
                    response_id: row.response_id,
                    answer,
                    submitted_at: row.created_at,
                })
            })
            .collect())
    }
}

#[async_trait]
impl TierSource for PgStore {
    async fn current_tier(&self, user_id: Uuid) -> AnalyticsResult<Option<SubscriptionTier>> {
        let plans: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT plan_type
            FROM subscriptions
            WHERE user_id = $1
              AND status = 'active'
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(plans
            .iter()
            .filter_map(|plan| SubscriptionTier::try_from(plan.as_str()).ok())
            .max())
    }
}
