use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("invalid date range: end is before start")]
    InvalidDateRange,
    #[error("entitlement check failed: {0}")]
    EntitlementCheckFailed(String),
    #[error("summary generation failed: {0}")]
    SummaryGenerationFailed(String),
    #[error("survey {0} not found")]
    SurveyNotFound(Uuid),
}

impl From<sqlx::Error> for AnalyticsError {
    fn from(err: sqlx::Error) -> Self {
        AnalyticsError::StorageUnavailable(err.to_string())
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
