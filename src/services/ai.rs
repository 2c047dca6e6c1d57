use crate::analytics::summary::{GeneratedSummary, SummaryContext, SummaryGenerator};
use crate::domain::catalogue::{COULD_IMPROVE_PROMPT, DOING_WELL_PROMPT, LEAVING_CONTEMPLATION_TEXT};
use crate::error::{AnalyticsError, AnalyticsResult};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
    CreateChatCompletionRequestArgs, Role,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use tokio::time::{sleep, Duration};

const SYSTEM_PROMPT: &str = r#"You are an analyst summarising a school staff wellbeing survey for its leadership team.
Input: JSON with recommendationScore (0-10 mean), leavingContemplation (share of staff per agreement label for "I have considered leaving"), detailedResponses (per wellbeing statement counts and shares) and textResponses (free-text comments).
Reply with JSON only, no markdown, using exactly these fields:
- introduction: two sentences describing overall staff sentiment
- strengths: array of 3-5 short statements of what the school does well
- improvements: array of 3-5 short, actionable areas to improve
If the data is too thin to draw conclusions, reply {"insufficientData": true}.
Never quote a comment verbatim if it could identify an individual."#;

const MAX_RETRIES: u64 = 3;

#[derive(Clone)]
pub struct AiService {
    client: Client<OpenAIConfig>,
    model: String,
}

impl AiService {
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);
        Self { client, model }
    }

    async fn complete(&self, payload: &str) -> AnalyticsResult<String> {
        let mut retries = 0;
        loop {
            let messages = vec![
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    role: Role::System,
                    content: SYSTEM_PROMPT.to_string(),
                    name: None,
                }),
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                    role: Role::User,
                    content: ChatCompletionRequestUserMessageContent::Text(format!(
                        "Leaving statement: {LEAVING_CONTEMPLATION_TEXT}\n\
                         doingWell prompt: {DOING_WELL_PROMPT}\n\
                         improvements prompt: {COULD_IMPROVE_PROMPT}\n\
                         Survey results:\n{payload}"
                    )),
                    name: None,
                }),
            ];

            let request = CreateChatCompletionRequestArgs::default()
                .model(self.model.as_str())
                .messages(messages)
                .build()
                .map_err(|e| AnalyticsError::SummaryGenerationFailed(e.to_string()))?;

            match self.client.chat().create(request).await {
                Ok(resp) => {
                    return resp
                        .choices
                        .first()
                        .and_then(|c| c.message.content.clone())
                        .ok_or_else(|| {
                            AnalyticsError::SummaryGenerationFailed("empty completion".to_string())
                        });
                }
                Err(err) => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(AnalyticsError::SummaryGenerationFailed(format!(
                            "OpenAI error: {err}"
                        )));
                    }
                    tracing::warn!("OpenAI request failed (attempt {}): {}", retries, err);
                    sleep(Duration::from_millis(500 * retries)).await;
                }
            }
        }
    }
}

/// Models sometimes wrap JSON in a ```json fence despite instructions.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

pub fn parse_generated(content: &str) -> AnalyticsResult<GeneratedSummary> {
    serde_json::from_str(strip_code_fence(content))
        .map_err(|e| AnalyticsError::SummaryGenerationFailed(format!("malformed reply: {e}")))
}

#[async_trait]
impl SummaryGenerator for AiService {
    async fn generate(&self, context: &SummaryContext) -> AnalyticsResult<GeneratedSummary> {
        let payload = serde_json::to_string(context)
            .map_err(|e| AnalyticsError::SummaryGenerationFailed(e.to_string()))?;
        let content = self.complete(&payload).await?;
        parse_generated(&content)
    }
}

/// Used when no API key is configured; every call fails so callers serve
/// the placeholder.
#[derive(Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl SummaryGenerator for DisabledGenerator {
    async fn generate(&self, _context: &SummaryContext) -> AnalyticsResult<GeneratedSummary> {
        Err(AnalyticsError::SummaryGenerationFailed(
            "text generation is not configured".to_string(),
        ))
    }
}
