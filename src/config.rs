use crate::analytics::summary::DEFAULT_MIN_RESPONSES;
use crate::domain::models::SubscriptionTier;
use base64::{engine::general_purpose, Engine as _};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} missing")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub session_key: Vec<u8>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub summary_min_responses: u32,
    pub store_timeout: Duration,
    pub demo_mode: bool,
    /// Replaces the looked-up subscription tier for every user (staging/testing).
    pub tier_override: Option<SubscriptionTier>,
    pub run_migrations: bool,
    pub summary_rate_limit: usize,
    pub summary_rate_window_secs: u64,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let demo_mode = parse_bool(get("DEMO_MODE"), "DEMO_MODE")?;
        let database_url = get("DATABASE_URL");
        if database_url.is_none() && !demo_mode {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| {
            let port = get("PORT").unwrap_or_else(|| "3000".to_string());
            format!("0.0.0.0:{}", port)
        });

        let session_key_b64 = get("SESSION_KEY").ok_or(ConfigError::Missing("SESSION_KEY"))?;
        let session_key = general_purpose::STANDARD
            .decode(session_key_b64.trim())
            .map_err(|_| ConfigError::Invalid {
                name: "SESSION_KEY",
                value: "<not base64>".to_string(),
            })?;

        let tier_override = match get("TIER_OVERRIDE") {
            Some(raw) => Some(SubscriptionTier::try_from(raw.as_str()).map_err(|_| {
                ConfigError::Invalid {
                    name: "TIER_OVERRIDE",
                    value: raw.clone(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            session_key,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            summary_min_responses: parse_num(
                get("SUMMARY_MIN_RESPONSES"),
                "SUMMARY_MIN_RESPONSES",
                DEFAULT_MIN_RESPONSES,
            )?,
            store_timeout: Duration::from_millis(parse_num(
                get("STORE_TIMEOUT_MS"),
                "STORE_TIMEOUT_MS",
                10_000,
            )?),
            demo_mode,
            tier_override,
            run_migrations: parse_bool(get("RUN_MIGRATIONS"), "RUN_MIGRATIONS")?,
            summary_rate_limit: parse_num(get("SUMMARY_RATE_LIMIT"), "SUMMARY_RATE_LIMIT", 10)?,
            summary_rate_window_secs: parse_num(
                get("SUMMARY_RATE_WINDOW_SECS"),
                "SUMMARY_RATE_WINDOW_SECS",
                60,
            )?,
            db_max_connections: parse_num(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 10)?,
        })
    }
}

fn parse_bool(raw: Option<String>, name: &'static str) -> Result<bool, ConfigError> {
    match raw.as_deref().map(|v| v.trim().to_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value: v.clone() }),
        },
    }
}

fn parse_num<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: v }),
    }
}
