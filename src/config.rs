//! Environment configuration
//!
//! All settings come from environment variables. Parsing goes through an
//! injectable lookup so tests never touch the process environment.

use std::time::Duration;
use thiserror::Error;

const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434/v1";
const DEFAULT_LLM_MODEL: &str = "qwen3:14b";
const DEFAULT_MAX_TURNS: u32 = 10;
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_GHOSTWRITER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not set")]
    Missing { name: &'static str },
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Connection settings for the Ghostwriter GraphQL endpoint
#[derive(Debug, Clone)]
pub struct GhostwriterConfig {
    pub url: Option<String>,
    pub api_token: String,
    /// Self-hosted Ghostwriter instances commonly run with self-signed certificates
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl GhostwriterConfig {
    /// The endpoint URL, required before any backend call can be made
    pub fn endpoint(&self) -> Result<&str, ConfigError> {
        self.url
            .as_deref()
            .ok_or(ConfigError::Missing {
                name: "GHOSTWRITER_URL",
            })
    }
}

/// Settings for the OpenAI-compatible reasoning endpoint
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub ghostwriter: GhostwriterConfig,
    pub llm: LlmConfig,
    /// Maximum model queries per orchestration run
    pub max_turns: u32,
    /// Deadline for a single tool dispatch
    pub tool_timeout: Duration,
    pub debug: bool,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let non_empty = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());

        let max_turns = parse_or(&non_empty, "AGENT_MAX_TURNS", DEFAULT_MAX_TURNS)?;
        if max_turns == 0 {
            return Err(ConfigError::Invalid {
                name: "AGENT_MAX_TURNS",
                value: "0".to_string(),
                reason: "turn budget must be at least 1",
            });
        }

        Ok(Self {
            ghostwriter: GhostwriterConfig {
                url: non_empty("GHOSTWRITER_URL"),
                api_token: non_empty("GHOSTWRITER_API_TOKEN").unwrap_or_default(),
                verify_tls: parse_bool(&non_empty, "GHOSTWRITER_VERIFY_TLS", true)?,
                timeout: parse_timeout(
                    &non_empty,
                    "GHOSTWRITER_TIMEOUT_SECS",
                    DEFAULT_GHOSTWRITER_TIMEOUT_SECS,
                )?,
            },
            llm: LlmConfig {
                base_url: non_empty("LLM_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
                api_key: non_empty("LLM_API_KEY"),
                model: non_empty("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            },
            max_turns,
            tool_timeout: parse_timeout(
                &non_empty,
                "AGENT_TOOL_TIMEOUT_SECS",
                DEFAULT_TOOL_TIMEOUT_SECS,
            )?,
            debug: parse_bool(&non_empty, "AGENT_DEBUG", false)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
            reason: "expected a non-negative integer",
        }),
    }
}

/// A zero deadline would fail every request before it is sent
fn parse_timeout<F>(lookup: &F, name: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match parse_or(lookup, name, default)? {
        0 => Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
            reason: "timeout must be at least 1 second",
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn parse_bool<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                name,
                value,
                reason: "expected true or false",
            }),
        },
    }
}
