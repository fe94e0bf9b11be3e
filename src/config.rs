//! Environment configuration
//!
//! Read once at startup. A missing API key is logged but never fatal: the
//! first completion call fails instead, with a credential error.

use std::net::SocketAddr;
use thiserror::Error;

use crate::ai::credentials::ApiKey;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GENERATION_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// 20 MiB upload cap
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Messages kept from the tail of a chat conversation
pub const DEFAULT_CHAT_HISTORY_LIMIT: usize = 20;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<ApiKey>,
    pub base_url: String,
    pub generation_model: String,
    pub chat_model: String,
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
    pub chat_history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            chat_history_limit: DEFAULT_CHAT_HISTORY_LIMIT,
        }
    }
}

impl Config {
    /// Build configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = ApiKey::resolve(&lookup);
        if api_key.is_none() {
            tracing::error!("GROQ_API_KEY is missing; completion calls will fail until it is set");
        } else {
            tracing::info!("Completion API key configured");
        }

        let bind = match var("STUDYAI_BIND") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                var: "STUDYAI_BIND",
                message: e.to_string(),
            })?,
            None => DEFAULT_BIND.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    var: "STUDYAI_BIND",
                    message: e.to_string(),
                }
            })?,
        };

        Ok(Self {
            api_key,
            base_url: var("GROQ_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            generation_model: var("STUDYAI_GENERATION_MODEL")
                .unwrap_or_else(|| DEFAULT_GENERATION_MODEL.to_string()),
            chat_model: var("STUDYAI_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            bind,
            max_upload_bytes: parse_usize(
                "STUDYAI_MAX_UPLOAD_BYTES",
                var("STUDYAI_MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
            chat_history_limit: parse_usize(
                "STUDYAI_CHAT_HISTORY_LIMIT",
                var("STUDYAI_CHAT_HISTORY_LIMIT"),
                DEFAULT_CHAT_HISTORY_LIMIT,
            )?,
        })
    }
}

fn parse_usize(name: &'static str, raw: Option<String>, default: usize) -> Result<usize, ConfigError> {
    match raw {
        Some(raw) => raw.parse::<usize>().map_err(|e| ConfigError::Invalid {
            var: name,
            message: format!("{:?}: {}", raw, e),
        }),
        None => Ok(default),
    }
}
