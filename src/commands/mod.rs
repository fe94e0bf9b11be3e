//! Orchestration actions
//!
//! Each action sequences extraction, prompting, completion and decoding, and
//! never returns an `Err`: every failure is folded into an `ActionResult`
//! carrying a redacted message and the stage that failed.

pub mod chat;
pub mod study;
mod tests;

pub use chat::{chat, document_context, ChatReply, FALLBACK_CHAT_REPLY};
pub use study::{from_document, from_topic};

use serde::Serialize;

use crate::ai::credentials::{self, ApiKey};
use crate::config::{Config, DEFAULT_CHAT_HISTORY_LIMIT, DEFAULT_MAX_UPLOAD_BYTES};
use crate::documents::{DocumentParser, ExtractedDocument, Upload};
use crate::error::{ErrorKind, ExtractionError, StudyError};

/// Uniform result envelope returned by every action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_kind: Some(kind),
        }
    }
}

/// Per-process settings the actions need besides the completion client
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub max_upload_bytes: usize,
    pub chat_history_limit: usize,
    /// Only used to scrub the key out of error messages
    pub api_key: Option<ApiKey>,
}

impl Default for ActionContext {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            chat_history_limit: DEFAULT_CHAT_HISTORY_LIMIT,
            api_key: None,
        }
    }
}

impl ActionContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            chat_history_limit: config.chat_history_limit,
            api_key: config.api_key.clone(),
        }
    }

    /// Message for a failure, with the credential scrubbed
    pub fn describe(&self, error: &StudyError) -> String {
        credentials::redact(self.api_key.as_ref(), &error.to_string())
    }

    /// Fold a pipeline result into the envelope, logging failures
    pub(crate) fn finish<T>(&self, action: &str, result: Result<T, StudyError>) -> ActionResult<T> {
        match result {
            Ok(data) => ActionResult::ok(data),
            Err(e) => {
                let message = self.describe(&e);
                tracing::error!(action = action, kind = ?e.kind(), "{}", message);
                ActionResult::failure(e.kind(), message)
            }
        }
    }
}

/// Size check then extraction on the blocking pool
pub(crate) async fn extract_upload(
    context: &ActionContext,
    upload: Upload,
) -> Result<ExtractedDocument, ExtractionError> {
    crate::documents::ensure_within_limit(upload.bytes.len(), context.max_upload_bytes)?;

    tokio::task::spawn_blocking(move || DocumentParser::new().parse(&upload))
        .await
        .map_err(|e| ExtractionError::Unreadable {
            format: "document".to_string(),
            message: format!("extraction task failed: {}", e),
        })?
}
