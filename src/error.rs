//! Error taxonomy
//!
//! Each pipeline stage has its own error enum. `StudyError` wraps them so the
//! action boundary can report *which* stage failed instead of a bare string.

use serde::Serialize;
use thiserror::Error;

/// Failure while turning an upload into plain text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Unsupported file type: .{extension}. Please upload {accepted} files.")]
    Unsupported { extension: String, accepted: String },

    #[error("This {format} file seems to be empty or image-only: {reason}")]
    Empty { format: String, reason: String },

    #[error("Failed to read {format} file: {message}")]
    Unreadable { format: String, message: String },

    /// `size` is unknown when the request body was cut off at the HTTP limit
    #[error("File is too large ({}max {limit} bytes)", received(.size))]
    TooLarge { size: Option<usize>, limit: usize },
}

fn received(size: &Option<usize>) -> String {
    size.map(|n| format!("{} bytes, ", n)).unwrap_or_default()
}

/// Failure talking to the remote completion endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("missing or invalid credential")]
    MissingCredential,

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("No response content from completion API")]
    EmptyResponse,
}

/// Failure turning the model output into a study package
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid JSON in model response: {0}")]
    InvalidJson(String),

    #[error("model response does not match the study package shape: {0}")]
    Schema(String),
}

/// Stage a failure came from, exposed to callers for branching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Extraction,
    Completion,
    Decode,
    InvalidInput,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StudyError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StudyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::Completion(_) => ErrorKind::Completion,
            Self::Decode(_) => ErrorKind::Decode,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}
