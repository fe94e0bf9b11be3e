//! Chat assistant actions

use serde::{Deserialize, Serialize};

use crate::ai::prompts::{build_document_context, CHAT_SYSTEM_PROMPT};
use crate::ai::{window_history, ChatMessage, ChatRole, CompletionClient, CompletionRequest};
use crate::documents::Upload;
use crate::error::{ErrorKind, StudyError};

use super::{extract_upload, ActionContext, ActionResult};

/// Shown to the student instead of the raw error when a chat call fails
pub const FALLBACK_CHAT_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
}

/// Answer the latest message in `history`
///
/// The history is windowed to `context.chat_history_limit` turns and the
/// assistant persona is prepended. On failure the error text is the generic
/// fallback reply; `errorKind` still says which stage failed.
pub async fn chat(
    client: &dyn CompletionClient,
    context: &ActionContext,
    history: &[ChatMessage],
) -> ActionResult<ChatReply> {
    if !history.iter().any(|m| m.role != ChatRole::System) {
        tracing::warn!(history = history.len(), "Chat history has no user or assistant messages");
        return ActionResult::failure(ErrorKind::InvalidInput, FALLBACK_CHAT_REPLY);
    }

    let mut messages = vec![ChatMessage::system(CHAT_SYSTEM_PROMPT)];
    messages.extend(window_history(history, context.chat_history_limit));

    tracing::info!(
        history = history.len(),
        sent = messages.len(),
        "Sending chat message"
    );

    match client.complete(CompletionRequest::chat(messages)).await {
        Ok(content) => ActionResult::ok(ChatReply { content }),
        Err(e) => {
            let e = StudyError::from(e);
            tracing::error!(kind = ?e.kind(), "Chat completion failed: {}", context.describe(&e));
            ActionResult::failure(ErrorKind::Completion, FALLBACK_CHAT_REPLY)
        }
    }
}

/// Extract an uploaded file into a system message the chat can refer to
pub async fn document_context(context: &ActionContext, upload: Upload) -> ActionResult<ChatMessage> {
    let file_name = upload.file_name.clone();
    tracing::info!(file = %file_name, "Attaching document to chat");

    let result = extract_upload(context, upload)
        .await
        .map(|document| ChatMessage::system(build_document_context(&file_name, &document.text)))
        .map_err(StudyError::from);
    context.finish("document_context", result)
}
