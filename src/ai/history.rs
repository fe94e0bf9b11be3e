//! Chat history window
//!
//! History grows without bound on the client side; before each chat call it
//! is cut down to the system messages plus the most recent turns.

use super::types::{ChatMessage, ChatRole};

/// System messages in original order, then the last `limit` other messages
///
/// System messages carry uploaded-document context, so they are never
/// dropped by the window.
pub fn window_history(history: &[ChatMessage], limit: usize) -> Vec<ChatMessage> {
    let conversational = history.iter().filter(|m| m.role != ChatRole::System).count();
    let skip = conversational.saturating_sub(limit);

    let mut skipped = 0;
    let windowed: Vec<ChatMessage> = history
        .iter()
        .filter(|m| {
            if m.role == ChatRole::System {
                return true;
            }
            if skipped < skip {
                skipped += 1;
                return false;
            }
            true
        })
        .cloned()
        .collect();

    if skip > 0 {
        tracing::debug!(
            dropped = skip,
            kept = windowed.len(),
            "Chat history trimmed to window"
        );
    }

    windowed
}
