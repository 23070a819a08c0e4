//! Chat input and extraction commands.

use crate::core_state::DeskState;

use super::review::{review_view, ReviewView};

/// Replace the chat input buffer.
pub fn set_chat_input(state: &mut DeskState, text: &str) {
    state.set_chat_input(text);
}

/// Start extracting an order draft from the chat input.
///
/// Errors are the exact inline messages: the empty-input prompt or the
/// busy notice.
pub fn start_extraction(state: &mut DeskState) -> Result<(), String> {
    state.start_extraction().map_err(|e| e.to_string())
}

/// The review opened by a finished extraction, or the single
/// extraction-failed message. `None` while nothing has arrived.
pub fn poll_extraction(state: &mut DeskState) -> Option<Result<ReviewView, String>> {
    state
        .poll_extraction()
        .map(|result| result.map(review_view).map_err(|e| e.to_string()))
}

/// Like `poll_extraction`, but blocks until the running call finishes.
pub fn wait_for_extraction(state: &mut DeskState) -> Option<Result<ReviewView, String>> {
    state
        .wait_extraction()
        .map(|result| result.map(review_view).map_err(|e| e.to_string()))
}
