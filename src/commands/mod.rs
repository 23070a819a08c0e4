//! User-facing commands over `DeskState`.
//!
//! Each command takes the desk state explicitly and returns plain,
//! serializable views. Errors are flattened to the message shown to the
//! user.

pub mod extraction;
pub mod orders;
pub mod review;

use serde::Serialize;

use crate::core_state::{DeskState, ExtractionStatus};

/// Everything the front end needs to redraw the desk header.
#[derive(Debug, Clone, Serialize)]
pub struct DeskSnapshot {
    pub chat_input_chars: usize,
    pub status: ExtractionStatus,
    /// False while an extraction is outstanding.
    pub extract_enabled: bool,
    pub review_open: bool,
    pub message: Option<String>,
    pub order_count: usize,
}

pub fn desk_snapshot(state: &DeskState) -> DeskSnapshot {
    DeskSnapshot {
        chat_input_chars: state.chat_input().chars().count(),
        status: state.status(),
        extract_enabled: state.status() != ExtractionStatus::Loading,
        review_open: state.review().is_some(),
        message: state.message().map(str::to_string),
        order_count: state.store().len(),
    }
}
