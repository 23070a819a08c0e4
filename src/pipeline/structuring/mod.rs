//! Chat transcript → order draft extraction.
//!
//! One remote model call per user-initiated extraction:
//! sanitize → prompt → LLM → parse → price guard → `OrderDetails`.

pub mod types;
pub mod prompt;
pub mod parser;
pub mod sanitize;
pub mod price_guard;
pub mod gemini;
pub mod orchestrator;

pub use types::*;
pub use prompt::*;
pub use parser::*;
pub use sanitize::*;
pub use price_guard::*;
pub use gemini::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Chat text is empty")]
    EmptyInput,

    #[error("No API key configured for the extraction service")]
    MissingApiKey,

    #[error("Extraction service is unreachable at {0}")]
    Connection(String),

    #[error("Extraction service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),
}

impl ExtractionError {
    /// True for the local input check that runs before any remote call.
    /// Everything else is reported to the user as one "extraction failed".
    pub fn is_input_error(&self) -> bool {
        matches!(self, ExtractionError::EmptyInput)
    }
}
