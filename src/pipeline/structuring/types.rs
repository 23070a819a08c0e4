use serde_json::Value;

use super::ExtractionError;
use crate::models::OrderDetails;

/// One structured-generation request to the model.
#[derive(Debug, Clone)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub prompt: &'a str,
    /// JSON schema the reply must follow, when the backend supports it.
    pub response_schema: Option<&'a Value>,
}

/// LLM client abstraction (allows mocking)
pub trait LlmClient: Send + Sync {
    /// Return the raw text of the model's reply.
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, ExtractionError>;
}

/// Turns raw chat text into an order draft.
///
/// The one seam between the desk and the remote model: tests swap in
/// doubles returning canned drafts or forced failures. Extraction runs on
/// a worker thread, hence `Send + Sync`.
pub trait OrderExtractor: Send + Sync {
    fn extract(&self, chat_text: &str) -> Result<OrderDetails, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_are_object_safe() {
        fn _assert_client(_: &dyn LlmClient) {}
        fn _assert_extractor(_: &dyn OrderExtractor) {}
    }
}
