use super::parser::parse_extraction_response;
use super::price_guard::guard_price;
use super::prompt::{build_extraction_prompt, extraction_response_schema, EXTRACTION_SYSTEM_PROMPT};
use super::sanitize::sanitize_for_llm;
use super::types::{GenerateRequest, LlmClient, OrderExtractor};
use super::ExtractionError;
use crate::models::OrderDetails;

/// Runs the extraction pipeline:
/// sanitize → prompt → LLM → parse → price guard → draft
///
/// Exactly one model call per `extract`; failures are not retried.
pub struct LlmOrderExtractor {
    llm: Box<dyn LlmClient>,
    model_name: String,
}

impl LlmOrderExtractor {
    pub fn new(llm: Box<dyn LlmClient>, model_name: &str) -> Self {
        Self {
            llm,
            model_name: model_name.to_string(),
        }
    }
}

impl OrderExtractor for LlmOrderExtractor {
    fn extract(&self, chat_text: &str) -> Result<OrderDetails, ExtractionError> {
        let sanitized = sanitize_for_llm(chat_text);
        if sanitized.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let prompt = build_extraction_prompt(&sanitized);
        let schema = extraction_response_schema();
        let request = GenerateRequest {
            model: &self.model_name,
            system: EXTRACTION_SYSTEM_PROMPT,
            prompt: &prompt,
            response_schema: Some(&schema),
        };

        tracing::info!(
            model = %self.model_name,
            input_chars = sanitized.chars().count(),
            "Extracting order from chat"
        );

        let response = self.llm.generate(&request).map_err(|e| {
            tracing::warn!(error = %e, "Extraction request failed");
            e
        })?;

        let draft = parse_extraction_response(&response).map_err(|e| {
            tracing::warn!(
                response_chars = response.chars().count(),
                error = %e,
                "Extraction response rejected"
            );
            e
        })?;

        let guarded = guard_price(chat_text, draft);
        let details = guarded.details;

        tracing::info!(
            missing_fields = missing_field_count(&details),
            price_known = !details.total_price.is_unknown(),
            guard_warnings = guarded.warnings.len(),
            "Order draft extracted"
        );

        Ok(details)
    }
}

fn missing_field_count(details: &OrderDetails) -> usize {
    [
        details.customer_name.is_unknown(),
        details.phone_number.is_unknown(),
        details.delivery_address.is_unknown(),
        details.total_price.is_unknown(),
    ]
    .into_iter()
    .filter(|m| *m)
    .count()
}
