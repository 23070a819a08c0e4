use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{GenerateRequest, LlmClient};
use super::ExtractionError;

/// Public Generative Language API.
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Gemini HTTP client for hosted structured extraction.
pub struct GeminiClient {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Create a client. A missing key is accepted here and reported on the
    /// first request, so the rest of the desk keeps working without one.
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractionError::HttpClient(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
            timeout_secs,
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }
}

/// Request body for models/{model}:generateContent
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    system_instruction: GeminiSystemInstruction<'a>,
    generation_config: GeminiGenerationConfig<'a>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig<'a> {
    temperature: f32,
    response_mime_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

/// Response body from generateContent
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

fn build_request<'a>(request: &'a GenerateRequest<'a>) -> GeminiRequest<'a> {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts: vec![GeminiPart {
                text: request.prompt,
            }],
        }],
        system_instruction: GeminiSystemInstruction {
            parts: vec![GeminiPart {
                text: request.system,
            }],
        },
        generation_config: GeminiGenerationConfig {
            temperature: 0.0,
            response_mime_type: "application/json",
            response_schema: request.response_schema,
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn first_candidate_text(response: GeminiResponse) -> Result<String, ExtractionError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ExtractionError::MalformedResponse(
            "No text in model response".into(),
        ));
    }
    Ok(text)
}

impl LlmClient for GeminiClient {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, ExtractionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ExtractionError::MissingApiKey)?;

        let url = self.generate_url(request.model);
        let body = build_request(request);

        tracing::debug!(model = request.model, "Sending extraction request");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExtractionError::Connection(self.endpoint.clone())
                } else if e.is_timeout() {
                    ExtractionError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ExtractionError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GeminiResponse = response
            .json()
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

        first_candidate_text(parsed)
    }
}

/// Mock LLM client for testing. Returns a configurable response.
pub struct MockLlmClient {
    response: Result<String, String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Every call fails as if the service were unreachable.
    pub fn failing(reason: &str) -> Self {
        Self {
            response: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(request.prompt.to_string());
        }
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(reason) => Err(ExtractionError::Connection(reason.clone())),
        }
    }
}

impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, ExtractionError> {
        (**self).generate(request)
    }
}
