//! The outbound call to the generative model, behind the `Generator` trait.
//!
//! The external service's only contract is "text in, text out"; the text is
//! usually fenced JSON but nothing guarantees it. This module owns the
//! transport and the fence-stripping/parse step; schema validation of the
//! parsed records is the validator's job.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

/// Failure modes of the generation call and its output handling.
#[derive(Debug, Clone)]
pub enum GenerationError {
    /// The service could not be reached or answered abnormally. Transient;
    /// the background runner retries these.
    Unavailable(String),
    /// The model's text could not be parsed into shift records even after
    /// cleanup. Terminal; the raw cleaned text is preserved for diagnosis
    /// because retrying an unchanged prompt may never help.
    MalformedOutput { detail: String, raw: String },
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Unavailable(_))
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Unavailable(msg) => {
                write!(f, "Generation service unavailable: {}", msg)
            }
            GenerationError::MalformedOutput { detail, .. } => {
                write!(f, "Malformed generation output: {}", detail)
            }
        }
    }
}

impl std::error::Error for GenerationError {}

/// The pluggable generation capability: one prompt in, freeform text out.
///
/// The live implementation talks to the external model over HTTP; tests use
/// `StubGenerator` so the rest of the pipeline can be exercised
/// deterministically.
#[rocket::async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Client for a Gemini-style `generateContent` endpoint: single-turn,
/// non-streaming, text in / text out.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Builds a client. `request_timeout` bounds the HTTP round trip; the
    /// background runner additionally bounds the whole job attempt.
    pub fn new(
        endpoint: String,
        model: String,
        api_key: String,
        request_timeout: Duration,
    ) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(GeminiClient {
            http,
            endpoint,
            model,
            api_key,
        })
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[rocket::async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 1.0,
                "topP": 0.95,
                "topK": 40,
                "maxOutputTokens": 8192,
                "responseMimeType": "text/plain"
            }
        });

        let response = self
            .http
            .post(self.request_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                GenerationError::Unavailable(format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Unavailable(format!(
                "service returned HTTP {}",
                status
            )));
        }

        let envelope: Value = response.json().await.map_err(|e| {
            GenerationError::Unavailable(format!("unreadable response body: {}", e))
        })?;

        // Concatenate every text part of the first candidate.
        let text: String = envelope["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationError::Unavailable(
                "response contained no candidate text".to_string(),
            ));
        }

        Ok(text)
    }
}

/// Strips Markdown code-fence delimiters (```` ```json ```` and ```` ``` ````)
/// and trims surrounding whitespace. Content without fences passes through
/// unchanged apart from the trim.
pub fn clean_fenced_json(response: &str) -> String {
    response
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parses cleaned model output as a JSON array of shift-like objects.
///
/// Anything else — invalid JSON, or a non-array top level — is
/// `MalformedOutput` with the cleaned text attached.
pub fn parse_shift_payload(clean: &str) -> Result<Vec<Value>, GenerationError> {
    let value: Value = serde_json::from_str(clean).map_err(|e| GenerationError::MalformedOutput {
        detail: format!("invalid JSON: {}", e),
        raw: clean.to_string(),
    })?;

    match value {
        Value::Array(items) => Ok(items),
        _ => Err(GenerationError::MalformedOutput {
            detail: "expected a JSON array of shift records".to_string(),
            raw: clean.to_string(),
        }),
    }
}

/// A scripted `Generator` for tests: replays a queue of canned outcomes and
/// repeats the last one once the queue is exhausted.
pub struct StubGenerator {
    script: Mutex<StubState>,
}

struct StubState {
    queued: VecDeque<Result<String, GenerationError>>,
    last: Option<Result<String, GenerationError>>,
}

impl StubGenerator {
    /// A stub that always returns the same text.
    pub fn with_response(text: impl Into<String>) -> Self {
        StubGenerator::with_sequence(vec![Ok(text.into())])
    }

    /// A stub that replays `outcomes` in order, then repeats the final one.
    pub fn with_sequence(outcomes: Vec<Result<String, GenerationError>>) -> Self {
        StubGenerator {
            script: Mutex::new(StubState {
                queued: outcomes.into(),
                last: None,
            }),
        }
    }

    /// Appends an outcome to the script. Tests keep a handle to the stub and
    /// push responses once the ids they need are known.
    pub fn push(&self, outcome: Result<String, GenerationError>) {
        self.script
            .lock()
            .expect("stub generator lock")
            .queued
            .push_back(outcome);
    }
}

#[rocket::async_trait]
impl Generator for StubGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        let mut state = self.script.lock().expect("stub generator lock");
        if let Some(next) = state.queued.pop_front() {
            state.last = Some(next.clone());
            return next;
        }
        state.last.clone().unwrap_or_else(|| {
            Err(GenerationError::Unavailable(
                "stub generator has no scripted responses".to_string(),
            ))
        })
    }
}
