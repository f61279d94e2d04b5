//! The shift-generation pipeline.
//!
//! Everything between "a roster and its availability payload" and "a batch
//! of persisted shifts" lives here: prompt construction, the call to the
//! external generative model, cleanup/parsing of its freeform output, and
//! the validator that decides whether that output may touch the database.
//! The model is an untrusted, non-deterministic collaborator; nothing it
//! returns is persisted without re-validation.

pub mod client;
pub mod prompt;
pub mod validator;

use std::sync::Arc;

use serde::Deserialize;

use crate::orm::availability::AvailabilityScope;

pub use client::{GenerationError, Generator};

/// Everything the synchronous generation endpoint needs: the pluggable
/// generator, the loaded prompt template, and the pipeline settings.
/// Constructed once at ignition and managed as Rocket state.
pub struct PipelineContext {
    pub generator: Arc<dyn Generator>,
    pub settings: GenerationSettings,
    pub template: String,
}

/// Settings for the generation pipeline and its background runner.
///
/// Extracted from the `generation.*` figment section (`Rocket.toml` or
/// `ROCKET_GENERATION_*` env vars); every field has a documented default so
/// a bare config still works. The API key is deliberately not part of the
/// figment profile: it comes from the `GEMINI_API_KEY` env var.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Base URL of the generative-language service.
    pub endpoint: String,
    /// Model name appended to the generateContent path.
    pub model: String,
    /// Path of the versioned prompt template artifact.
    pub prompt_path: String,
    /// Attempts per job before a retryable failure becomes permanent.
    pub max_attempts: u32,
    /// Base of the exponential backoff between attempts, in seconds.
    pub backoff_base_secs: u64,
    /// Wall-clock budget for a single job attempt, in seconds.
    pub job_timeout_secs: u64,
    /// Which team members the availability aggregation includes.
    pub availability_scope: AvailabilityScope,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash-exp".to_string(),
            prompt_path: "prompts/roster_generation.md".to_string(),
            max_attempts: 3,
            backoff_base_secs: 2,
            job_timeout_secs: 300,
            availability_scope: AvailabilityScope::RespondedOnly,
        }
    }
}
