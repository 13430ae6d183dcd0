//! Source vetter: raw page text → scored, cited, policy-gated result.
//!
//! One non-streaming completion call per source. Transport, parse and policy
//! failures are returned as [`VetterError`]; callers skip the source and
//! carry on with the crawl.

mod gates;
mod prompt;
pub mod result;

pub use result::{
    normalize_vetter_result, ContestedNote, RawVetterResult, VetterFact, VetterQuote,
    VetterResult,
};

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use ai_client::{
    strip_code_blocks, AiError, CompletionRequest, CompletionService, DeepSeek, Message,
};
use carrot_common::{AppConfig, SafetyGuard, SafetyPolicy};

use gates::apply_safety_gates;
use prompt::{vetter_user_prompt, VETTER_SYSTEM_PROMPT};

#[derive(Debug, Error)]
pub enum VetterError {
    #[error("DeepSeek API key missing")]
    MissingApiKey,

    #[error("vetter configuration error: {0}")]
    Config(String),

    #[error("deepseek_vetter_http_{status}: {body}")]
    Http { status: u16, body: String },

    #[error("deepseek_vetter_request_failed: {0}")]
    Request(String),

    #[error("deepseek_vetter_empty")]
    Empty,

    #[error("deepseek_vetter_parse_error: {0}")]
    Parse(String),

    #[error("pii_detected: {field} ({findings})")]
    PiiDetected { field: String, findings: String },

    #[error("defamation_guard: {field} cites untiered source {citation:?}")]
    DefamationGuard { field: String, citation: String },
}

impl VetterError {
    /// Policy rejections are final; the rest may succeed on another attempt.
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            VetterError::PiiDetected { .. } | VetterError::DefamationGuard { .. }
        )
    }
}

impl From<AiError> for VetterError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::Http { status, body } => VetterError::Http { status, body },
            other => VetterError::Request(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VetInput {
    pub topic: String,
    pub aliases: Vec<String>,
    pub url: String,
    /// Cleaned page text.
    pub text: String,
    /// Claims from the plan's contested section; echoed back verbatim when
    /// the source engages with one.
    pub contested_claims: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct VetterOptions {
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for VetterOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.1,
            max_tokens: 2048,
        }
    }
}

impl VetterOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: Some(config.vetter_model.clone()),
            temperature: config.vetter_temperature,
            max_tokens: config.vetter_max_tokens,
        }
    }
}

/// Holds no per-call state; share one behind an `Arc` across crawl workers.
#[derive(Clone)]
pub struct Vetter {
    completion: Arc<dyn CompletionService>,
    guard: SafetyGuard,
    options: VetterOptions,
}

impl Vetter {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self {
            completion,
            guard: SafetyGuard::default(),
            options: VetterOptions::default(),
        }
    }

    pub fn with_guard(mut self, guard: SafetyGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_options(mut self, options: VetterOptions) -> Self {
        self.options = options;
        self
    }

    /// DeepSeek-backed vetter. Fails fast when the API key is absent or the
    /// safety policy file cannot be loaded.
    pub fn from_config(config: &AppConfig) -> Result<Self, VetterError> {
        let api_key = config
            .deepseek_api_key
            .as_deref()
            .ok_or(VetterError::MissingApiKey)?;

        let policy = match &config.safety_policy_path {
            Some(path) => {
                SafetyPolicy::from_path(path).map_err(|e| VetterError::Config(e.to_string()))?
            }
            None => SafetyPolicy::default(),
        };
        let guard = policy
            .compile()
            .map_err(|e| VetterError::Config(e.to_string()))?;

        let deepseek = DeepSeek::new(api_key, config.vetter_model.clone())
            .with_base_url(config.deepseek_base_url.clone());

        Ok(Self::new(Arc::new(deepseek))
            .with_guard(guard)
            .with_options(VetterOptions::from_config(config)))
    }

    pub async fn vet_source(&self, input: &VetInput) -> Result<VetterResult, VetterError> {
        let mut request = CompletionRequest::new()
            .message(Message::system(VETTER_SYSTEM_PROMPT))
            .message(Message::user(vetter_user_prompt(input)))
            .temperature(self.options.temperature)
            .max_tokens(self.options.max_tokens);
        if let Some(model) = &self.options.model {
            request = request.model(model.clone());
        }

        debug!(url = %input.url, "Vetting source");
        let response = self.completion.complete(request).await?;

        let content = response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(VetterError::Empty)?;

        let raw: RawVetterResult = serde_json::from_str(strip_code_blocks(&content))
            .map_err(|e| VetterError::Parse(e.to_string()))?;
        let result = normalize_vetter_result(raw, &input.url);

        let known_names: Vec<String> = std::iter::once(input.topic.clone())
            .chain(input.aliases.iter().cloned())
            .collect();
        if let Err(e) = apply_safety_gates(&self.guard, &result, &known_names) {
            warn!(url = %input.url, error = %e, "Source rejected by safety gate");
            return Err(e);
        }

        info!(
            url = %input.url,
            useful = result.is_useful,
            relevance = result.relevance_score,
            quality = result.quality_score,
            facts = result.facts.len(),
            quotes = result.quotes.len(),
            "Vetted source"
        );
        Ok(result)
    }
}
