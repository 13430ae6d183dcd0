mod client;
pub(crate) mod types;

use async_trait::async_trait;

use crate::error::AiError;
use crate::traits::{ChunkStream, CompletionRequest, CompletionResponse, CompletionService};

use client::DeepSeekClient;
use types::ChatRequest;

// =============================================================================
// DeepSeek Agent
// =============================================================================

#[derive(Clone)]
pub struct DeepSeek {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
}

impl DeepSeek {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self, AiError> {
        let api_key = std::env::var("DEEPSEEK_API_KEY")
            .map_err(|_| AiError::Config("DEEPSEEK_API_KEY environment variable not set".into()))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn client(&self) -> DeepSeekClient {
        let client = DeepSeekClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    fn wire_request(&self, request: &CompletionRequest) -> ChatRequest {
        let model = request.model.as_deref().unwrap_or(&self.model);
        ChatRequest::new(model)
            .messages(&request.messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
    }
}

// =============================================================================
// CompletionService Implementation
// =============================================================================

#[async_trait]
impl CompletionService for DeepSeek {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AiError> {
        let wire = self.wire_request(&request);
        let response = self.client().chat(&wire).await?;

        let Some(choice) = response.choices.into_iter().next() else {
            return Ok(CompletionResponse::default());
        };

        let content = choice
            .message
            .and_then(|m| m.content)
            .and_then(|c| c.as_str().map(str::to_string));

        Ok(CompletionResponse {
            content,
            finish_reason: choice.finish_reason,
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream, AiError> {
        let wire = self.wire_request(&request).streaming();
        self.client().chat_stream(&wire).await
    }
}
