use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::error::AiError;

// =============================================================================
// Message Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Requests and Responses
// =============================================================================

/// Provider-independent chat request. The model is chosen by the client
/// unless `model` overrides it.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub model: Option<String>,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Non-streaming result. `content` is `None` when the provider returned no
/// message content (or a non-string one).
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    pub content: Option<String>,
    pub finish_reason: Option<String>,
}

/// One item of a token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Token(String),
    Error(String),
    Done,
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

// =============================================================================
// CompletionService Trait
// =============================================================================

/// Black-box chat completion. Each call is independent; implementations hold
/// no per-conversation state and apply no timeout of their own.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AiError>;

    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream, AiError>;
}

/// Concatenate every `Token` chunk. Returns on `Done` or end of stream; the
/// first `Error` chunk aborts with `AiError::Stream`.
pub async fn collect_stream(mut stream: ChunkStream) -> Result<String, AiError> {
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            StreamChunk::Token(token) => text.push_str(&token),
            StreamChunk::Error(error) => return Err(AiError::Stream(error)),
            StreamChunk::Done => break,
        }
    }
    Ok(text)
}
