pub mod deepseek;
pub mod error;
pub mod traits;
pub mod util;

pub use deepseek::DeepSeek;
pub use error::AiError;
pub use traits::{
    collect_stream, ChunkStream, CompletionRequest, CompletionResponse, CompletionService,
    Message, MessageRole, StreamChunk,
};
pub use util::{strip_code_blocks, truncate_to_char_boundary};
