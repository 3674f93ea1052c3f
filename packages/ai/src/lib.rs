// ABOUTME: Model invocation gateway for Innerspell
// ABOUTME: Provider-neutral gateway trait plus the Anthropic Messages API client

pub mod gateway;
pub mod service;

// Re-export gateway types
pub use gateway::{
    ChatMessage, ChatRole, GenerationOutput, GenerationRequest, ModelGateway, ToolError,
    ToolHandler,
};

// Re-export service types
pub use service::{AIService, AIServiceError, AIServiceResult, Usage};
