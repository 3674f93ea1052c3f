// ABOUTME: Provider-neutral model gateway contract
// ABOUTME: Conversation messages, tool callables, and the one-call-per-turn generation request

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::service::{AIServiceResult, Usage};

/// Speaker of a conversation turn, as seen by the caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the dialogue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool {0} may only be called once per turn")]
    CallLimitExceeded(String),

    #[error("Tool execution failed: {0}")]
    Failed(String),
}

/// A callable the model may invoke during generation
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the tool input; no arguments by default
    fn input_schema(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    fn call(&self, input: &Value) -> Result<Value, ToolError>;
}

/// Everything needed for the single generation call of a turn
#[derive(Clone)]
pub struct GenerationRequest {
    /// System instructions
    pub system: String,
    /// Full conversation history, oldest first
    pub messages: Vec<ChatMessage>,
    /// Tool offered to the model; invocation is the model's decision
    pub tool: Option<Arc<dyn ToolHandler>>,
    /// Required output schema. `None` means text-only generation.
    pub output_schema: Option<Value>,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            system: system.into(),
            messages,
            tool: None,
            output_schema: None,
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn ToolHandler>) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }
}

/// Result of one generation call
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    /// Object matching the requested output schema, when one was negotiated
    pub structured: Option<Value>,
    /// Free text the model produced
    pub text: String,
    /// Number of times the offered tool was executed
    pub tool_calls: usize,
    pub usage: Usage,
}

/// Issues exactly one generation per user turn.
///
/// Implementations must not retry and must not pipeline: one call in
/// flight per turn.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Fails when the provider credential is missing, before any request
    fn ensure_configured(&self) -> AIServiceResult<()>;

    async fn generate(&self, request: GenerationRequest) -> AIServiceResult<GenerationOutput>;
}
