// ABOUTME: AI service for making generation calls to Anthropic Claude
// ABOUTME: Handles role mapping, structured output via tool use, the catalog tool round trip, and usage tracking

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use innerspell_config::{ANTHROPIC_API_KEY, ANTHROPIC_BASE_URL, ANTHROPIC_MODEL};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::gateway::{
    ChatMessage, ChatRole, GenerationOutput, GenerationRequest, ModelGateway, ToolError,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514"; // Claude Sonnet 4 (May 2025)
const DEFAULT_TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT_SECS: u64 = 600;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Name of the synthetic tool that carries structured output
pub const RESPOND_TOOL: &str = "respond_to_user";

/// The offered tool may run at most this many times per generation
const MAX_TOOL_CALLS: usize = 1;

/// Sent as the first user turn when the history does not start with one
const CONVERSATION_OPENER: &str = "상담사 추천을 시작해 주세요.";

/// Caller role -> Anthropic role
const ROLE_TABLE: &[(ChatRole, &str)] = &[
    (ChatRole::User, "user"),
    (ChatRole::Assistant, "assistant"),
];

/// Calculate appropriate max_tokens for a given model
fn get_max_tokens_for_model(model: &str) -> u32 {
    // Claude 3 family (Opus, Sonnet, Haiku)
    if model.contains("claude-3-opus") || model.contains("claude-3-sonnet") {
        4096
    } else if model.contains("claude-3-haiku") {
        1024
    }
    // Claude Sonnet/Haiku 4/5
    else if model.contains("claude-sonnet") {
        4096
    } else if model.contains("claude-haiku") {
        2048
    }
    // Default to safe value for unknown models
    else {
        4096
    }
}

#[derive(Debug, Error)]
pub enum AIServiceError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("No API key configured")]
    NoApiKey,

    #[error("Invalid response format")]
    InvalidResponse,

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Model called tool {0} more than once in a single turn")]
    ToolCallLimit(String),
}

pub type AIServiceResult<T> = Result<T, AIServiceError>;

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Message {
    role: String,
    content: MessageContent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
    },
    /// Block types this client does not interpret (thinking, etc.)
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
struct ToolDefinition {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ToolChoice {
    Auto,
    Any,
    Tool { name: String },
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[allow(dead_code)]
    id: String,
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    fn accumulate(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// AI service for making generation calls
pub struct AIService {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl AIService {
    /// Create HTTP client with timeout configuration
    fn create_client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build configured HTTP client, using defaults: {}", e);
                Client::new()
            })
    }

    /// Creates a new AI service instance
    /// API key is fetched from ANTHROPIC_API_KEY environment variable
    /// Model can be overridden with ANTHROPIC_MODEL environment variable
    pub fn new() -> Self {
        let api_key = env::var(ANTHROPIC_API_KEY).ok().filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("{} not set - model calls will be refused", ANTHROPIC_API_KEY);
        }

        let model = env::var(ANTHROPIC_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        if model != DEFAULT_MODEL {
            info!("Using custom Anthropic model: {}", model);
        }

        let base_url =
            env::var(ANTHROPIC_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self {
            client: Self::create_client(),
            api_key,
            model,
            base_url,
        }
    }

    /// Creates a new AI service instance with a specific API key and model
    pub fn with_api_key_and_model(api_key: String, model: String) -> Self {
        Self {
            client: Self::create_client(),
            api_key: Some(api_key),
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the service at a different API host (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn api_key(&self) -> AIServiceResult<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AIServiceError::NoApiKey)
    }

    async fn send(
        &self,
        api_key: &str,
        request: &AnthropicRequest,
    ) -> AIServiceResult<AnthropicResponse> {
        let url = format!("{}/v1/messages", self.base_url);

        info!(
            "Making Anthropic API request: model={}, max_tokens={}, messages={}, tools={}",
            request.model,
            request.max_tokens,
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!(
                        "Anthropic API request timed out after {} seconds",
                        REQUEST_TIMEOUT_SECS
                    );
                    AIServiceError::ApiError(format!(
                        "Request timed out after {} seconds",
                        REQUEST_TIMEOUT_SECS
                    ))
                } else if e.is_connect() {
                    error!("Failed to connect to Anthropic API: {}", e);
                    AIServiceError::ApiError(format!("Connection failed: {}", e))
                } else {
                    error!("Anthropic API request failed: {}", e);
                    AIServiceError::RequestFailed(e)
                }
            })?;

        let status = response.status();
        info!("Received response from Anthropic API: status={}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Anthropic API error: {} - {}", status, error_text);
            return Err(AIServiceError::ApiError(format!(
                "API returned {}: {}",
                status, error_text
            )));
        }

        response
            .json::<AnthropicResponse>()
            .await
            .map_err(|e| AIServiceError::ParseError(e.to_string()))
    }
}

impl Default for AIService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelGateway for AIService {
    fn ensure_configured(&self) -> AIServiceResult<()> {
        self.api_key().map(|_| ())
    }

    async fn generate(&self, request: GenerationRequest) -> AIServiceResult<GenerationOutput> {
        let api_key = self.api_key()?;
        let structured = request.output_schema.is_some();

        let mut tools = Vec::new();
        if let Some(tool) = &request.tool {
            tools.push(ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            });
        }
        if let Some(schema) = &request.output_schema {
            tools.push(ToolDefinition {
                name: RESPOND_TOOL.to_string(),
                description: "Deliver the reply to the user. Always finish the turn by calling this tool.".to_string(),
                input_schema: schema.clone(),
            });
        }

        let mut tool_choice = if structured {
            Some(ToolChoice::Any)
        } else if tools.is_empty() {
            None
        } else {
            Some(ToolChoice::Auto)
        };

        let mut messages = prepare_messages(&request.messages);
        let mut usage = Usage::default();
        let mut tool_calls = 0;

        loop {
            let anthropic_request = AnthropicRequest {
                model: self.model.clone(),
                max_tokens: get_max_tokens_for_model(&self.model),
                temperature: DEFAULT_TEMPERATURE,
                messages: messages.clone(),
                system: Some(request.system.clone()).filter(|s| !s.is_empty()),
                tools: tools.clone(),
                tool_choice: tool_choice.clone(),
            };

            let response = self.send(api_key, &anthropic_request).await?;
            usage.accumulate(&response.usage);
            debug!(
                "Anthropic stop_reason={:?}, blocks={}",
                response.stop_reason,
                response.content.len()
            );

            let text = collect_text(&response.content);

            if structured {
                if let Some(input) = find_tool_input(&response.content, RESPOND_TOOL) {
                    return Ok(GenerationOutput {
                        structured: Some(input.clone()),
                        text,
                        tool_calls,
                        usage,
                    });
                }
            }

            let pending: Vec<(&String, &String, &Value)> = response
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { id, name, input } if name != RESPOND_TOOL => {
                        Some((id, name, input))
                    }
                    _ => None,
                })
                .collect();

            if pending.is_empty() {
                if text.trim().is_empty() {
                    error!("Anthropic response carried neither text nor a structured reply");
                    return Err(AIServiceError::InvalidResponse);
                }

                // Model ignored the tool choice and answered in text; accept JSON if it is there
                let structured_output = if structured {
                    parse_json_text(&text).ok()
                } else {
                    None
                };

                return Ok(GenerationOutput {
                    structured: structured_output,
                    text,
                    tool_calls,
                    usage,
                });
            }

            let tool = request.tool.as_ref().ok_or_else(|| {
                error!("Model requested a tool that was not offered");
                AIServiceError::InvalidResponse
            })?;

            let mut results = Vec::with_capacity(pending.len());
            for (id, name, input) in pending {
                if name != tool.name() {
                    error!("Model requested unknown tool: {}", name);
                    return Err(AIServiceError::ApiError(format!("Unknown tool requested: {}", name)));
                }
                if tool_calls >= MAX_TOOL_CALLS {
                    error!("Model requested tool {} more than once", name);
                    return Err(AIServiceError::ToolCallLimit(name.clone()));
                }

                tool_calls += 1;
                info!("Executing tool {} for the model", name);
                let output = tool.call(input)?;
                results.push(ContentBlock::ToolResult {
                    tool_use_id: id.clone(),
                    content: output.to_string(),
                });
            }

            messages.push(Message {
                role: provider_role(ChatRole::Assistant).to_string(),
                content: MessageContent::Blocks(
                    response
                        .content
                        .iter()
                        .filter(|block| !matches!(block, ContentBlock::Unknown))
                        .cloned()
                        .collect(),
                ),
            });
            messages.push(Message {
                role: provider_role(ChatRole::User).to_string(),
                content: MessageContent::Blocks(results),
            });

            if structured {
                tool_choice = Some(ToolChoice::Tool {
                    name: RESPOND_TOOL.to_string(),
                });
            }
        }
    }
}

/// Look up the Anthropic role for a caller role
fn provider_role(role: ChatRole) -> &'static str {
    ROLE_TABLE
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, name)| *name)
        .unwrap_or("user")
}

/// Map caller history onto the provider's message rules.
///
/// The provider requires the conversation to open with a user turn and to
/// alternate roles, so consecutive turns from the same speaker are merged.
fn prepare_messages(history: &[ChatMessage]) -> Vec<Message> {
    let mut messages: Vec<Message> = Vec::with_capacity(history.len() + 1);

    if history.first().map(|m| m.role) != Some(ChatRole::User) {
        messages.push(Message {
            role: provider_role(ChatRole::User).to_string(),
            content: MessageContent::Text(CONVERSATION_OPENER.to_string()),
        });
    }

    for turn in history {
        let role = provider_role(turn.role);
        if let Some(last) = messages.last_mut() {
            if last.role == role {
                if let MessageContent::Text(text) = &mut last.content {
                    text.push_str("\n\n");
                    text.push_str(&turn.content);
                    continue;
                }
            }
        }
        messages.push(Message {
            role: role.to_string(),
            content: MessageContent::Text(turn.content.clone()),
        });
    }

    messages
}

fn collect_text(content: &[ContentBlock]) -> String {
    content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn find_tool_input<'a>(content: &'a [ContentBlock], tool_name: &str) -> Option<&'a Value> {
    content.iter().find_map(|block| match block {
        ContentBlock::ToolUse { name, input, .. } if name == tool_name => Some(input),
        _ => None,
    })
}

/// Strip markdown code fences if present (```json ... ```)
fn strip_code_fences(text: &str) -> &str {
    let cleaned_text = text.trim();
    if cleaned_text.starts_with("```") {
        // Find the first newline after opening fence
        let start = cleaned_text.find('\n').map(|i| i + 1).unwrap_or(0);
        // Find the closing fence (search from start position to avoid finding opening fence)
        let end = cleaned_text[start..]
            .rfind("```")
            .map(|i| i + start)
            .unwrap_or(cleaned_text.len());
        cleaned_text[start..end].trim()
    } else {
        cleaned_text
    }
}

fn parse_json_text(text: &str) -> AIServiceResult<Value> {
    let json_text = strip_code_fences(text);
    serde_json::from_str(json_text).map_err(|e| {
        debug!(
            "Text reply is not JSON: {}. Snippet: {}",
            e,
            json_text.chars().take(200).collect::<String>()
        );
        AIServiceError::ParseError(format!("Failed to parse JSON: {}", e))
    })
}
