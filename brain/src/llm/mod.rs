//! LLM collaborator contract.
//!
//! Requests follow the Anthropic messages shape (system prompt, message
//! transcript, optional tool catalogue). Responses are reduced to the joined
//! assistant text, the tool calls, and the raw content blocks so the caller
//! can replay the assistant turn on the next round-trip.

pub mod anthropic;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::LlmError;

pub use anthropic::AnthropicClient;
pub use mock::ScriptedLlm;

pub const DEFAULT_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// `content` is either a plain string or a list of content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Value,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Value::String(text.into()),
        }
    }

    pub fn assistant_blocks(blocks: Vec<Value>) -> Self {
        Self {
            role: Role::Assistant,
            content: Value::Array(blocks),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl MessageRequest {
    pub fn new(system: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            system: system.into(),
            messages,
            tools: Vec::new(),
            temperature: 0.1,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub assistant_content: Vec<Value>,
}

impl MessageResponse {
    /// Plain text answer with a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            assistant_content: vec![json!({ "type": "text", "text": text })],
            text,
            tool_calls: Vec::new(),
        }
    }

    /// Tool-use turn; `calls` are `(id, name, input)`.
    pub fn tool_calls<I>(calls: I) -> Self
    where
        I: IntoIterator<Item = (String, String, Value)>,
    {
        let mut response = Self::default();
        for (id, name, input) in calls {
            let input = match input {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            response.assistant_content.push(json!({
                "type": "tool_use",
                "id": id,
                "name": name,
                "input": input,
            }));
            response.tool_calls.push(ToolCall { id, name, input });
        }
        response
    }

    /// Splits raw Anthropic content blocks. Text blocks are joined with
    /// newlines and trimmed; unknown block types are kept only in
    /// `assistant_content`.
    pub fn from_blocks(blocks: Vec<Value>) -> Self {
        let text = blocks
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        let tool_calls = blocks
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("tool_use"))
            .map(|block| ToolCall {
                id: block.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
                name: block.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                input: block
                    .get("input")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            text,
            tool_calls,
            assistant_content: blocks,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn create_message(&self, request: MessageRequest) -> Result<MessageResponse, LlmError>;
}

/// Model answers sometimes wrap JSON in a fenced block; accepts both.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// User turn carrying one tool result. `content` is sent as a JSON string.
pub fn tool_result_message(tool_use_id: &str, content: &Value, is_error: bool) -> Message {
    Message {
        role: Role::User,
        content: json!([{
            "type": "tool_result",
            "tool_use_id": tool_use_id,
            "content": content.to_string(),
            "is_error": is_error,
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_blocks_splits_text_and_tools() {
        let response = MessageResponse::from_blocks(vec![
            json!({ "type": "thinking", "thinking": "hmm" }),
            json!({ "type": "text", "text": " first " }),
            json!({ "type": "tool_use", "id": "tu_1", "name": "resolve_entity", "input": { "identifier": "SOL" } }),
            json!({ "type": "text", "text": "second" }),
            json!({ "type": "tool_use", "id": "tu_2", "name": "get_cached_research" }),
        ]);

        assert_eq!(response.text, "first \nsecond");
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].name, "resolve_entity");
        assert_eq!(response.tool_calls[0].input["identifier"], "SOL");
        assert!(response.tool_calls[1].input.is_empty());
        assert_eq!(response.assistant_content.len(), 5);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence(" {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("```json {} "), "```json {}");
    }

    #[test]
    fn test_tool_result_message_shape() {
        let message = tool_result_message("tu_9", &json!({ "found": false }), true);
        assert_eq!(message.role, Role::User);
        assert_eq!(
            message.content,
            json!([{
                "type": "tool_result",
                "tool_use_id": "tu_9",
                "content": "{\"found\":false}",
                "is_error": true,
            }])
        );
    }

    #[test]
    fn test_scripted_tool_calls_mirror_blocks() {
        let response = MessageResponse::tool_calls(vec![(
            "tu_1".to_string(),
            "get_token_metadata".to_string(),
            json!({ "mint": "abc" }),
        )]);
        let replayed = MessageResponse::from_blocks(response.assistant_content.clone());
        assert_eq!(replayed.tool_calls, response.tool_calls);
        assert_eq!(replayed.text, "");
    }
}
