//! Anthropic-messages compatible HTTP client (MiniMax exposes the same API).

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{LlmClient, MessageRequest, MessageResponse};
use crate::error::LlmError;

pub const DEFAULT_MESSAGES_URL: &str = "https://api.minimax.io/anthropic/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<Value>,
}

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl AnthropicClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            url: url.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn body(&self, request: &MessageRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "messages": request.messages,
            "temperature": request.temperature,
        });
        if !request.tools.is_empty() {
            body["tools"] = json!(request.tools);
        }
        body
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn create_message(&self, request: MessageRequest) -> Result<MessageResponse, LlmError> {
        debug!(
            "🧠 {} request: {} messages, {} tools",
            self.model,
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ApiResponse = response.json().await.map_err(|e| LlmError::Decode(e.to_string()))?;
        Ok(MessageResponse::from_blocks(parsed.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Message, ToolDefinition};

    #[test]
    fn test_body_omits_empty_tool_list() {
        let client = AnthropicClient::new("key", "MiniMax-M2.5", DEFAULT_MESSAGES_URL, Duration::from_secs(5)).unwrap();

        let plain = client.body(&MessageRequest::new("sys", vec![Message::user("hi")]));
        assert_eq!(plain["model"], "MiniMax-M2.5");
        assert_eq!(plain["max_tokens"], 2000);
        assert_eq!(plain["messages"][0]["role"], "user");
        assert_eq!(plain["messages"][0]["content"], "hi");
        assert!(plain.get("tools").is_none());

        let with_tools = client.body(
            &MessageRequest::new("sys", vec![]).with_tools(vec![ToolDefinition {
                name: "resolve_entity",
                description: "d",
                input_schema: json!({ "type": "object" }),
            }]),
        );
        assert_eq!(with_tools["tools"][0]["name"], "resolve_entity");
        assert_eq!(with_tools["tools"][0]["input_schema"]["type"], "object");
    }
}
