//! Chat-completions client for OpenAI and OpenAI-compatible servers (Ollama).

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use homesearch_core::config::LlmConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::llm::{ChatMessage, LlmClient, ModelTurn, Role, ToolCall, ToolSpec};

pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
}

impl OpenAiChatClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.map(|key| SecretString::from(key.to_owned()));
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build llm http client")?;
        Ok(Self {
            client,
            base_url: config.effective_base_url(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn request_body(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Value {
        let mut body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": messages.iter().map(wire_message).collect::<Vec<_>>(),
        });
        if !tools.is_empty() {
            body["tools"] = tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect();
        }
        body
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn wire_message(message: &ChatMessage) -> Value {
    let mut wire = json!({"role": role_name(message.role), "content": message.content});
    if !message.tool_calls.is_empty() {
        wire["tool_calls"] = message
            .tool_calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {"name": call.name, "arguments": call.arguments.to_string()},
                })
            })
            .collect();
    }
    if let Some(call_id) = &message.tool_call_id {
        wire["tool_call_id"] = json!(call_id);
    }
    wire
}

/// Reads the first choice of a chat-completions response. Tool arguments
/// that are not valid JSON are kept as a string so the tool can reject them.
pub fn parse_completion(body: &Value) -> Result<ModelTurn> {
    if let Some(error) = body.get("error") {
        let message = error.get("message").and_then(Value::as_str).unwrap_or("unknown error");
        bail!("model returned an error: {message}");
    }
    let message = body
        .pointer("/choices/0/message")
        .ok_or_else(|| anyhow!("completion has no choices[0].message"))?;

    let content = message.get("content").and_then(Value::as_str).unwrap_or_default().to_owned();
    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .filter_map(|call| {
            let name = call.pointer("/function/name").and_then(Value::as_str)?;
            let raw = call.pointer("/function/arguments");
            let arguments = match raw {
                Some(Value::String(text)) => {
                    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
                }
                Some(other) => other.clone(),
                None => json!({}),
            };
            Some(ToolCall {
                id: call.get("id").and_then(Value::as_str).unwrap_or_default().to_owned(),
                name: name.to_owned(),
                arguments,
            })
        })
        .collect();

    Ok(ModelTurn { content, tool_calls })
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ModelTurn> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.client.post(&url).json(&self.request_body(messages, tools));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.context("llm request failed")?;
        let status = response.status();
        let body: Value = response.json().await.context("llm response was not json")?;
        if !status.is_success() {
            warn!(
                event_name = "agent.llm.failed",
                status = status.as_u16(),
                model = %self.model,
                "chat completion returned a non-success status"
            );
        }
        let turn = parse_completion(&body)
            .with_context(|| format!("chat completion failed with status {status}"))?;
        debug!(
            event_name = "agent.llm.completed",
            model = %self.model,
            tool_calls = turn.tool_calls.len(),
            "chat completion received"
        );
        Ok(turn)
    }
}

#[cfg(test)]
mod tests {
    use homesearch_core::config::{LlmConfig, LlmProvider};
    use serde_json::json;

    use super::{parse_completion, OpenAiChatClient};
    use crate::llm::{ChatMessage, ToolCall, ToolSpec};

    fn ollama() -> LlmConfig {
        LlmConfig {
            provider: LlmProvider::Ollama,
            api_key: None,
            base_url: None,
            model: "llama3.1".to_owned(),
            temperature: 0.0,
            timeout_secs: 10,
        }
    }

    #[test]
    fn openai_without_a_key_is_rejected() {
        let config = LlmConfig { provider: LlmProvider::OpenAi, ..ollama() };
        assert!(OpenAiChatClient::from_config(&config).is_err());
    }

    #[test]
    fn request_body_carries_tools_and_tool_messages() {
        let client = OpenAiChatClient::from_config(&ollama()).expect("client");
        let call = ToolCall {
            id: "call_1".to_owned(),
            name: "search_agent".to_owned(),
            arguments: json!({"Name": "Ana"}),
        };
        let messages = vec![
            ChatMessage::user("find Ana"),
            ChatMessage::assistant_calls("", vec![call]),
            ChatMessage::tool_result("call_1", "[]"),
        ];
        let tools = vec![ToolSpec {
            name: "search_agent".to_owned(),
            description: "Search agents by name".to_owned(),
            parameters: json!({"type": "object"}),
        }];

        let body = client.request_body(&messages, &tools);

        assert_eq!(body["model"], "llama3.1");
        assert_eq!(body["tools"][0]["function"]["name"], "search_agent");
        let arguments = &body["messages"][1]["tool_calls"][0]["function"]["arguments"];
        assert_eq!(arguments, r#"{"Name":"Ana"}"#);
        assert_eq!(body["messages"][2]["role"], "tool");
        assert_eq!(body["messages"][2]["tool_call_id"], "call_1");
    }

    #[test]
    fn request_body_omits_empty_tool_list() {
        let client = OpenAiChatClient::from_config(&ollama()).expect("client");
        let body = client.request_body(&[ChatMessage::user("hi")], &[]);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn completion_tool_calls_are_parsed_in_order() {
        let body = json!({"choices": [{"message": {
            "content": null,
            "tool_calls": [
                {"id": "a", "function": {"name": "search_properties", "arguments": "{\"fields\": {\"city\": [\"Houston\"]}}"}},
                {"id": "b", "function": {"name": "search_agent", "arguments": "not json"}}
            ]
        }}]});

        let turn = parse_completion(&body).expect("turn");

        assert_eq!(turn.content, "");
        assert_eq!(turn.tool_calls[0].name, "search_properties");
        assert_eq!(turn.tool_calls[0].arguments["fields"]["city"][0], "Houston");
        assert_eq!(turn.tool_calls[1].arguments, json!("not json"));
    }

    #[test]
    fn error_bodies_fail() {
        let error = parse_completion(&json!({"error": {"message": "quota"}})).expect_err("error");
        assert!(error.to_string().contains("quota"));
        assert!(parse_completion(&json!({"choices": []})).is_err());
    }
}
