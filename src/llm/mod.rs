//! OpenAI-compatible chat-completions client with Cloud/Local base-URL
//! selection and an automatic cloud-to-local reachability fallback.

use std::net::TcpStream;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::AssistantError;

/// Matches the original implementation's `GPT_MAX_TOKENS`.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Default timeout for the reachability probe.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(4);

/// Which backend the adapter currently targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmTarget {
    Cloud,
    Local,
}

/// One turn of the conversation, in OpenAI chat-completions shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

/// A message's content is either a plain string or a multi-part array
/// (used when attaching a vision image).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: "system".into(), content: MessageContent::Text(text.into()) }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self { role: "user".into(), content: MessageContent::Text(text.into()) }
    }

    pub fn user_with_image(text: impl Into<String>, base64_jpeg: &str) -> Self {
        Self {
            role: "user".into(),
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: format!("data:image/jpeg;base64,{base64_jpeg}") },
                },
            ]),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: "assistant".into(), content: MessageContent::Text(text.into()) }
    }
}

/// Result of a successful completion, as handed back to the caller.
pub struct LlmReply {
    pub content: String,
    pub total_tokens: Option<u64>,
    pub finish_reason: Option<String>,
}

/// Running conversation, with the system prompt pinned as the first entry.
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
    max_turns: Option<usize>,
}

impl ConversationHistory {
    pub fn new(system_prompt: impl Into<String>, max_turns: Option<usize>) -> Self {
        Self { messages: vec![ChatMessage::system(system_prompt)], max_turns }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if let Some(max) = self.max_turns {
            // +1 accounts for the pinned system prompt, which never rolls off.
            let cap = max + 1;
            if self.messages.len() > cap {
                let overflow = self.messages.len() - cap;
                self.messages.drain(1..1 + overflow);
            }
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

pub struct LlmClient {
    client: reqwest::Client,
    cloud_base_url: String,
    local_base_url: String,
    api_key: Option<String>,
    model_cloud: String,
    model_local: String,
    probe_timeout: Duration,
}

impl LlmClient {
    pub fn new(
        cloud_base_url: impl Into<String>,
        local_base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_base_url: cloud_base_url.into(),
            local_base_url: local_base_url.into(),
            api_key,
            model_cloud: "gpt-4o-mini".to_string(),
            model_local: "local-model".to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Resolve which base URL/model to use for `target`, falling back from
    /// Cloud to Local when the cloud host is unreachable. Returns `None` when
    /// neither backend is reachable.
    fn resolve(&self, target: LlmTarget) -> Option<(String, &str, bool)> {
        match target {
            LlmTarget::Cloud => {
                if is_reachable(&self.cloud_base_url, self.probe_timeout) {
                    Some((self.cloud_base_url.clone(), self.model_cloud.as_str(), false))
                } else if is_reachable(&self.local_base_url, self.probe_timeout) {
                    warn!("Cloud LLM unreachable, falling back to local");
                    Some((self.local_base_url.clone(), self.model_local.as_str(), true))
                } else {
                    None
                }
            }
            LlmTarget::Local => {
                if is_reachable(&self.local_base_url, self.probe_timeout) {
                    Some((self.local_base_url.clone(), self.model_local.as_str(), false))
                } else {
                    None
                }
            }
        }
    }

    /// Send the full conversation to the resolved backend and return the
    /// assistant's reply. `fell_back` in the returned tuple is true when a
    /// cloud request was silently redirected to local.
    pub async fn complete(
        &self,
        target: LlmTarget,
        history: &ConversationHistory,
    ) -> Result<(LlmReply, bool), AssistantError> {
        let Some((base_url, model, fell_back)) = self.resolve(target) else {
            return Err(AssistantError::Llm("no reachable backend".to_string()));
        };

        let body = json!({
            "model": model,
            "messages": history.messages(),
            "max_tokens": DEFAULT_MAX_TOKENS,
        });

        let mut req = self
            .client
            .post(format!("{base_url}/v1/chat/completions"))
            .json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| AssistantError::Llm(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AssistantError::Llm(format!("backend returned {status}: {text}")));
        }

        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| AssistantError::Llm(format!("invalid JSON response: {e}")))?;

        let content = value["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AssistantError::Llm("missing choices[0].message.content".to_string()))?
            .to_string();

        let total_tokens = value["usage"]["total_tokens"].as_u64();
        let finish_reason = value["choices"][0]["finish_reason"].as_str().map(|s| s.to_string());

        debug!(total_tokens, finish_reason = ?finish_reason, "LLM completion");

        Ok((LlmReply { content, total_tokens, finish_reason }, fell_back))
    }
}

/// Non-blocking reachability probe: attempt a TCP connect to the host:port
/// encoded in `base_url`, bounded by `timeout`.
fn is_reachable(base_url: &str, timeout: Duration) -> bool {
    let Ok(url) = reqwest::Url::parse(base_url) else { return false };
    let Some(host) = url.host_str() else { return false };
    let port = url.port_or_known_default().unwrap_or(443);
    use std::net::ToSocketAddrs;
    let Ok(mut addrs) = (host, port).to_socket_addrs() else { return false };
    addrs.next().map(|addr| TcpStream::connect_timeout(&addr, timeout).is_ok()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_pins_system_prompt_and_caps_turns() {
        let mut history = ConversationHistory::new("you are friday", Some(2));
        history.push(ChatMessage::user("one"));
        history.push(ChatMessage::assistant("reply one"));
        history.push(ChatMessage::user("two"));
        history.push(ChatMessage::assistant("reply two"));
        // system prompt + last 2 turns (4 messages) = 5
        assert_eq!(history.messages().len(), 5);
        assert_eq!(history.messages()[0].role, "system");
    }

    #[test]
    fn unreachable_host_probe_fails_fast() {
        assert!(!is_reachable("http://127.0.0.1:1", Duration::from_millis(200)));
    }
}
