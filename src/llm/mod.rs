//! Reqwest-based LLM client implementing OpenAI-compatible Chat Completions streaming.

use std::{pin::Pin, time::Duration};

use anyhow::{Context, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::Error;

/// Anything that can turn a prompt into source text.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, model: &str, temperature: f32) -> crate::Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

#[derive(Debug)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    max_tokens: Option<u32>,
}

impl LlmClient {
    /// Fails with `Error::Configuration` when no API key is available.
    pub fn from_config(cfg: &Config) -> crate::Result<Self> {
        let api_key = cfg.api_key().ok_or_else(|| {
            Error::Configuration(format!(
                "Missing OPENAI_API_KEY. Set it in env or {}",
                cfg.config_path.display()
            ))
        })?;
        let timeout = cfg.request_timeout();
        let base_url = normalize_base_url(&cfg.get("API_BASE_URL").unwrap_or_else(|| "default".into()));
        let max_tokens = cfg.get("MAX_TOKENS").and_then(|v| v.trim().parse::<u32>().ok());

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("building HTTP client: {}", e)))?;

        Ok(Self { http, base_url, api_key, timeout, max_tokens })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn chat_stream(
        &self,
        messages: Vec<ChatMessage>,
        opts: ChatOptions,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>> {
        let http = self.http.clone();
        let base_url = self.base_url.clone();
        let api_key = self.api_key.clone();

        Box::pin(try_stream! {
            let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));

            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("text/event-stream"));
            let hv = HeaderValue::from_str(&format!("Bearer {}", api_key))?;
            headers.insert(AUTHORIZATION, hv);

            let mut body = serde_json::json!({
                "model": opts.model,
                "temperature": opts.temperature,
                "messages": messages,
                "stream": true,
            });
            if let Some(max_tokens) = opts.max_tokens {
                body["max_tokens"] = serde_json::json!(max_tokens);
            }

            let resp = http
                .post(url)
                .headers(headers)
                .json(&body)
                .send()
                .await
                .context("failed to send chat request")?;

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                Err(anyhow::anyhow!("LLM error: {} {}", status, text.trim()))?;
                return;
            }

            // Raw bytes: a multi-byte character may straddle two chunks.
            let mut buf: Vec<u8> = Vec::new();
            let mut stream = resp.bytes_stream();

            while let Some(chunk) = stream.next().await {
                let bytes = chunk.context("stream error")?;
                buf.extend_from_slice(&bytes);
                while let Some(line) = take_line(&mut buf) {
                    let line = std::str::from_utf8(&line).context("invalid UTF-8 in stream")?;
                    match parse_sse_line(line.trim()) {
                        Some(StreamEvent::Done) => { yield StreamEvent::Done; return; }
                        Some(ev) => yield ev,
                        None => {}
                    }
                }
            }
            // unterminated last line
            if !buf.is_empty() {
                let line = std::str::from_utf8(&buf).context("invalid UTF-8 in stream")?;
                if let Some(StreamEvent::Content(t)) = parse_sse_line(line.trim()) {
                    yield StreamEvent::Content(t);
                }
            }
            yield StreamEvent::Done;
        })
    }
}

#[async_trait]
impl CodeGenerator for LlmClient {
    async fn complete(&self, prompt: &str, model: &str, temperature: f32) -> crate::Result<String> {
        let messages = vec![ChatMessage::new(Role::User, prompt)];
        let opts = ChatOptions {
            model: model.to_string(),
            temperature,
            max_tokens: self.max_tokens,
        };

        let collect = async {
            let mut stream = self.chat_stream(messages, opts);
            let mut text = String::new();
            while let Some(ev) = stream.next().await {
                match ev? {
                    StreamEvent::Content(t) => text.push_str(&t),
                    StreamEvent::Done => break,
                }
            }
            Ok::<_, anyhow::Error>(text)
        };

        let text = tokio::time::timeout(self.timeout, collect)
            .await
            .map_err(|_| Error::generation(format!("no completion within {:?}", self.timeout)))?
            .map_err(|e| Error::generation(format!("{:#}", e)))?;

        if text.trim().is_empty() {
            return Err(Error::generation("model returned an empty completion"));
        }
        debug!(model, chars = text.len(), "completion received");
        Ok(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Content(String),
    Done,
}

fn normalize_base_url(api_base_url: &str) -> String {
    if api_base_url == "default" {
        return "https://api.openai.com/v1".to_string();
    }
    let trimmed = api_base_url.trim_end_matches('/');
    if !trimmed.ends_with("/v1") && !trimmed.contains("/v1/") {
        format!("{}/v1", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Remove and return the next `\n`-terminated line, without the terminator.
fn take_line(buf: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = buf.iter().position(|b| *b == b'\n')?;
    let mut line: Vec<u8> = buf.drain(..=pos).collect();
    line.pop();
    Some(line)
}

fn parse_sse_line(line: &str) -> Option<StreamEvent> {
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let payload = line.strip_prefix("data:")?.trim();
    if payload == "[DONE]" {
        return Some(StreamEvent::Done);
    }
    // ignore malformed lines
    let chunk = serde_json::from_str::<Chunk>(payload).ok()?;
    let content: String = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.and_then(|d| d.content))
        .collect();
    if content.is_empty() {
        None
    } else {
        Some(StreamEvent::Content(content))
    }
}

// Minimal chunk structures for OpenAI-like streaming
#[derive(Debug, Deserialize)]
struct Chunk {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}
