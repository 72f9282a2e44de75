use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

use crate::{WeatherError, config::UpstreamConfig, provider::openweather::truncate_body};

const SERVICE: &str = "openai";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const MAX_TOKENS: u32 = 10;

/// A single-turn chat completion.
#[async_trait]
pub trait ChatModel: Send + Sync + Debug {
    async fn complete(&self, system: &str, user: &str) -> Result<String, WeatherError>;
}

#[derive(Clone)]
pub struct OpenAiChat {
    api_key: String,
    base_url: String,
    model: String,
    http: Client,
}

impl fmt::Debug for OpenAiChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiChat")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiChat {
    pub fn new(api_key: String, upstream: &UpstreamConfig) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(upstream.timeout())
            .build()
            .map_err(|e| WeatherError::from_transport(SERVICE, e))?;

        Ok(Self {
            api_key,
            base_url: upstream.openai_base_url.trim_end_matches('/').to_string(),
            model: upstream.openai_model.clone(),
            http,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String, WeatherError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            max_tokens: MAX_TOKENS,
        };

        let res = self
            .http
            .post(format!("{}{}", self.base_url, COMPLETIONS_PATH))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| WeatherError::from_transport(SERVICE, e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::from_transport(SERVICE, e))?;

        if !status.is_success() {
            tracing::warn!(%status, "OpenAI completion failed");
            return Err(WeatherError::UpstreamUnavailable {
                service: SERVICE,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::UpstreamData { service: SERVICE, detail: e.to_string() }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| WeatherError::UpstreamData {
                service: SERVICE,
                detail: "completion contained no message".to_string(),
            })
    }
}
