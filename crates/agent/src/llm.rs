//! Text-completion backends.
//!
//! The pipeline only needs "prompt in, text out". Providers differ in wire
//! format, so each one is a branch of [`HttpLlmClient`]; tests swap in their
//! own [`LlmClient`] implementations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moduvisor_core::config::{LlmConfig, LlmProvider, MAX_LLM_RETRIES};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_OUTPUT_TOKENS: u32 = 1024;
const TEMPERATURE: f32 = 0.2;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("llm transport error: {0}")]
    Transport(String),
    #[error("llm call timed out after {0}ms")]
    Timeout(u64),
    #[error("llm rate limit exceeded")]
    RateLimited,
    #[error("llm endpoint returned status {0}")]
    Status(u16),
    #[error("llm response could not be decoded: {0}")]
    Decode(String),
    #[error("llm provider is disabled")]
    Disabled,
}

impl LlmError {
    /// Errors worth another attempt. Malformed output and client errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) | Self::RateLimited => true,
            Self::Status(code) => *code >= 500,
            Self::Decode(_) | Self::Disabled => false,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Timeout and retry budget applied around every model call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: MAX_LLM_RETRIES,
            backoff: Duration::from_millis(250),
        }
    }
}

impl CallPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Calls `client`, retrying transient failures up to `max_retries` times
    /// (never more than [`MAX_LLM_RETRIES`]).
    pub async fn complete(
        &self,
        client: &dyn LlmClient,
        prompt: &str,
        stage: &'static str,
        correlation_id: &str,
    ) -> Result<String, LlmError> {
        let retries = self.max_retries.min(MAX_LLM_RETRIES);
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.timeout, client.complete(prompt)).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(duration_millis(self.timeout))),
            };

            match result {
                Ok(text) => {
                    debug!(
                        event_name = "llm.call.completed",
                        correlation_id,
                        stage,
                        attempt,
                        response_chars = text.chars().count(),
                        "llm call completed"
                    );
                    return Ok(text);
                }
                Err(error) if error.is_transient() && attempt < retries => {
                    attempt += 1;
                    warn!(
                        event_name = "llm.call.retry",
                        correlation_id,
                        stage,
                        attempt,
                        error = %error,
                        "transient llm failure, retrying"
                    );
                    if !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff * attempt).await;
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Always refuses; selecting `provider = "disabled"` runs the pipeline on its
/// local fallbacks only.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledLlmClient;

#[async_trait]
impl LlmClient for DisabledLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Disabled)
    }
}

#[derive(Clone, Debug)]
pub struct HttpLlmClient {
    client: reqwest::Client,
    provider: LlmProvider,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(config.provider).to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            provider: config.provider,
            base_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn endpoint(&self) -> String {
        match self.provider {
            LlmProvider::OpenAi => format!("{}/chat/completions", self.base_url),
            LlmProvider::Anthropic => format!("{}/v1/messages", self.base_url),
            LlmProvider::Ollama => format!("{}/api/generate", self.base_url),
            LlmProvider::Disabled => String::new(),
        }
    }

    async fn complete_openai(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: TEMPERATURE,
        };
        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response: ChatResponse = send(request).await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Decode("response had no choices".to_string()))
    }

    async fn complete_anthropic(&self, prompt: &str) -> Result<String, LlmError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };
        let mut request = self
            .client
            .post(self.endpoint())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key.expose_secret());
        }

        let response: MessagesResponse = send(request).await?;
        let text = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(LlmError::Decode("response had no text blocks".to_string()));
        }
        Ok(text)
    }

    async fn complete_ollama(&self, prompt: &str) -> Result<String, LlmError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature: TEMPERATURE },
        };
        let request = self.client.post(self.endpoint()).json(&body);

        let response: GenerateResponse = send(request).await?;
        Ok(response.response)
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        match self.provider {
            LlmProvider::OpenAi => self.complete_openai(prompt).await,
            LlmProvider::Anthropic => self.complete_anthropic(prompt).await,
            LlmProvider::Ollama => self.complete_ollama(prompt).await,
            LlmProvider::Disabled => Err(LlmError::Disabled),
        }
    }
}

/// Client for the configured provider.
pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    match config.provider {
        LlmProvider::Disabled => Ok(Arc::new(DisabledLlmClient)),
        _ => Ok(Arc::new(HttpLlmClient::from_config(config)?)),
    }
}

fn default_base_url(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => OPENAI_DEFAULT_BASE_URL,
        LlmProvider::Anthropic => ANTHROPIC_DEFAULT_BASE_URL,
        LlmProvider::Ollama | LlmProvider::Disabled => OLLAMA_DEFAULT_BASE_URL,
    }
}

async fn send<T>(request: reqwest::RequestBuilder) -> Result<T, LlmError>
where
    T: for<'de> Deserialize<'de>,
{
    let response = request.send().await.map_err(map_transport_error)?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimited);
    }
    if !status.is_success() {
        return Err(LlmError::Status(status.as_u16()));
    }

    response.json::<T>().await.map_err(|error| LlmError::Decode(error.to_string()))
}

fn map_transport_error(error: reqwest::Error) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout(0)
    } else {
        LlmError::Transport(error.to_string())
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use moduvisor_core::config::{AppConfig, LlmProvider};

    use super::{CallPolicy, HttpLlmClient, LlmClient, LlmError};

    struct FlakyClient {
        failures: Vec<LlmError>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmClient for FlakyClient {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            match self.failures.get(call) {
                Some(error) => Err(error.clone()),
                None => Ok("{\"ok\":true}".to_string()),
            }
        }
    }

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(String::new())
        }
    }

    fn policy(max_retries: u32) -> CallPolicy {
        CallPolicy { timeout: Duration::from_millis(200), max_retries, backoff: Duration::ZERO }
    }

    #[tokio::test]
    async fn transient_error_is_retried_once() {
        let client = FlakyClient {
            failures: vec![LlmError::RateLimited],
            calls: AtomicU32::new(0),
        };

        let result = policy(1).complete(&client, "prompt", "classify", "req-1").await;

        assert_eq!(result, Ok("{\"ok\":true}".to_string()));
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retry_budget_is_capped_at_one() {
        let client = FlakyClient {
            failures: vec![LlmError::Status(503), LlmError::Status(503), LlmError::Status(503)],
            calls: AtomicU32::new(0),
        };

        let result = policy(5).complete(&client, "prompt", "classify", "req-2").await;

        assert_eq!(result, Err(LlmError::Status(503)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn default_config_makes_two_attempts_per_call() {
        let client = FlakyClient {
            failures: vec![LlmError::Transport("reset".to_string()); 4],
            calls: AtomicU32::new(0),
        };
        let policy =
            CallPolicy::from_config(&AppConfig::default().llm).with_backoff(Duration::ZERO);

        let result = policy.complete(&client, "prompt", "classify", "req-5").await;

        assert!(matches!(result, Err(LlmError::Transport(_))));
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        assert_eq!(policy.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let client = FlakyClient {
            failures: vec![LlmError::Status(401)],
            calls: AtomicU32::new(0),
        };

        let result = policy(3).complete(&client, "prompt", "narrate", "req-3").await;

        assert_eq!(result, Err(LlmError::Status(401)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let result = policy(0).complete(&SlowClient, "prompt", "classify", "req-4").await;
        assert_eq!(result, Err(LlmError::Timeout(200)));
    }

    #[test]
    fn endpoints_follow_provider_defaults() {
        let mut config = AppConfig::default().llm;

        let ollama = HttpLlmClient::from_config(&config).expect("client builds");
        assert_eq!(ollama.endpoint(), "http://localhost:11434/api/generate");

        config.provider = LlmProvider::OpenAi;
        config.base_url = Some("https://gateway.example.com/v1/".to_string());
        let openai = HttpLlmClient::from_config(&config).expect("client builds");
        assert_eq!(openai.endpoint(), "https://gateway.example.com/v1/chat/completions");

        config.provider = LlmProvider::Anthropic;
        config.base_url = None;
        let anthropic = HttpLlmClient::from_config(&config).expect("client builds");
        assert_eq!(anthropic.endpoint(), "https://api.anthropic.com/v1/messages");
    }
}
