//! LLM Client — the single point of entry for all chat-completion calls.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! The game engine only sees the `PromptClient` trait; provider choice,
//! retries and fallback between providers stay inside this module.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod extract;
pub mod prompts;

#[cfg(test)]
pub mod testing;

/// Attempts per provider, including the first one.
pub const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(1);
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {provider} (status {status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("{provider} did not answer within {after:?}")]
    Timeout { provider: String, after: Duration },

    #[error("No LLM providers configured")]
    NoProviders,
}

/// One OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct Provider {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// A prompt split into its system template and the user-turn instruction.
/// Both may contain `{name}` placeholders.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub system: &'static str,
    pub instruction: &'static str,
}

/// Named values substituted into a `PromptTemplate`.
pub type PromptVars<'a> = [(&'a str, String)];

/// The boundary the game engine calls through.
#[async_trait]
pub trait PromptClient: Send + Sync {
    async fn generate(
        &self,
        template: &PromptTemplate,
        vars: &PromptVars<'_>,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if it carries any non-blank content.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completions client over an ordered list of providers.
///
/// Each provider gets a fixed time budget covering all of its attempts, so a
/// hung provider hands over to the next one instead of eating the caller's
/// whole deadline.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    providers: Vec<Provider>,
    temperature: f32,
    provider_budget: Duration,
    retry_base: Duration,
}

/// Outcome of a single failed HTTP attempt.
enum AttemptError {
    /// Worth another try against the same provider (transport, 429, 5xx).
    Retryable(LlmError),
    /// The provider answered and retrying will not help.
    Fatal(LlmError),
}

impl LlmClient {
    pub fn new(
        providers: Vec<Provider>,
        temperature: f32,
        http_timeout: Duration,
        provider_budget: Duration,
    ) -> Result<Self, LlmError> {
        if providers.is_empty() {
            return Err(LlmError::NoProviders);
        }
        Ok(Self {
            client: Client::builder().timeout(http_timeout).build()?,
            providers,
            temperature,
            provider_budget,
            retry_base: DEFAULT_RETRY_BASE,
        })
    }

    /// Overrides the first backoff step (1s by default).
    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    /// Name and model of the provider tried first.
    pub fn primary(&self) -> (&str, &str) {
        let p = &self.providers[0];
        (&p.name, &p.model)
    }

    /// Sends one system + user exchange, falling back across providers.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let mut last_error = None;

        for provider in &self.providers {
            let call = self.call_provider(provider, system, user);
            let result = match tokio::time::timeout(self.provider_budget, call).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout {
                    provider: provider.name.clone(),
                    after: self.provider_budget,
                }),
            };
            match result {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!("LLM provider {} failed: {e}", provider.name);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(LlmError::NoProviders))
    }

    /// Calls a single provider. Retries on transport errors, 429 and 5xx with
    /// exponential backoff; the error returned is the one from the last attempt.
    async fn call_provider(
        &self,
        provider: &Provider,
        system: &str,
        user: &str,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", provider.base_url.trim_end_matches('/'));
        let request_body = ChatRequest {
            model: &provider.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens: MAX_TOKENS,
        };

        let mut attempt = 1;
        loop {
            let error = match self.send_once(provider, &url, &request_body).await {
                Ok(text) => return Ok(text),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Retryable(e)) => e,
            };

            if attempt >= MAX_ATTEMPTS {
                return Err(error);
            }

            let delay = backoff_delay(self.retry_base, attempt);
            warn!(
                "{} attempt {} failed ({error}), retrying after {}ms...",
                provider.name,
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send_once(
        &self,
        provider: &Provider,
        url: &str,
        request_body: &ChatRequest<'_>,
    ) -> Result<String, AttemptError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&provider.api_key)
            .json(request_body)
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(LlmError::Http(e)))?;

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Retryable(LlmError::Api {
                provider: provider.name.clone(),
                status: status.as_u16(),
                message: api_error_message(body),
            }));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Fatal(LlmError::Api {
                provider: provider.name.clone(),
                status: status.as_u16(),
                message: api_error_message(body),
            }));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Fatal(LlmError::Http(e)))?;

        if let Some(usage) = &chat.usage {
            debug!(
                "{} call succeeded: prompt_tokens={}, completion_tokens={}",
                provider.name, usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat.text()
            .map(str::to_string)
            .ok_or(AttemptError::Fatal(LlmError::EmptyContent))
    }
}

/// Delay before retry number `attempt` (1-based): base, 2×base, 4×base...
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * (1 << (attempt - 1))
}

#[async_trait]
impl PromptClient for LlmClient {
    async fn generate(
        &self,
        template: &PromptTemplate,
        vars: &PromptVars<'_>,
    ) -> Result<String, LlmError> {
        let system = render_template(template.system, vars);
        let user = render_template(template.instruction, vars);
        self.complete(&system, &user).await
    }
}

/// Substitutes `{name}` placeholders in a single pass.
///
/// Substituted values are never rescanned, so a player typing `{scenario}`
/// gets that literal text back. Braces that do not name a known variable
/// (JSON examples in the prompt) are left as-is.
pub fn render_template(template: &str, vars: &PromptVars<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Pulls `error.message` out of an OpenAI-style error body, or returns the body.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}
