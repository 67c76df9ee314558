/// LLM Client: the single point of entry for all reasoning-service calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Callers depend on the `ReasoningService` trait so tests can stub the service.
///
/// Every call is bounded by a per-call timeout; expiry is reported as a failure
/// like any other and the caller's fallback takes over.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::FailureKind;

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Model used on the first attempt of every call.
pub const MODEL: &str = "claude-sonnet-4-5";
/// Cheaper substitute used on retries.
pub const FALLBACK_MODEL: &str = "claude-haiku-4-5";
const MAX_TOKENS: u32 = 2048;
const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY_MS: u64 = 500;
const BACKOFF_MULTIPLIER: u64 = 3;

lazy_static! {
    /// Outermost `{ ... }` span in free text.
    static ref EMBEDDED_OBJECT: Regex =
        Regex::new(r"(?s)\{.*\}").expect("embedded-object pattern is valid");
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Reasoning service is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Call timed out after {0}s")]
    Timeout(u64),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Quota or capacity exhausted (status {status}) after {retries} attempts")]
    QuotaExceeded { status: u16, retries: u32 },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Maps the transport-level error onto the failure taxonomy used by the fallbacks.
    pub fn kind(&self) -> FailureKind {
        match self {
            LlmError::QuotaExceeded { .. } => FailureKind::QuotaExceeded,
            LlmError::Parse(_) | LlmError::EmptyContent => FailureKind::MalformedResponse,
            LlmError::NotConfigured
            | LlmError::Http(_)
            | LlmError::Timeout(_)
            | LlmError::Api { .. } => FailureKind::ServiceUnavailable,
        }
    }
}

/// The external reasoning service. `LlmClient` is the production backend.
///
/// Carried in `AppState` as `Arc<dyn ReasoningService>`.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Sends one instruction and returns the raw text of the reply.
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;

    /// False when the backend can never answer (e.g. no credentials). Callers
    /// skip optional service tiers instead of treating that as a failure.
    fn is_available(&self) -> bool {
        true
    }
}

/// Request body for the Messages API.
#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub system: &'a str,
    pub messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Status and raw body of one exchange with the API.
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

/// One HTTP round trip. The retry policy in `LlmClient::call` sits on top.
#[async_trait]
pub trait MessagesTransport: Send + Sync {
    async fn send(&self, request: &MessagesRequest<'_>) -> Result<RawReply, LlmError>;
}

/// reqwest-backed transport to the Anthropic endpoint.
pub struct HttpTransport {
    client: Client,
    api_key: String,
}

impl HttpTransport {
    pub fn new(api_key: String, call_timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(call_timeout)
                .build()
                .unwrap_or_default(),
            api_key,
        }
    }
}

#[async_trait]
impl MessagesTransport for HttpTransport {
    async fn send(&self, request: &MessagesRequest<'_>) -> Result<RawReply, LlmError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawReply { status, body })
    }
}

/// Wraps the Messages API with retry, model substitution and a per-call timeout.
#[derive(Clone)]
pub struct LlmClient {
    transport: Option<Arc<dyn MessagesTransport>>,
    call_timeout: Duration,
}

impl LlmClient {
    /// No key means no transport; every call then fails fast with `NotConfigured`.
    pub fn new(api_key: Option<String>, call_timeout: Duration) -> Self {
        let transport = api_key.map(|key| {
            Arc::new(HttpTransport::new(key, call_timeout)) as Arc<dyn MessagesTransport>
        });
        Self::with_transport(transport, call_timeout)
    }

    pub fn with_transport(
        transport: Option<Arc<dyn MessagesTransport>>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            call_timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Makes a raw call to the API, returning the full response object.
    /// Retries on 429/529 (quota, capacity), other 5xx and transport errors with
    /// exponential backoff; retries switch to `FALLBACK_MODEL`. Once any attempt
    /// hits the quota, exhausting the retries reports `QuotaExceeded`.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let transport = self.transport.as_deref().ok_or(LlmError::NotConfigured)?;

        let mut last_error: Option<LlmError> = None;
        let mut quota_status: Option<u16> = None;

        for attempt in 0..MAX_ATTEMPTS {
            let model = if attempt == 0 { MODEL } else { FALLBACK_MODEL };
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "LLM call attempt {} failed, retrying with {} after {}ms...",
                    attempt,
                    model,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let request = MessagesRequest {
                model,
                max_tokens: MAX_TOKENS,
                system,
                messages: vec![Message {
                    role: "user",
                    content: prompt,
                }],
            };

            let reply = match transport.send(&request).await {
                Ok(reply) => reply,
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            };
            let status = reply.status;

            if is_quota_status(status) {
                warn!("LLM API returned {}: {}", status, reply.body);
                quota_status = Some(status);
                continue;
            }

            if (500..600).contains(&status) {
                warn!("LLM API returned {}: {}", status, reply.body);
                last_error = Some(LlmError::Api {
                    status,
                    message: reply.body,
                });
                continue;
            }

            if !(200..300).contains(&status) {
                let message = serde_json::from_str::<AnthropicError>(&reply.body)
                    .map(|e| e.error.message)
                    .unwrap_or(reply.body);
                return Err(LlmError::Api { status, message });
            }

            let llm_response: LlmResponse = serde_json::from_str(&reply.body)?;

            debug!(
                "LLM call succeeded ({}): input_tokens={}, output_tokens={}",
                model, llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(match (quota_status, last_error) {
            (Some(status), _) => LlmError::QuotaExceeded {
                status,
                retries: MAX_ATTEMPTS,
            },
            (None, Some(e)) => e,
            (None, None) => LlmError::QuotaExceeded {
                status: 429,
                retries: MAX_ATTEMPTS,
            },
        })
    }
}

#[async_trait]
impl ReasoningService for LlmClient {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = tokio::time::timeout(self.call_timeout, self.call(prompt, system))
            .await
            .map_err(|_| LlmError::Timeout(self.call_timeout.as_secs()))??;

        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }

    fn is_available(&self) -> bool {
        self.is_configured()
    }
}

/// Calls the service and deserializes its reply as JSON.
///
/// A reply that is not strict JSON gets exactly one recovery attempt: the first
/// embedded `{...}` object is cut out of the surrounding prose and parsed.
pub async fn call_json<T: DeserializeOwned>(
    service: &dyn ReasoningService,
    prompt: &str,
    system: &str,
) -> Result<T, LlmError> {
    let raw = service.complete(prompt, system).await?;
    parse_json_reply(&raw)
}

/// Strict parse of a reply, then one best-effort recovery parse.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    let text = strip_json_fences(raw);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }

    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(strict_err) => match EMBEDDED_OBJECT.find(text) {
            Some(embedded) => {
                debug!("Strict JSON parse failed ({strict_err}); retrying on embedded object");
                serde_json::from_str(embedded.as_str()).map_err(LlmError::Parse)
            }
            None => Err(LlmError::Parse(strict_err)),
        },
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let stripped = stripped.trim_start();
    stripped
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or(stripped)
}

/// 429 is a rate limit, 529 is the API's "overloaded" capacity signal.
fn is_quota_status(status: u16) -> bool {
    status == 429 || status == 529
}

/// 500ms, 1.5s, 4.5s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS * BACKOFF_MULTIPLIER.pow(attempt.saturating_sub(1)))
}

#[cfg(test)]
pub mod testing {
    //! Stub reasoning services shared by tests across modules.

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Replies with the same canned text or error on every call.
    pub struct StubService {
        reply: Result<String, fn() -> LlmError>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl StubService {
        pub fn replying(text: impl Into<String>) -> Self {
            Self {
                reply: Ok(text.into()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(make_error: fn() -> LlmError) -> Self {
            Self {
                reply: Err(make_error),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReasoningService for StubService {
        async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make_error) => Err(make_error()),
            }
        }
    }

    /// Picks a reply by the first registered needle found in the prompt.
    pub struct RoutedService {
        routes: Vec<(String, Result<String, fn() -> LlmError>)>,
    }

    impl RoutedService {
        pub fn new() -> Self {
            Self { routes: Vec::new() }
        }

        pub fn on(mut self, needle: &str, reply: &str) -> Self {
            self.routes.push((needle.to_string(), Ok(reply.to_string())));
            self
        }

        pub fn fail_on(mut self, needle: &str, make_error: fn() -> LlmError) -> Self {
            self.routes.push((needle.to_string(), Err(make_error)));
            self
        }
    }

    #[async_trait]
    impl ReasoningService for RoutedService {
        async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            for (needle, reply) in &self.routes {
                if prompt.contains(needle.as_str()) {
                    return match reply {
                        Ok(text) => Ok(text.clone()),
                        Err(make_error) => Err(make_error()),
                    };
                }
            }
            Err(LlmError::NotConfigured)
        }
    }

    /// Plays back canned HTTP replies in order and records the model of every
    /// request. Once the script runs out it answers 503.
    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<RawReply>>,
        models: Mutex<Vec<String>>,
        latency: Duration,
    }

    impl ScriptedTransport {
        pub fn new(replies: &[(u16, &str)]) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .iter()
                        .map(|&(status, body)| RawReply {
                            status,
                            body: body.to_string(),
                        })
                        .collect(),
                ),
                models: Mutex::new(Vec::new()),
                latency: Duration::ZERO,
            }
        }

        /// Every reply arrives after `latency`.
        pub fn slow(latency: Duration, replies: &[(u16, &str)]) -> Self {
            Self {
                latency,
                ..Self::new(replies)
            }
        }

        pub fn models(&self) -> Vec<String> {
            self.models.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagesTransport for ScriptedTransport {
        async fn send(&self, request: &MessagesRequest<'_>) -> Result<RawReply, LlmError> {
            self.models.lock().unwrap().push(request.model.to_string());
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            let next = self.replies.lock().unwrap().pop_front();
            Ok(next.unwrap_or(RawReply {
                status: 503,
                body: "script exhausted".to_string(),
            }))
        }
    }

    /// Messages API success body carrying `text`.
    pub fn success_body(text: &str) -> String {
        serde_json::json!({
            "content": [{"type": "text", "text": text}],
            "usage": {"input_tokens": 12, "output_tokens": 3}
        })
        .to_string()
    }

    pub fn quota() -> LlmError {
        LlmError::QuotaExceeded {
            status: 429,
            retries: 3,
        }
    }

    pub fn unavailable() -> LlmError {
        LlmError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        }
    }

    pub fn timeout() -> LlmError {
        LlmError::Timeout(20)
    }
}
