//! Optional motivational text from a text-generation service.
//!
//! Advice is strictly best effort. Providers report failures through
//! `Result`, but `advise` and `PendingAdvice` swallow them and hand back
//! an empty string, so nothing here can affect the schedule. There are no
//! retries.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::{self, json, Value};

use super::config::AdviceConfig;
use super::errors::*;

/// What an advice provider is told about the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceRequest {
    title: String,
    pages_remaining: u32,
    daily_pace: i32,
}

impl AdviceRequest {
    /// Returns a request for the given book title, pages left, and pace.
    pub fn new(title: &str, pages_remaining: u32, daily_pace: i32) -> AdviceRequest {
        AdviceRequest {
            title: title.to_owned(),
            pages_remaining: pages_remaining,
            daily_pace: daily_pace,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pages_remaining(&self) -> u32 {
        self.pages_remaining
    }

    pub fn daily_pace(&self) -> i32 {
        self.daily_pace
    }

    /// Returns the question put to the service.
    pub fn prompt(&self) -> String {
        let title = if self.title.trim().is_empty() {
            "my current book"
        } else {
            self.title.trim()
        };
        format!("I'm reading \"{}\" and have {} pages left. My plan is to read {} pages a day. \
                 Give me one short piece of encouragement or advice.",
                title,
                self.pages_remaining,
                self.daily_pace)
    }
}

/// Something that can produce advice text for a plan.
pub trait AdviceProvider: Send + Sync {
    /// Fetches advice for `request`. An empty string means "nothing to say".
    fn fetch_advice(&self, request: &AdviceRequest) -> Result<String>;
}

/// A provider that never has anything to say. Used when no service is
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdvice;

impl AdviceProvider for NoAdvice {
    fn fetch_advice(&self, _request: &AdviceRequest) -> Result<String> {
        Ok(String::new())
    }
}

const SYSTEM_PROMPT: &str = "You are a friendly reading coach. Answer in one or two short \
                             sentences, without lists or headings.";

/// A provider backed by an OpenAI-compatible chat completions endpoint.
pub struct HttpAdvice {
    url: String,
    model: String,
    api_key: String,
    agent: ureq::Agent,
}

impl HttpAdvice {
    /// Returns a provider for the service described by `config`.
    pub fn new(config: &AdviceConfig) -> HttpAdvice {
        let timeout = Duration::from_secs(config.timeout_secs);
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();

        HttpAdvice {
            url: completions_url(&config.api_url),
            model: config.api_model.clone(),
            api_key: config.api_key.clone(),
            agent: agent,
        }
    }
}

impl AdviceProvider for HttpAdvice {
    fn fetch_advice(&self, request: &AdviceRequest) -> Result<String> {
        let body = request_body(&self.model, request).to_string();

        let mut req = self.agent.post(&self.url).set("Content-Type", "application/json");
        if !self.api_key.is_empty() {
            let auth = format!("Bearer {}", self.api_key);
            req = req.set("Authorization", &auth);
        }

        let response = req.send_string(&body)
            .chain_err(|| ErrorKind::Advice(format!("request to {} failed", self.url)))?;
        let text = response.into_string()
            .chain_err(|| ErrorKind::Advice("could not read response body".into()))?;

        parse_response(&text)
    }
}

/// Returns the chat completions URL for a base URL that may or may not end
/// in `/v1`.
fn completions_url(api_url: &str) -> String {
    let base = api_url.trim().trim_end_matches('/');
    let base = base.strip_suffix("/v1").unwrap_or(base);
    format!("{}/v1/chat/completions", base)
}

/// Returns the JSON request body for `request`.
fn request_body(model: &str, request: &AdviceRequest) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": request.prompt() },
        ],
        "stream": false,
        "max_tokens": 120,
    })
}

/// Extracts the reply text from a chat completions response.
fn parse_response(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body)
        .chain_err(|| ErrorKind::Advice("response is not json".into()))?;

    match value["choices"][0]["message"]["content"].as_str() {
        Some(content) => Ok(content.trim().to_owned()),
        None => Err(ErrorKind::Advice("response has no message content".into()).into()),
    }
}

/// Returns the provider to use for `config`: `HttpAdvice` if it is enabled,
/// and `NoAdvice` otherwise.
pub fn provider_for(config: &AdviceConfig) -> Arc<dyn AdviceProvider> {
    if config.is_enabled() {
        Arc::new(HttpAdvice::new(config))
    } else {
        debug!("advice disabled: no api key configured");
        Arc::new(NoAdvice)
    }
}

/// Asks `provider` for advice, returning an empty string if it fails.
pub fn advise(provider: &dyn AdviceProvider, request: &AdviceRequest) -> String {
    match provider.fetch_advice(request) {
        Ok(text) => text,
        Err(e) => {
            debug!("no advice: {}", e);
            for e in e.iter().skip(1) {
                debug!("caused by: {}", e);
            }
            String::new()
        }
    }
}

/// Advice being fetched on a background thread.
pub struct PendingAdvice {
    rx: Receiver<String>,
}

impl PendingAdvice {
    /// Returns the advice if it has already arrived.
    pub fn try_take(&self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the advice, returning an empty string if
    /// it doesn't arrive in time. The background thread is left to finish
    /// on its own.
    pub fn wait(self, timeout: Duration) -> String {
        self.rx.recv_timeout(timeout).unwrap_or_default()
    }
}

/// Starts fetching advice on a background thread and returns immediately.
pub fn spawn_advice(provider: Arc<dyn AdviceProvider>, request: AdviceRequest) -> PendingAdvice {
    let (tx, rx) = mpsc::channel();

    let spawned = thread::Builder::new()
        .name("advice".into())
        .spawn(move || {
            // The receiver may have given up waiting; that's fine
            let _ = tx.send(advise(&*provider, &request));
        });
    if let Err(e) = spawned {
        // Dropping the sender with the closure makes `wait` return at once
        debug!("could not start advice thread: {}", e);
    }

    PendingAdvice { rx: rx }
}
