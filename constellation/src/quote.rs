//! Decorative quote shown on the resolved scene.
//!
//! A provider answers on a `oneshot` channel; [`DecorativeText`] polls it without blocking and
//! shows a local fallback until (and unless) a usable line arrives.

use std::thread;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

pub const MAX_QUOTE_CHARS: usize = 160;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("invalid quote url: {0}")]
    Uri(String),
    #[error("request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),
    #[error("reading body failed: {0}")]
    Body(#[from] hyper::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("timed out")]
    Timeout,
    #[error("response had no usable text")]
    Empty,
    #[error("runtime unavailable: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type QuoteReceiver = oneshot::Receiver<Result<String, QuoteError>>;

/// Asynchronous source of decorative text.
pub trait TextProvider {
    fn request(&self) -> QuoteReceiver;
}

/// Resolves immediately with a fixed line.
#[derive(Debug, Clone)]
pub struct FixedText(pub String);

impl TextProvider for FixedText {
    fn request(&self) -> QuoteReceiver {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Ok(self.0.clone()));
        rx
    }
}

/// Plain-HTTP GET on a background thread with its own current-thread runtime.
#[derive(Debug, Clone)]
pub struct HttpQuoteProvider {
    url: String,
    timeout: Duration,
}

impl HttpQuoteProvider {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TextProvider for HttpQuoteProvider {
    fn request(&self) -> QuoteReceiver {
        let (tx, rx) = oneshot::channel();
        let url = self.url.clone();
        let timeout = self.timeout;

        let spawned = thread::Builder::new()
            .name("quote-fetch".into())
            .spawn(move || {
                let result = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(QuoteError::from)
                    .and_then(|rt| rt.block_on(fetch_quote(&url, timeout)));
                let _ = tx.send(result);
            });
        if let Err(err) = spawned {
            // The sender was dropped with the closure; the receiver reports it as closed.
            tracing::warn!("quote fetch thread failed to start: {err}");
        }
        rx
    }
}

async fn fetch_quote(url: &str, timeout: Duration) -> Result<String, QuoteError> {
    let uri: hyper::Uri = url.parse().map_err(|e| QuoteError::Uri(format!("{e}")))?;
    let client = Client::builder(TokioExecutor::new()).build_http::<Empty<Bytes>>();

    let response = tokio::time::timeout(timeout, client.get(uri))
        .await
        .map_err(|_| QuoteError::Timeout)??;
    if !response.status().is_success() {
        return Err(QuoteError::Status(response.status().as_u16()));
    }

    let body = tokio::time::timeout(timeout, response.into_body().collect())
        .await
        .map_err(|_| QuoteError::Timeout)??
        .to_bytes();
    parse_quote(&body).ok_or(QuoteError::Empty)
}

/// Accepts `{"quote"|"text"|"content": "..."}`, `[{"q": "..."}]`, a bare JSON string, or plain
/// text. Returns the first non-empty line, capped at [`MAX_QUOTE_CHARS`].
pub fn parse_quote(body: &[u8]) -> Option<String> {
    let raw = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => json_text(&value)?,
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    };
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    Some(line.chars().take(MAX_QUOTE_CHARS).collect())
}

fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => items.first().and_then(json_text),
        serde_json::Value::Object(map) => ["quote", "text", "content", "q"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string),
        _ => None,
    }
}

/// Fallback-first decorative line.
#[derive(Debug)]
pub struct DecorativeText {
    fallback: String,
    resolved: Option<String>,
    pending: Option<QuoteReceiver>,
}

impl DecorativeText {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
            resolved: None,
            pending: None,
        }
    }

    pub fn with_provider(fallback: impl Into<String>, provider: &dyn TextProvider) -> Self {
        Self {
            pending: Some(provider.request()),
            ..Self::new(fallback)
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Picks up a delivered result, if any. Failures keep the fallback.
    pub fn poll(&mut self) {
        let Some(rx) = self.pending.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(text)) => {
                tracing::info!(chars = text.chars().count(), "decorative quote loaded");
                self.resolved = Some(text);
                self.pending = None;
            }
            Ok(Err(err)) => {
                tracing::warn!("decorative quote unavailable: {err}");
                self.pending = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Closed) => {
                tracing::warn!("decorative quote provider went away");
                self.pending = None;
            }
        }
    }

    pub fn text(&self) -> &str {
        self.resolved.as_deref().unwrap_or(&self.fallback)
    }

    /// Stops waiting on the provider.
    pub fn abandon(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_quote_shapes() {
        assert_eq!(parse_quote(br#"{"quote":"Stay."}"#).as_deref(), Some("Stay."));
        assert_eq!(
            parse_quote(br#"[{"q":"Two as one.","a":"x"}]"#).as_deref(),
            Some("Two as one.")
        );
        assert_eq!(parse_quote(b"\n  plain line \nsecond").as_deref(), Some("plain line"));
        assert_eq!(parse_quote(br#"{"other":1}"#), None);
        assert_eq!(parse_quote(b"   "), None);
    }

    #[test]
    fn long_quotes_are_capped() {
        let long = "a".repeat(400);
        assert_eq!(parse_quote(long.as_bytes()).map(|s| s.len()), Some(MAX_QUOTE_CHARS));
    }

    #[test]
    fn fallback_until_provider_resolves() {
        let mut text = DecorativeText::with_provider("fallback", &FixedText("fetched".into()));
        assert_eq!(text.text(), "fallback");
        text.poll();
        assert_eq!(text.text(), "fetched");
        assert!(!text.is_pending());
    }

    #[test]
    fn failed_provider_keeps_fallback() {
        struct Failing;
        impl TextProvider for Failing {
            fn request(&self) -> QuoteReceiver {
                let (tx, rx) = oneshot::channel();
                let _ = tx.send(Err(QuoteError::Empty));
                rx
            }
        }
        let mut text = DecorativeText::with_provider("fallback", &Failing);
        text.poll();
        assert_eq!(text.text(), "fallback");
        assert!(!text.is_pending());
    }

    #[test]
    fn unreachable_endpoint_fails_without_blocking_the_caller() {
        let provider = HttpQuoteProvider::new("not a url").with_timeout(Duration::from_millis(50));
        let mut text = DecorativeText::with_provider("fallback", &provider);
        for _ in 0..200 {
            text.poll();
            if !text.is_pending() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!text.is_pending());
        assert_eq!(text.text(), "fallback");
    }
}
