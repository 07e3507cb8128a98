//! Chat proxy: remote chat endpoint with a bounded timeout and one retry, then the local matcher.
//!
//! Callers never see an error. The worst case is a generic sentence from the advisory table,
//! and [`ChatAnswer::source`] tells which path produced the text.

use beeai_core::{ChatAnswer, ChatRequest, CoreConfig, QueryMatcher};
use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// First attempt plus exactly one retry.
pub const MAX_ATTEMPTS: usize = 2;

/// Why a single chat attempt failed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    MalformedBody(String),
    #[error("upstream returned an empty answer")]
    EmptyAnswer,
}

/// One request/response exchange with the chat endpoint.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, question: &str) -> Result<String, UpstreamError>;
}

#[derive(Deserialize)]
struct AnswerBody {
    #[serde(default)]
    answer: Option<String>,
}

/// `POST {base}/api/chat` over reqwest with a per-request timeout.
pub struct HttpChatTransport {
    client: reqwest::Client,
    chat_url: String,
    timeout: Duration,
}

impl HttpChatTransport {
    pub fn new(chat_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            chat_url: chat_url.into(),
            timeout,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.chat_url(), config.request_timeout())
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    fn classify(&self, e: reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else if e.is_decode() {
            UpstreamError::MalformedBody(e.to_string())
        } else {
            UpstreamError::Transport(e.to_string())
        }
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(&self, question: &str) -> Result<String, UpstreamError> {
        let body = ChatRequest {
            question: question.to_string(),
        };
        let response = self
            .client
            .post(&self.chat_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let parsed: AnswerBody = response.json().await.map_err(|e| self.classify(e))?;
        match parsed.answer {
            Some(answer) if !answer.trim().is_empty() => Ok(answer),
            Some(_) => Err(UpstreamError::EmptyAnswer),
            None => Err(UpstreamError::MalformedBody("missing 'answer' field".to_string())),
        }
    }
}

/// Remote-first responder with graceful degradation to the [`QueryMatcher`].
pub struct ChatProxy {
    transport: Arc<dyn ChatTransport>,
    matcher: Arc<QueryMatcher>,
}

impl ChatProxy {
    pub fn new(transport: Arc<dyn ChatTransport>, matcher: Arc<QueryMatcher>) -> Self {
        Self { transport, matcher }
    }

    pub fn from_config(config: &CoreConfig, matcher: Arc<QueryMatcher>) -> Self {
        Self::new(Arc::new(HttpChatTransport::from_config(config)), matcher)
    }

    pub fn matcher(&self) -> &QueryMatcher {
        &self.matcher
    }

    /// Answers `question`; never fails.
    pub async fn respond(&self, question: &str) -> ChatAnswer {
        if let Some(answer) = self.try_remote(question).await {
            return ChatAnswer::remote(answer);
        }
        let answer = self.matcher.answer(question);
        log_fallback(question);
        ChatAnswer::fallback(answer)
    }

    /// Like [`ChatProxy::respond`] with a caller-supplied random source for the generic fallback.
    pub async fn respond_with_rng<R: Rng + Send + ?Sized>(&self, question: &str, rng: &mut R) -> ChatAnswer {
        if let Some(answer) = self.try_remote(question).await {
            return ChatAnswer::remote(answer);
        }
        let answer = self.matcher.answer_with(question, rng);
        log_fallback(question);
        ChatAnswer::fallback(answer)
    }

    async fn try_remote(&self, question: &str) -> Option<String> {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.transport.send(question).await {
                Ok(answer) => {
                    tracing::debug!(target: "beeai::proxy", attempt, "Remote answer received");
                    return Some(answer);
                }
                Err(e) => {
                    tracing::warn!(target: "beeai::proxy", attempt, error = %e, "Chat attempt failed");
                }
            }
        }
        None
    }
}

fn log_fallback(question: &str) {
    tracing::info!(
        target: "beeai::proxy",
        question_len = question.len(),
        "Remote chat unavailable, answering from advisory table"
    );
}
