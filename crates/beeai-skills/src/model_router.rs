//! Model Router: sends a contextual prompt to the upstream generative model (mock or live Gemini API).

use beeai_core::CoreConfig;
use std::time::Duration;
use thiserror::Error;

const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Mode for LLM invocation: mock (deterministic local text) or live (calls the Gemini API).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LlmMode {
    #[default]
    Mock,
    Live,
}

impl LlmMode {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" | "gemini" => LlmMode::Live,
            _ => LlmMode::Mock,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmMode::Mock => "mock",
            LlmMode::Live => "live",
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no API key set ({} or {})", ENV_GEMINI_API_KEY, ENV_GOOGLE_API_KEY)]
    MissingApiKey,
    #[error("request to model failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected model response: {0}")]
    MalformedBody(String),
    #[error("model returned empty text")]
    EmptyText,
}

/// Routes a prompt string to a mock generator or the live Gemini `generateContent` API.
pub struct ModelRouter {
    mode: LlmMode,
    client: reqwest::Client,
    model: String,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl ModelRouter {
    pub fn with_mode(mode: LlmMode) -> Self {
        Self {
            mode,
            client: reqwest::Client::new(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key_from_env(),
            endpoint: GEMINI_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        let mut router = Self::with_mode(LlmMode::parse(&config.llm_mode));
        if !config.model_name.trim().is_empty() {
            router.model = config.model_name.trim().to_string();
        }
        router.timeout = config.request_timeout();
        router
    }

    /// Overrides the key read from the environment (`None` clears it).
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn mode(&self) -> LlmMode {
        self.mode
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether an API key was found, whatever the mode.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Mock mode is always available; live mode needs an API key.
    pub fn is_available(&self) -> bool {
        match self.mode {
            LlmMode::Mock => true,
            LlmMode::Live => self.api_key.is_some(),
        }
    }

    /// Generates answer text for `prompt`. Never returns blank text on `Ok`.
    pub async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        match self.mode {
            LlmMode::Mock => Ok(self.mock_generate(prompt)),
            LlmMode::Live => self.live_generate(prompt).await,
        }
    }

    /// Mock LLM: a deterministic "generated" response that echoes the question line of the prompt.
    fn mock_generate(&self, prompt: &str) -> String {
        let question = prompt
            .lines()
            .rev()
            .find_map(|l| l.strip_prefix("Question: "))
            .unwrap_or(prompt);
        let preview: String = question.chars().take(80).collect();
        let ellipsis = if question.chars().count() > 80 { "…" } else { "" };
        format!(
            "[Generated – Mock LLM] You asked about \"{}{}\". Bloom times vary by region; check local forecasts before moving hives.",
            preview, ellipsis
        )
    }

    async fn live_generate(&self, prompt: &str) -> Result<String, ModelError> {
        let key = self.api_key.as_deref().ok_or(ModelError::MissingApiKey)?;
        let url = format!("{}/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let json: serde_json::Value = res.json().await?;
        let text = extract_candidate_text(&json)
            .ok_or_else(|| ModelError::MalformedBody("missing candidates[0].content.parts".to_string()))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ModelError::EmptyText);
        }
        tracing::debug!(target: "beeai::model", model = %self.model, chars = text.len(), "Model response received");
        Ok(text.to_string())
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::with_mode(LlmMode::default())
    }
}

fn api_key_from_env() -> Option<String> {
    std::env::var(ENV_GEMINI_API_KEY)
        .or_else(|_| std::env::var(ENV_GOOGLE_API_KEY))
        .ok()
        .filter(|k| !k.trim().is_empty())
}

/// Joins the text parts of the first candidate.
fn extract_candidate_text(json: &serde_json::Value) -> Option<String> {
    let parts = json
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;
    Some(
        parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""),
    )
}
