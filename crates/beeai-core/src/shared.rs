//! Shared types used across all Bee AI crates.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Where an answer came from: the remote model or the local advisory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Remote,
    Fallback,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Remote => "remote",
            AnswerSource::Fallback => "fallback",
        }
    }
}

/// An answer together with its origin. Replaces a process-wide online/offline flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub source: AnswerSource,
}

impl ChatAnswer {
    pub fn remote(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            source: AnswerSource::Remote,
        }
    }

    pub fn fallback(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            source: AnswerSource::Fallback,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.source == AnswerSource::Remote
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
}

/// Success body of `POST /api/chat`. Clients only rely on `answer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub question: String,
    pub answer: String,
    pub status: String,
    pub source: AnswerSource,
}

impl ChatReply {
    pub fn success(question: impl Into<String>, answer: ChatAnswer) -> Self {
        Self {
            question: question.into(),
            answer: answer.answer,
            status: "success".to_string(),
            source: answer.source,
        }
    }
}

/// Global application configuration (gateway + client). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Application identity shown in logs and the health payload.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// LLM mode ("mock" or "live").
    pub llm_mode: String,
    /// Upstream generative model name.
    pub model_name: String,
    /// Base URL the client sends chat and health requests to.
    pub api_base_url: String,
    /// Per-attempt timeout for chat requests.
    pub request_timeout_secs: u64,
    /// Health ping period while an interactive client session is open.
    pub health_interval_secs: u64,
    /// Optional JSON file replacing the built-in advisory table.
    #[serde(default)]
    pub knowledge_path: Option<String>,
    /// JSONL files tried in order for training examples; first one that loads wins.
    #[serde(default)]
    pub training_data_paths: Vec<String>,
}

impl CoreConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs.max(1))
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.api_base_url.trim_end_matches('/'))
    }

    pub fn health_url(&self) -> String {
        format!("{}/api/health", self.api_base_url.trim_end_matches('/'))
    }

    /// Load config from file and environment. Precedence: env > `BEEAI_CONFIG` path (default `config/gateway`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("BEEAI_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`CoreConfig::load`] with an explicit file. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let name = path.to_string_lossy();
        config::Config::builder()
            .set_default("app_name", "Bee AI")?
            .set_default("port", 8001_i64)?
            .set_default("llm_mode", "mock")?
            .set_default("model_name", "gemini-1.5-flash")?
            .set_default("api_base_url", "http://127.0.0.1:8001")?
            .set_default("request_timeout_secs", 12_i64)?
            .set_default("health_interval_secs", 300_i64)?
            .add_source(config::File::with_name(&name).required(false))
            .add_source(config::Environment::with_prefix("BEEAI").separator("__"))
            .build()?
            .try_deserialize()
    }
}
