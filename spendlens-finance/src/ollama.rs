//! HTTP backend for a local Ollama-compatible `/api/generate` endpoint.

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;

use crate::error::ModelError;
use crate::model_client::ModelBackend;

pub const DEFAULT_MODEL: &str = "llama3:8b";
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Near-deterministic sampling for labeling work
pub const TEMPERATURE: f64 = 0.1;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Clone)]
pub struct OllamaBackend {
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OllamaBackend {
    pub fn new(model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    pub fn request_body(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            temperature: TEMPERATURE,
        }
    }

    async fn generate_async(&self, prompt: &str) -> Result<String, ModelError> {
        // One client per request; no pooling across calls.
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        debug!(model = %self.model, prompt_len = prompt.len(), "posting to model endpoint");
        let resp = client
            .post(self.endpoint())
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let out: GenerateResponse = serde_json::from_str(&text)?;
        Ok(out.response)
    }
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL, DEFAULT_BASE_URL)
    }
}

impl OllamaBackend {
    fn generate_on_fresh_runtime(&self, prompt: &str) -> Result<String, ModelError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(self.generate_async(prompt))
    }
}

impl ModelBackend for OllamaBackend {
    fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        // block_on from inside a runtime panics. A multi-thread runtime can
        // hand us a blocking slot; a current-thread one cannot, so the
        // request moves to its own thread and runtime.
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.generate_async(prompt)))
            }
            Ok(_) => thread::scope(|s| {
                s.spawn(|| self.generate_on_fresh_runtime(prompt))
                    .join()
                    .unwrap_or_else(|_| {
                        Err(ModelError::Unavailable("model request thread panicked".to_string()))
                    })
            }),
            Err(_) => self.generate_on_fresh_runtime(prompt),
        }
    }
}
