// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ollama API client for local description and classification

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::analyzers::{Classifier, Describer, PreparedContent};
use crate::config::{EngineConfig, ModelConfig};
use crate::{ArgusError, Result};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ArgusError::Config(format!("Failed to create HTTP client: {}", e)))?;

        // Accept URLs copied from endpoint docs
        let base_url = base_url
            .trim_end_matches('/')
            .replace("/api/generate", "")
            .replace("/api/chat", "");

        Ok(Self { client, base_url })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                ArgusError::ServiceUnavailable(format!(
                    "Cannot connect to Ollama at {}: {}",
                    self.base_url, e
                ))
            })?;

        Ok(())
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client
            .get(&url)
            .send()
            .await?;

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Check if a specific model is available
    pub async fn model_available(&self, model: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| {
            m.starts_with(model) || m == &format!("{}:latest", model)
        }))
    }

    /// Generate text completion
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        debug!("Sending request to Ollama: model={}", model);
        self.send(GenerateRequest {
            model,
            prompt,
            stream: false,
            images: None,
            format: None,
        })
        .await
    }

    /// Generate with image (for vision models)
    pub async fn generate_with_image(
        &self,
        model: &str,
        prompt: &str,
        image_base64: &str,
    ) -> Result<String> {
        debug!("Sending vision request to Ollama: model={}", model);
        self.send(GenerateRequest {
            model,
            prompt,
            stream: false,
            images: Some(vec![image_base64]),
            format: None,
        })
        .await
    }

    /// Generate in JSON mode; the model is constrained to emit a JSON value
    pub async fn generate_json(&self, model: &str, prompt: &str) -> Result<String> {
        debug!("Sending JSON request to Ollama: model={}", model);
        self.send(GenerateRequest {
            model,
            prompt,
            stream: false,
            images: None,
            format: Some("json"),
        })
        .await
    }

    /// Generate with retry logic
    pub async fn generate_with_retry(
        &self,
        model: &str,
        prompt: &str,
        retries: u32,
    ) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=retries {
            if attempt > 0 {
                let delay = Duration::from_secs(2u64.pow(attempt - 1));
                warn!("Retrying Ollama request in {:?} (attempt {})", delay, attempt + 1);
                tokio::time::sleep(delay).await;
            }

            match self.generate(model, prompt).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ArgusError::ServiceUnavailable("Unknown error".to_string())
        }))
    }

    async fn send(&self, request: GenerateRequest<'_>) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ArgusError::ServiceUnavailable(format!(
                "Ollama returned status {}",
                response.status()
            )));
        }

        let result: GenerateResponse = response.json().await?;
        Ok(result.response)
    }
}

/// Ollama client bound to the configured models; the production describer and classifier
#[derive(Clone)]
pub struct OllamaEngine {
    client: OllamaClient,
    models: ModelConfig,
    retries: u32,
}

impl OllamaEngine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            client: OllamaClient::new(&config.url, Duration::from_secs(config.timeout_secs))?,
            models: config.models.clone(),
            retries: config.retries,
        })
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    pub fn models(&self) -> &ModelConfig {
        &self.models
    }
}

#[async_trait]
impl Describer for OllamaEngine {
    async fn describe(&self, content: &PreparedContent, prompt: &str) -> Result<String> {
        let response = match content {
            PreparedContent::Image { jpeg_base64 } => {
                self.client
                    .generate_with_image(&self.models.vision, prompt, jpeg_base64)
                    .await?
            }
            PreparedContent::Text(text) | PreparedContent::Transcript(text) => {
                let full_prompt = format!("{}\n\n{}", prompt, text);
                if self.retries > 0 {
                    self.client
                        .generate_with_retry(&self.models.text, &full_prompt, self.retries)
                        .await?
                } else {
                    self.client.generate(&self.models.text, &full_prompt).await?
                }
            }
        };

        let description = response.trim().to_string();
        if description.is_empty() {
            return Err(ArgusError::ServiceUnavailable(
                "Ollama returned an empty description".to_string(),
            ));
        }
        Ok(description)
    }
}

#[async_trait]
impl Classifier for OllamaEngine {
    async fn classify(&self, description: &str, prompt: &str) -> Result<String> {
        let full_prompt = format!("{}\n\nDescription:\n{}", prompt, description);
        self.client
            .generate_json(&self.models.classifier, &full_prompt)
            .await
    }
}
