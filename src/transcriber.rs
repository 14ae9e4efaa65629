// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Client for an OpenAI-compatible speech-to-text endpoint

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::analyzers::Transcriber;
use crate::config::TranscriptionConfig;
use crate::{ArgusError, Result};

/// Whisper-style transcription client (`POST {url}/audio/transcriptions`)
pub struct WhisperClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    language: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl WhisperClient {
    /// Build a client, reading the API key from the configured environment variable
    pub fn from_config(config: &TranscriptionConfig, timeout: Duration) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            ArgusError::Config(format!(
                "Transcription API key not set (expected in ${})",
                config.api_key_env
            ))
        })?;
        Self::new(config, api_key, timeout)
    }

    pub fn new(config: &TranscriptionConfig, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ArgusError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            language: config.language.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url)
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String> {
        debug!("Transcribing {} ({} bytes) with {}", file_name, audio.len(), self.model);

        let part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str("audio/mpeg")?;
        let mut form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "json");
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        let response = self.client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArgusError::Transcription(format!(
                "{} returned status {}: {}",
                self.endpoint(),
                status,
                body.trim()
            )));
        }

        let result: TranscriptionResponse = response.json().await?;
        Ok(result.text)
    }
}

/// Transcriber used when no service is configured: every audio file fails.
pub struct DisabledTranscriber {
    reason: String,
}

impl DisabledTranscriber {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl Transcriber for DisabledTranscriber {
    async fn transcribe(&self, _audio: Vec<u8>, file_name: &str) -> Result<String> {
        Err(ArgusError::Transcription(format!(
            "cannot transcribe {}: {}",
            file_name, self.reason
        )))
    }
}
