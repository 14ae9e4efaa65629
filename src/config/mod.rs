// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Argus

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// AI engine (description and classification) configuration
    #[serde(default)]
    pub ai_engine: EngineConfig,

    /// Audio transcription service
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Prompt templates
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Description cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Dispatch and worker pool settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_engine_url")]
    pub url: String,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retries: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_vision_model")]
    pub vision: String,
    #[serde(default = "default_text_model")]
    pub text: String,
    #[serde(default = "default_text_model")]
    pub classifier: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TranscriptionConfig {
    #[serde(default = "default_transcription_url")]
    pub url: String,
    #[serde(default = "default_transcription_model")]
    pub model: String,
    /// ISO-639-1 hint passed to the service; auto-detect when absent
    #[serde(default)]
    pub language: Option<String>,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_image_prompt")]
    pub image: String,
    #[serde(default = "default_audio_prompt")]
    pub audio: String,
    #[serde(default = "default_text_prompt")]
    pub text: String,
    #[serde(default = "default_categorize_prompt")]
    pub categorize: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PipelineConfig {
    /// Directory name whose whole subtree is never dispatched
    #[serde(default = "default_reserved_dir")]
    pub reserved_dir: String,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_task_timeout")]
    pub task_timeout_secs: u64,
    /// Longest side, in pixels, of an image sent to the vision model
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

// Default value functions
fn default_engine_url() -> String { "http://localhost:11434".to_string() }
fn default_timeout() -> u64 { 120 }
fn default_vision_model() -> String { "llava".to_string() }
fn default_text_model() -> String { "llama3.2:3b".to_string() }
fn default_transcription_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_transcription_model() -> String { "whisper-1".to_string() }
fn default_api_key_env() -> String { "OPENAI_API_KEY".to_string() }
fn default_cache_path() -> String { "cache/descriptions.json".to_string() }
fn default_reserved_dir() -> String { "facts".to_string() }
fn default_max_concurrent() -> usize { 4 }
fn default_task_timeout() -> u64 { 300 }
fn default_max_image_dimension() -> u32 { 1024 }
fn default_output_path() -> String { "categories.json".to_string() }

fn default_image_prompt() -> String {
    "Describe this image in detail. Mention any people, their activities and any \
     machines, devices or hardware that are visible.".to_string()
}

fn default_audio_prompt() -> String {
    "The following is a transcript of an audio recording. Describe what the recording \
     is about, who is speaking and any equipment or hardware that is mentioned.".to_string()
}

fn default_text_prompt() -> String {
    "Describe the following note. Mention any people, their activities and any \
     machines, devices or hardware it refers to.".to_string()
}

fn default_categorize_prompt() -> String {
    "Classify the description below. Answer with a JSON object with exactly two boolean \
     fields: \"has_people\" is true only if it reports captured people or traces of their \
     presence; \"has_hardware\" is true only if it reports a hardware fault or repair \
     (not software). Return ONLY the JSON object.".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_engine_url(),
            models: ModelConfig::default(),
            timeout_secs: default_timeout(),
            retries: 0,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            vision: default_vision_model(),
            text: default_text_model(),
            classifier: default_text_model(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            url: default_transcription_url(),
            model: default_transcription_model(),
            language: None,
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            image: default_image_prompt(),
            audio: default_audio_prompt(),
            text: default_text_prompt(),
            categorize: default_categorize_prompt(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reserved_dir: default_reserved_dir(),
            max_concurrent: default_max_concurrent(),
            task_timeout_secs: default_task_timeout(),
            max_image_dimension: default_max_image_dimension(),
            output_path: default_output_path(),
        }
    }
}

impl PipelineConfig {
    /// Per-task timeout; zero disables it
    pub fn task_timeout(&self) -> Option<Duration> {
        (self.task_timeout_secs > 0).then(|| Duration::from_secs(self.task_timeout_secs))
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::ArgusError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.pipeline.max_concurrent == 0 {
            return Err(crate::ArgusError::Config(
                "pipeline.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.pipeline.max_image_dimension == 0 {
            return Err(crate::ArgusError::Config(
                "pipeline.max_image_dimension must be at least 1".to_string(),
            ));
        }
        if self.pipeline.reserved_dir.trim().is_empty() {
            return Err(crate::ArgusError::Config(
                "pipeline.reserved_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
