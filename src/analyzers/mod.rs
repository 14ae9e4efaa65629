// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Per-file analysis: description resolution and classification

pub mod audio;
pub mod classify;
pub mod image;
pub mod text;

#[cfg(test)]
pub(crate) mod fakes;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::PromptConfig;
use crate::content::{CategorizationResult, ContentDescription, ContentType};
use crate::dispatcher::DispatchItem;
use crate::{ArgusError, Result};

/// File content after type-specific pre-processing, ready for the describer
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedContent {
    /// Downscaled JPEG, base64 encoded
    Image { jpeg_base64: String },
    /// Transcript of an audio file
    Transcript(String),
    /// Decoded text file
    Text(String),
}

impl PreparedContent {
    pub fn content_type(&self) -> ContentType {
        match self {
            PreparedContent::Image { .. } => ContentType::Image,
            PreparedContent::Transcript(_) => ContentType::Audio,
            PreparedContent::Text(_) => ContentType::Text,
        }
    }
}

/// Produces a free-text description of prepared content
#[async_trait]
pub trait Describer: Send + Sync {
    async fn describe(&self, content: &PreparedContent, prompt: &str) -> Result<String>;
}

/// Turns audio bytes into a transcript
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String>;
}

/// Classifies a description; returns the raw model reply
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, description: &str, prompt: &str) -> Result<String>;
}

/// Two-phase analyzer: cached description, then classification
pub struct ContentAnalyzer {
    cache: CacheStore,
    describer: Arc<dyn Describer>,
    transcriber: Arc<dyn Transcriber>,
    classifier: Arc<dyn Classifier>,
    prompts: PromptConfig,
    max_image_dimension: u32,
}

impl ContentAnalyzer {
    pub fn new(
        cache: CacheStore,
        describer: Arc<dyn Describer>,
        transcriber: Arc<dyn Transcriber>,
        classifier: Arc<dyn Classifier>,
        prompts: PromptConfig,
        max_image_dimension: u32,
    ) -> Self {
        Self {
            cache,
            describer,
            transcriber,
            classifier,
            prompts,
            max_image_dimension,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Analyze one dispatched file.
    ///
    /// Errors only when the description cannot be resolved; classification
    /// problems are absorbed into an all-false result.
    pub async fn analyze(&self, item: &DispatchItem) -> Result<CategorizationResult> {
        let description = self.resolve_description(item).await?;
        Ok(self.categorize(&item.file_name, &description).await)
    }

    /// Analyze an arbitrary path, rejecting extensions outside the content table
    pub async fn analyze_path(&self, path: &Path) -> Result<CategorizationResult> {
        let item = DispatchItem::from_path(path)
            .ok_or_else(|| ArgusError::UnsupportedFileType(path.display().to_string()))?;
        self.analyze(&item).await
    }

    /// Cached description for the file, generating and caching one on a miss
    pub async fn resolve_description(&self, item: &DispatchItem) -> Result<String> {
        let key = item.cache_key();

        let cache = self.cache.clone();
        let lookup = key.clone();
        if let Some(record) = run_blocking(move || cache.get(&lookup)).await? {
            return Ok(record.description);
        }
        debug!("Cache miss: {}", key);

        let content = self.prepare(item).await?;
        let description = self
            .describer
            .describe(&content, self.prompt_for(item.content_type))
            .await?;

        let record = ContentDescription::new(key, item.content_type, description.clone());
        let cache = self.cache.clone();
        run_blocking(move || cache.put(record)).await?;

        info!("Described {} ({})", item.file_name, item.content_type);
        Ok(description)
    }

    /// Classify a description. Never fails: any error yields `{false, false}`.
    pub async fn categorize(&self, file_name: &str, description: &str) -> CategorizationResult {
        let raw = match self.classifier.classify(description, &self.prompts.categorize).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Classification request failed for {}: {}", file_name, e);
                return CategorizationResult::default();
            }
        };

        match classify::parse_classification(&raw) {
            Ok(result) => {
                debug!(
                    "{}: has_people={} has_hardware={}",
                    file_name, result.has_people, result.has_hardware
                );
                result
            }
            Err(e) => {
                warn!("Malformed classification for {}: {}", file_name, e);
                CategorizationResult::default()
            }
        }
    }

    fn prompt_for(&self, content_type: ContentType) -> &str {
        match content_type {
            ContentType::Image => &self.prompts.image,
            ContentType::Audio => &self.prompts.audio,
            ContentType::Text => &self.prompts.text,
        }
    }

    async fn prepare(&self, item: &DispatchItem) -> Result<PreparedContent> {
        let data = tokio::fs::read(&item.path).await?;

        match item.content_type {
            ContentType::Image => {
                let max_dimension = self.max_image_dimension;
                let jpeg_base64 = run_blocking(move || {
                    crate::analyzers::image::prepare_image(&data, max_dimension)
                })
                .await?;
                Ok(PreparedContent::Image { jpeg_base64 })
            }
            ContentType::Audio => {
                let head = data[..data.len().min(audio::PROBE_BYTES)].to_vec();
                match run_blocking(move || Ok(audio::probe_audio(head))).await? {
                    Some(probe) => debug!(
                        "{}: codec={:?} duration={:?}s",
                        item.file_name, probe.codec, probe.duration_secs
                    ),
                    None => warn!("{}: audio stream not recognized, sending as-is", item.file_name),
                }
                let transcript = self.transcriber.transcribe(data, &item.file_name).await?;
                Ok(PreparedContent::Transcript(transcript))
            }
            ContentType::Text => Ok(PreparedContent::Text(text::decode_text(&data))),
        }
    }
}

/// Run blocking work (cache persistence, codecs) off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ArgusError::Analysis(format!("Blocking task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, data: &[u8]) -> DispatchItem {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        DispatchItem::from_path(&path).unwrap()
    }

    #[tokio::test]
    async fn test_miss_generates_and_caches() {
        let dir = TempDir::new().unwrap();
        let fx = Fixture::new(&dir);
        let item = write(&dir, "note.txt", b"spare hardware parts");

        let result = fx.analyzer.analyze(&item).await.unwrap();
        assert_eq!(result, CategorizationResult { has_people: false, has_hardware: true });
        assert_eq!(fx.describer.calls.load(Ordering::SeqCst), 1);

        let record = fx.cache.peek(&item.cache_key()).unwrap().unwrap();
        assert_eq!(record.use_count, 0);
        assert_eq!(record.content_type, ContentType::Text);
        assert_eq!(record.description, "described: spare hardware parts");
    }

    #[tokio::test]
    async fn test_hit_skips_describer() {
        let dir = TempDir::new().unwrap();
        let fx = Fixture::new(&dir);
        let item = write(&dir, "note.txt", b"ignored content");
        fx.cache
            .put(ContentDescription::new(item.cache_key(), ContentType::Text, "people at the gate"))
            .unwrap();

        let result = fx.analyzer.analyze(&item).await.unwrap();
        assert!(result.has_people);
        assert_eq!(fx.describer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.cache.peek(&item.cache_key()).unwrap().unwrap().use_count, 1);
    }

    #[tokio::test]
    async fn test_prompt_keyed_by_content_type() {
        let dir = TempDir::new().unwrap();
        let fx = Fixture::new(&dir);
        let item = write(&dir, "a.txt", b"x");

        fx.analyzer.resolve_description(&item).await.unwrap();
        assert_eq!(fx.describer.prompts(), vec![PromptConfig::default().text]);
    }

    #[tokio::test]
    async fn test_image_is_prepared() {
        let dir = TempDir::new().unwrap();
        let fx = Fixture::new(&dir);
        let path = dir.path().join("photo.png");
        write_png(&path, 64, 32);
        let item = DispatchItem::from_path(&path).unwrap();

        let description = fx.analyzer.resolve_description(&item).await.unwrap();
        assert_eq!(description, IMAGE_DESCRIPTION);
        assert_eq!(fx.describer.content_types(), vec![ContentType::Image]);
    }

    #[tokio::test]
    async fn test_audio_goes_through_transcriber() {
        let dir = TempDir::new().unwrap();
        let fx = Fixture::new(&dir);
        let item = write(&dir, "clip.mp3", b"not really mp3");

        let description = fx.analyzer.resolve_description(&item).await.unwrap();
        assert_eq!(description, format!("described: {}", TRANSCRIPT));
        assert_eq!(fx.transcriber.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_describer_failure_propagates_without_caching() {
        let dir = TempDir::new().unwrap();
        let fx = Fixture::new(&dir);
        let item = write(&dir, "bad.txt", FAIL_MARKER.as_bytes());

        assert!(fx.analyzer.analyze(&item).await.is_err());
        assert!(fx.cache.peek(&item.cache_key()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_long_audio_sent_whole_to_transcriber() {
        let dir = TempDir::new().unwrap();
        let fx = Fixture::new(&dir);
        let len = audio::PROBE_BYTES * 3 + 17;
        let item = write(&dir, "shift_log.mp3", &vec![0u8; len]);

        fx.analyzer.resolve_description(&item).await.unwrap();
        assert_eq!(fx.transcriber.last_len.load(Ordering::SeqCst), len);
    }

    #[tokio::test]
    async fn test_transcriber_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let fx = Fixture::new(&dir);
        let item = write(&dir, "broken.mp3", b"x");

        let err = fx.analyzer.analyze(&item).await.unwrap_err();
        assert!(matches!(err, ArgusError::Transcription(_)));
        assert_eq!(fx.describer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_classification_fails_closed() {
        let dir = TempDir::new().unwrap();
        let fx = Fixture::new(&dir);

        let garbled = fx.analyzer.categorize("a.txt", "people hardware GARBLED").await;
        assert_eq!(garbled, CategorizationResult::default());

        let offline = fx.analyzer.categorize("a.txt", "people hardware OFFLINE").await;
        assert_eq!(offline, CategorizationResult::default());

        let ok = fx.analyzer.categorize("a.txt", "people hardware").await;
        assert_eq!(ok, CategorizationResult { has_people: true, has_hardware: true });
    }

    #[tokio::test]
    async fn test_unsupported_path_rejected() {
        let dir = TempDir::new().unwrap();
        let fx = Fixture::new(&dir);
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let err = fx.analyzer.analyze_path(&path).await.unwrap_err();
        assert!(matches!(err, ArgusError::UnsupportedFileType(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let fx = Fixture::new(&dir);
        let item = DispatchItem::from_path(&dir.path().join("gone.txt")).unwrap();

        let err = fx.analyzer.analyze(&item).await.unwrap_err();
        assert!(matches!(err, ArgusError::FileSystem(_)));
    }
}
