// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Deterministic collaborators for tests

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use super::{Classifier, ContentAnalyzer, Describer, PreparedContent, Transcriber};
use crate::cache::CacheStore;
use crate::config::PromptConfig;
use crate::content::ContentType;
use crate::{ArgusError, Result};

pub const IMAGE_DESCRIPTION: &str = "a photo of people on the factory floor";
pub const TRANSCRIPT: &str = "quiet room";
/// Text containing this makes the describer fail
pub const FAIL_MARKER: &str = "FAIL";
/// Text containing this makes the describer hang
pub const SLOW_MARKER: &str = "SLOW";

/// Describer that echoes text and returns a fixed image description
#[derive(Default)]
pub struct FakeDescriber {
    pub calls: AtomicUsize,
    seen: Mutex<Vec<(ContentType, String)>>,
}

impl FakeDescriber {
    pub fn prompts(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn content_types(&self) -> Vec<ContentType> {
        self.seen.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }
}

#[async_trait]
impl Describer for FakeDescriber {
    async fn describe(&self, content: &PreparedContent, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((content.content_type(), prompt.to_string()));

        match content {
            PreparedContent::Image { .. } => Ok(IMAGE_DESCRIPTION.to_string()),
            PreparedContent::Text(text) | PreparedContent::Transcript(text) => {
                if text.contains(FAIL_MARKER) {
                    return Err(ArgusError::ServiceUnavailable("describer down".to_string()));
                }
                if text.contains(SLOW_MARKER) {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
                Ok(format!("described: {}", text))
            }
        }
    }
}

/// Transcriber returning a fixed transcript; fails for files named `broken*`
#[derive(Default)]
pub struct FakeTranscriber {
    pub calls: AtomicUsize,
    /// Size of the last audio payload received
    pub last_len: AtomicUsize,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_len.store(audio.len(), Ordering::SeqCst);
        if file_name.starts_with("broken") {
            return Err(ArgusError::Transcription("unreadable audio".to_string()));
        }
        Ok(TRANSCRIPT.to_string())
    }
}

/// Keyword classifier: "people" / "hardware" in the description set the facets.
/// "GARBLED" yields a malformed reply and "OFFLINE" a transport error.
pub struct FakeClassifier;

#[async_trait]
impl Classifier for FakeClassifier {
    async fn classify(&self, description: &str, _prompt: &str) -> Result<String> {
        if description.contains("OFFLINE") {
            return Err(ArgusError::ServiceUnavailable("classifier down".to_string()));
        }
        if description.contains("GARBLED") {
            return Ok("{\"has_people\": maybe".to_string());
        }
        Ok(serde_json::json!({
            "has_people": description.contains("people"),
            "has_hardware": description.contains("hardware"),
        })
        .to_string())
    }
}

pub struct Fixture {
    pub cache: CacheStore,
    pub describer: Arc<FakeDescriber>,
    pub transcriber: Arc<FakeTranscriber>,
    pub analyzer: Arc<ContentAnalyzer>,
}

impl Fixture {
    /// Analyzer over fakes with its cache stored under `dir/.argus`
    pub fn new(dir: &TempDir) -> Self {
        Self::with_cache_path(&dir.path().join(".argus").join("descriptions.json"))
    }

    pub fn with_cache_path(cache_path: &Path) -> Self {
        let cache = CacheStore::open(cache_path).unwrap();
        let describer = Arc::new(FakeDescriber::default());
        let transcriber = Arc::new(FakeTranscriber::default());
        let analyzer = Arc::new(ContentAnalyzer::new(
            cache.clone(),
            describer.clone(),
            transcriber.clone(),
            Arc::new(FakeClassifier),
            PromptConfig::default(),
            256,
        ));
        Self {
            cache,
            describer,
            transcriber,
            analyzer,
        }
    }
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::new(width, height).save(path).unwrap();
}
