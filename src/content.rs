// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Shared data model: content types, cached descriptions and categorization output

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{ArgusError, Result};

/// Closed set of content kinds the pipeline understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Image,
    Audio,
    Text,
}

/// Extension to content type table. Extensions are matched case-insensitively.
pub const EXTENSION_TABLE: &[(&str, ContentType)] = &[
    ("txt", ContentType::Text),
    ("png", ContentType::Image),
    ("mp3", ContentType::Audio),
];

impl ContentType {
    /// Look up a bare extension (no leading dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSION_TABLE
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map(|(_, content_type)| *content_type)
    }

    /// Content type for a path, based on its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Audio => "audio",
            ContentType::Text => "text",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached description of one file, keyed by its path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDescription {
    pub file_path: String,
    pub content_type: ContentType,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub use_count: u64,
}

impl ContentDescription {
    /// Fresh record for a description that was just generated
    pub fn new(file_path: impl Into<String>, content_type: ContentType, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            file_path: file_path.into(),
            content_type,
            description: description.into(),
            created_at: now,
            last_used: now,
            use_count: 0,
        }
    }
}

/// Boolean facets derived from a description
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizationResult {
    pub has_people: bool,
    pub has_hardware: bool,
}

/// Final per-run output: file names bucketed by facet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categorization {
    pub people: Vec<String>,
    pub hardware: Vec<String>,
}

impl Categorization {
    /// Add a file name to every bucket its facets select
    pub fn record(&mut self, file_name: &str, result: CategorizationResult) {
        if result.has_people {
            self.people.push(file_name.to_string());
        }
        if result.has_hardware {
            self.hardware.push(file_name.to_string());
        }
    }

    /// Sort both buckets ascending and drop repeated names
    pub fn finalize(&mut self) {
        for bucket in [&mut self.people, &mut self.hardware] {
            bucket.sort();
            bucket.dedup();
        }
    }

    /// Write the categorization, replacing any previous output
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &content)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read(path)?;
        Ok(serde_json::from_slice(&content)?)
    }
}

/// Write `data` to a sibling temp file and rename it over `path`.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path)?;
    let mut file = fs::File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ArgusError::Config(format!("Invalid output path: {:?}", path)))?;
    Ok(path.with_file_name(format!(".{}.tmp", name)))
}
