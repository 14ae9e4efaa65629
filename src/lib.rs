// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Argus: cached multi-modal file categorizer
//!
//! Walks a directory of text, image and audio files, resolves a description for
//! each one (calling local AI models only on a cache miss), classifies the
//! descriptions into people/hardware facets and writes sorted category buckets.

pub mod analyzers;
pub mod cache;
pub mod config;
pub mod content;
pub mod dispatcher;
pub mod error;
pub mod ollama;
pub mod orchestrator;
pub mod transcriber;

pub use config::AppConfig;
pub use error::{ArgusError, Result};
