// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Batch driver: dispatch a directory, analyze every file, bucket the results

use futures_util::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::analyzers::ContentAnalyzer;
use crate::content::{Categorization, CategorizationResult};
use crate::dispatcher::{DispatchItem, Dispatcher};
use crate::{ArgusError, Result};

/// A file left out of the categorization because its analysis failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub file_name: String,
    pub reason: String,
}

/// Result of one orchestrator run
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub categorization: Categorization,
    pub dispatched: usize,
    pub succeeded: usize,
    pub failures: Vec<FileFailure>,
}

pub struct Orchestrator {
    dispatcher: Dispatcher,
    analyzer: Arc<ContentAnalyzer>,
    max_concurrent: usize,
    task_timeout: Option<Duration>,
    output_path: PathBuf,
}

impl Orchestrator {
    pub fn new(
        dispatcher: Dispatcher,
        analyzer: Arc<ContentAnalyzer>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dispatcher,
            analyzer,
            max_concurrent: 4,
            task_timeout: None,
            output_path: output_path.into(),
        }
    }

    /// Cap on files analyzed at once (at least 1)
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Per-file deadline; an expired file counts as failed
    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Categorize every supported file under `dir` and write the result.
    ///
    /// Individual file failures are logged and excluded; only dispatch or
    /// output persistence errors abort the run.
    pub async fn run(&self, dir: &Path) -> Result<RunOutcome> {
        let items = self.dispatcher.dispatch(dir)?;
        info!(
            "Analyzing {} files from {:?} ({} at a time)",
            items.len(),
            dir,
            self.max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let handles: Vec<_> = items
            .iter()
            .cloned()
            .map(|item| {
                let analyzer = Arc::clone(&self.analyzer);
                let semaphore = Arc::clone(&semaphore);
                let timeout = self.task_timeout;
                tokio::spawn(async move { analyze_one(&analyzer, &semaphore, &item, timeout).await })
            })
            .collect();

        // join_all keeps results aligned with `items`
        let settled = join_all(handles).await;

        let mut outcome = RunOutcome {
            dispatched: items.len(),
            ..Default::default()
        };
        for (item, joined) in items.iter().zip(settled) {
            let result = joined
                .map_err(|e| ArgusError::Analysis(format!("Task aborted: {}", e)))
                .and_then(|r| r);

            match result {
                Ok(facets) => {
                    outcome.succeeded += 1;
                    outcome.categorization.record(&item.file_name, facets);
                }
                Err(e) => {
                    if e.is_external() {
                        warn!("Skipping {:?}: external service failed: {}", item.path, e);
                    } else {
                        warn!("Skipping {:?}: {}", item.path, e);
                    }
                    outcome.failures.push(FileFailure {
                        path: item.path.clone(),
                        file_name: item.file_name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        outcome.categorization.finalize();

        if let Err(e) = outcome.categorization.save(&self.output_path) {
            error!("Failed to write categorization to {:?}: {}", self.output_path, e);
            return Err(e);
        }

        info!(
            "Categorized {}/{} files: {} with people, {} with hardware, {} failed",
            outcome.succeeded,
            outcome.dispatched,
            outcome.categorization.people.len(),
            outcome.categorization.hardware.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }
}

async fn analyze_one(
    analyzer: &ContentAnalyzer,
    semaphore: &Semaphore,
    item: &DispatchItem,
    timeout: Option<Duration>,
) -> Result<CategorizationResult> {
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|_| ArgusError::Analysis("Worker pool closed".to_string()))?;

    match timeout {
        Some(limit) => tokio::time::timeout(limit, analyzer.analyze(item))
            .await
            .map_err(|_| {
                ArgusError::Timeout(format!("{} not analyzed within {:?}", item.file_name, limit))
            })?,
        None => analyzer.analyze(item).await,
    }
}
