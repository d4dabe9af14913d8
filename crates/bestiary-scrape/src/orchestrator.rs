use std::sync::Arc;

use bestiary_core::{AdjectiveIndex, AppConfig, ResultMap};
use futures::StreamExt;
use serde::Serialize;
use tracing::info;

use crate::fallback::FallbackStrategy;
use crate::resolver::PageResolver;
use crate::source::PageSource;
use crate::store::ImageStore;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionSummary {
    pub results: ResultMap,
    /// Number of distinct subjects a task was started for.
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Resolves every distinct subject of an index with bounded parallelism.
pub struct FetchOrchestrator {
    strategy: FallbackStrategy,
    concurrency: usize,
}

impl FetchOrchestrator {
    pub const MAX_CONCURRENCY: usize = 64;

    pub fn new(strategy: FallbackStrategy, concurrency: usize) -> Self {
        Self {
            strategy,
            concurrency: concurrency.clamp(1, Self::MAX_CONCURRENCY),
        }
    }

    pub fn from_config(config: &AppConfig, source: Arc<dyn PageSource>) -> Self {
        let strategy = FallbackStrategy::new(
            PageResolver::new(source),
            ImageStore::new(&config.output.image_dir),
        )
        .with_search_fallback(config.fetch.search_fallback);
        Self::new(strategy, config.fetch.concurrency)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn strategy(&self) -> &FallbackStrategy {
        &self.strategy
    }

    /// Runs the fallback chain once per canonical key and collects the
    /// results. Subjects fail independently; this always returns.
    pub async fn resolve_all(&self, index: &AdjectiveIndex) -> ResolutionSummary {
        // Dedup happens here, before anything runs, so each key gets one task.
        let subjects = index.unique_subjects();
        let dispatched = subjects.len();
        info!(subjects = dispatched, concurrency = self.concurrency, "resolving images");

        let mut stream = futures::stream::iter(subjects)
            .map(|subject| async move {
                let image = self.strategy.resolve_subject(&subject).await;
                (subject.key, image)
            })
            .buffer_unordered(self.concurrency);

        let mut results = ResultMap::new();
        while let Some((key, image)) = stream.next().await {
            results.record(key, image);
        }

        let succeeded = results.success_count();
        let failed = results.len() - succeeded;
        info!(succeeded, failed, "successfully downloaded {succeeded} images");

        ResolutionSummary {
            results,
            dispatched,
            succeeded,
            failed,
        }
    }
}
