//! Resilient loading of boundary features from unreliable sources.
//!
//! Two strategies are supported:
//!
//! - a **fallback chain** of whole-country documents, tried strictly in
//!   order until one succeeds;
//! - **per-region** documents fetched in bounded batches. Single failures
//!   are tolerated and only an empty result is fatal.
//!
//! Every fetch is bounded by the configured timeout and the whole load can
//! be abandoned through a [`CancellationToken`].

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::catalog::RegionCatalog;
use crate::config::{Concurrency, LoaderConfig};
use crate::model::{FeatureCollection, FetchOutcome, LoadProgress, LoadReport, RegionEntry};
use crate::ports::{FetchError, LoadError, Pacer, SourceFetcher, TokioPacer};

/// Placeholder replaced by the region code in per-region URL templates.
pub const CODE_PLACEHOLDER: &str = "{code}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// How a source delivers its boundary data.
pub enum LoadStrategy {
    /// Whole-country documents in preference order.
    FallbackChain {
        /// Candidate URLs, first is preferred.
        urls: Vec<String>,
    },
    /// One document per catalog region.
    PerRegion {
        /// URL with a `{code}` placeholder.
        url_template: String,
    },
}

#[derive(Debug, Clone)]
/// Successful result of a load cycle.
pub struct LoadedMap {
    /// Merged features.
    pub collection: FeatureCollection,
    /// Attempt counts.
    pub report: LoadReport,
}

/// Split `entries` into ordered batches for the given concurrency.
#[must_use]
pub fn plan_batches(entries: &[RegionEntry], concurrency: Concurrency) -> Vec<&[RegionEntry]> {
    entries
        .chunks(concurrency.batch_size(entries.len()))
        .collect()
}

/// Expand a per-region URL template for `entry`.
#[must_use]
pub fn region_url(url_template: &str, entry: &RegionEntry) -> String {
    url_template.replace(CODE_PLACEHOLDER, &entry.code.0)
}

/// Runs a [`LoadStrategy`] against a [`SourceFetcher`].
pub struct ResilientAggregator {
    fetcher: Arc<dyn SourceFetcher>,
    pacer: Arc<dyn Pacer>,
    config: LoaderConfig,
}

impl ResilientAggregator {
    /// Aggregator pausing between batches on the tokio timer.
    #[must_use]
    pub fn new(fetcher: Arc<dyn SourceFetcher>, config: LoaderConfig) -> Self {
        Self {
            fetcher,
            pacer: Arc::new(TokioPacer),
            config,
        }
    }

    /// Replace the pacer used between batches.
    #[must_use]
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Run `strategy`, reporting progress after every batch or attempt.
    ///
    /// # Errors
    ///
    /// See [`Self::load_fallback_chain`] and [`Self::load_per_region`].
    pub async fn load<G>(
        &self,
        strategy: &LoadStrategy,
        catalog: &RegionCatalog,
        cancel: &CancellationToken,
        on_progress: G,
    ) -> Result<LoadedMap, LoadError>
    where
        G: FnMut(LoadProgress) + Send,
    {
        match strategy {
            LoadStrategy::FallbackChain { urls } => {
                self.load_fallback_chain(urls, cancel, on_progress).await
            }
            LoadStrategy::PerRegion { url_template } => {
                self.load_per_region(catalog, url_template, cancel, on_progress)
                    .await
            }
        }
    }

    /// Try each URL in order and return the first document that loads.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::SourcesExhausted`] carrying the last failure when
    /// every candidate fails, or [`LoadError::Cancelled`].
    pub async fn load_fallback_chain<G>(
        &self,
        urls: &[String],
        cancel: &CancellationToken,
        mut on_progress: G,
    ) -> Result<LoadedMap, LoadError>
    where
        G: FnMut(LoadProgress) + Send,
    {
        let mut report = LoadReport::default();
        let mut last = None;

        for (attempt, url) in urls.iter().enumerate() {
            info!(attempt = attempt + 1, of = urls.len(), url, "trying whole-country source");

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(LoadError::Cancelled),
                outcome = self.fetch_bounded(url) => outcome,
            };

            match outcome {
                FetchOutcome::Success(features) => {
                    report.success_count += 1;
                    report.total_features = features.len();
                    on_progress(LoadProgress {
                        succeeded: 1,
                        failed: report.failure_count,
                        total: 1,
                        batches_done: attempt + 1,
                        batch_count: urls.len(),
                    });
                    info!(url, %report, "whole-country source loaded");
                    return Ok(LoadedMap {
                        collection: FeatureCollection::from(features),
                        report,
                    });
                }
                FetchOutcome::Failure(err) => {
                    warn!(attempt = attempt + 1, url, error = %err, "whole-country source failed");
                    report.failure_count += 1;
                    on_progress(LoadProgress {
                        succeeded: 0,
                        failed: report.failure_count,
                        total: 1,
                        batches_done: attempt + 1,
                        batch_count: urls.len(),
                    });
                    last = Some(err);
                }
            }
        }

        Err(LoadError::SourcesExhausted {
            attempts: urls.len(),
            last,
        })
    }

    /// Fetch every catalog region in batches and merge what arrives.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::AggregateEmpty`] when no feature was collected,
    /// or [`LoadError::Cancelled`].
    pub async fn load_per_region<G>(
        &self,
        catalog: &RegionCatalog,
        url_template: &str,
        cancel: &CancellationToken,
        mut on_progress: G,
    ) -> Result<LoadedMap, LoadError>
    where
        G: FnMut(LoadProgress) + Send,
    {
        let batches = plan_batches(catalog.entries(), self.config.concurrency);
        let mut collection = FeatureCollection::new();
        let mut report = LoadReport::default();
        let mut progress = LoadProgress {
            total: catalog.len(),
            batch_count: batches.len(),
            ..LoadProgress::default()
        };

        info!(
            regions = catalog.len(),
            batches = batches.len(),
            "starting per-region load"
        );

        for (index, batch) in batches.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(LoadError::Cancelled);
            }
            if index > 0 {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(LoadError::Cancelled),
                    () = self.pacer.pause(self.config.inter_batch_delay) => {}
                }
            }

            let fetches = batch.iter().map(|entry| {
                let url = region_url(url_template, entry);
                async move { (entry, self.fetch_bounded(&url).await) }
            });
            // join_all yields in input order, which keeps the merge stable.
            let outcomes = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(LoadError::Cancelled),
                outcomes = join_all(fetches) => outcomes,
            };

            for (entry, outcome) in outcomes {
                match outcome {
                    FetchOutcome::Success(features) => {
                        report.success_count += 1;
                        collection.append(features);
                    }
                    FetchOutcome::Failure(err) => {
                        report.failure_count += 1;
                        warn!(region = %entry.name, code = %entry.code, error = %err, "region boundary unavailable");
                    }
                }
            }

            progress.succeeded = report.success_count;
            progress.failed = report.failure_count;
            progress.batches_done = index + 1;
            on_progress(progress);
            info!(
                batch = index + 1,
                of = batches.len(),
                succeeded = report.success_count,
                failed = report.failure_count,
                "batch joined"
            );
        }

        report.total_features = collection.len();
        if collection.is_empty() {
            return Err(LoadError::AggregateEmpty { report });
        }

        info!(%report, "per-region load finished");
        Ok(LoadedMap { collection, report })
    }

    async fn fetch_bounded(&self, url: &str) -> FetchOutcome {
        let timeout = self.config.fetch_timeout;
        tokio::time::timeout(timeout, self.fetcher.fetch(url))
            .await
            .unwrap_or(FetchOutcome::Failure(FetchError::Timeout(timeout)))
    }
}
