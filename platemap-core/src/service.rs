//! High-level service facade combining sources, catalog, and plate table.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::info;

use crate::aggregator::{LoadStrategy, LoadedMap, ResilientAggregator};
use crate::catalog::{PlateTable, RegionCatalog};
use crate::config::LoaderConfig;
use crate::interaction::InteractionHandler;
use crate::matcher::NameMatcher;
use crate::model::{FeatureCollection, LoadProgress, LoadReport, MapValue, SourceId, SourceMeta};
use crate::plugin::SourceRegistry;
use crate::ports::{LoadError, Pacer, SourceFetcher, TokioPacer};

/// Name under which the merged collection is registered for rendering.
pub const MAP_NAME: &str = "china";

/// Everything a frontend needs to draw one successfully loaded map.
///
/// A context is created per load and dropped on reload.
#[derive(Debug, Clone)]
pub struct MapContext {
    source: SourceId,
    collection: FeatureCollection,
    report: LoadReport,
    values: Vec<MapValue>,
    interaction: InteractionHandler,
}

impl MapContext {
    /// Assemble a context from a finished load.
    #[must_use]
    pub fn new(
        source: SourceId,
        loaded: LoadedMap,
        values: Vec<MapValue>,
        interaction: InteractionHandler,
    ) -> Self {
        Self {
            source,
            collection: loaded.collection,
            report: loaded.report,
            values,
            interaction,
        }
    }

    /// Map registration name.
    #[must_use]
    pub fn map_name(&self) -> &'static str {
        MAP_NAME
    }

    /// Source the features came from.
    #[must_use]
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Merged boundary features.
    #[must_use]
    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// Attempt counts of the load.
    #[must_use]
    pub fn report(&self) -> LoadReport {
        self.report
    }

    /// Per-region render records.
    #[must_use]
    pub fn values(&self) -> &[MapValue] {
        &self.values
    }

    /// Click and hover handling bound to this map's table.
    #[must_use]
    pub fn interaction(&self) -> &InteractionHandler {
        &self.interaction
    }
}

/// A load running in the background.
///
/// Dropping the handle cancels the load.
pub struct LoadHandle {
    progress: watch::Receiver<LoadProgress>,
    cancel: CancellationToken,
    guard: DropGuard,
    task: JoinHandle<Result<MapContext, LoadError>>,
}

impl LoadHandle {
    /// Receiver that sees every progress update.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<LoadProgress> {
        self.progress.clone()
    }

    /// Most recent progress update.
    #[must_use]
    pub fn current_progress(&self) -> LoadProgress {
        *self.progress.borrow()
    }

    /// Ask the load to stop; [`Self::wait`] then yields [`LoadError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the load has produced its result.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the load to finish.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] of the load, [`LoadError::Cancelled`] after
    /// [`Self::cancel`], or [`LoadError::Runtime`] if the task panicked.
    pub async fn wait(self) -> Result<MapContext, LoadError> {
        let Self { task, guard, .. } = self;
        let result = match task.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(LoadError::Cancelled),
            Err(err) => Err(LoadError::Runtime(err.to_string())),
        };
        let _token = guard.disarm();
        result
    }
}

/// Public entry point for loading maps and resolving plates.
pub struct PlateMapService {
    registry: Arc<SourceRegistry>,
    fetcher: Arc<dyn SourceFetcher>,
    pacer: Arc<dyn Pacer>,
    catalog: Arc<RegionCatalog>,
    table: Arc<PlateTable>,
    matcher: NameMatcher,
    config: LoaderConfig,
}

impl PlateMapService {
    /// Create a service over the built-in catalog and plate table.
    #[must_use]
    pub fn new(
        registry: Arc<SourceRegistry>,
        fetcher: Arc<dyn SourceFetcher>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            pacer: Arc::new(TokioPacer),
            catalog: Arc::new(RegionCatalog::china()),
            table: Arc::new(PlateTable::china()),
            matcher: NameMatcher::default(),
            config,
        }
    }

    /// Use a different region catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: RegionCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Use a different plate table.
    #[must_use]
    pub fn with_table(mut self, table: PlateTable) -> Self {
        self.table = Arc::new(table);
        self
    }

    /// Use a different name matcher.
    #[must_use]
    pub fn with_matcher(mut self, matcher: NameMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Use a different pacer between batches.
    #[must_use]
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// List all available sources in registration order.
    #[must_use]
    pub fn sources(&self) -> Vec<SourceMeta> {
        self.registry.sources()
    }

    /// Region catalog in use.
    #[must_use]
    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    /// Render records for the plate table.
    #[must_use]
    pub fn map_values(&self) -> Vec<MapValue> {
        self.table.map_values()
    }

    /// Click and hover handling over the plate table.
    #[must_use]
    pub fn interaction(&self) -> InteractionHandler {
        InteractionHandler::new(self.matcher.clone(), Arc::clone(&self.table))
    }

    /// Start loading `source` in the background.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnsupportedSource`] if no plugin is registered.
    pub fn start_load(&self, source: &SourceId) -> Result<LoadHandle, LoadError> {
        let plugin = self.registry.plugin(source)?;
        let strategy = plugin.strategy.clone();
        let source_id = plugin.meta.id.clone();

        let total = match &strategy {
            LoadStrategy::FallbackChain { .. } => 1,
            LoadStrategy::PerRegion { .. } => self.catalog.len(),
        };
        let (progress_tx, progress_rx) = watch::channel(LoadProgress {
            total,
            ..LoadProgress::default()
        });

        let aggregator = ResilientAggregator::new(Arc::clone(&self.fetcher), self.config.clone())
            .with_pacer(Arc::clone(&self.pacer));
        let catalog = Arc::clone(&self.catalog);
        let values = self.map_values();
        let interaction = self.interaction();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        info!(source = %source_id, "starting map load");
        let task = tokio::spawn(async move {
            let loaded = aggregator
                .load(&strategy, &catalog, &token, |progress| {
                    progress_tx.send_replace(progress);
                })
                .await?;
            Ok::<_, LoadError>(MapContext::new(source_id, loaded, values, interaction))
        });

        Ok(LoadHandle {
            progress: progress_rx,
            guard: cancel.clone().drop_guard(),
            cancel,
            task,
        })
    }
}
