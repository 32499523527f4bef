//! End-to-end load cycles against scripted sources.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use platemap_core::{
    ClickOutcome, DetailView, FetchError, FetchOutcome, GeoFeature, LoadError, LoadStrategy,
    LoaderConfig, Pacer, PlateMapService, RegionCatalog, RegionEntry, ResilientAggregator,
    SourceFetcher, SourceId, SourceMeta, SourcePlugin, SourceRegistry,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

const TEMPLATE: &str = "https://geo.test/{code}.json";

/// Per-URL scripted answers; unknown URLs answer with a transport error.
#[derive(Default)]
struct ScriptedSource {
    answers: HashMap<String, FetchOutcome>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedSource {
    fn with(mut self, url: &str, outcome: FetchOutcome) -> Self {
        self.answers.insert(url.to_owned(), outcome);
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SourceFetcher for ScriptedSource {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.calls.lock().unwrap().push(url.to_owned());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answers
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchOutcome::Failure(FetchError::Transport("refused".into())))
    }
}

#[derive(Default)]
struct InstantPacer {
    pauses: AtomicUsize,
}

#[async_trait]
impl Pacer for InstantPacer {
    async fn pause(&self, _delay: Duration) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

fn catalog(size: usize) -> RegionCatalog {
    RegionCatalog::new(
        (0..size)
            .map(|idx| RegionEntry::new(format!("region-{idx}"), format!("{}", 100_000 + idx)))
            .collect(),
    )
    .unwrap()
}

fn url_for(idx: usize) -> String {
    TEMPLATE.replace("{code}", &format!("{}", 100_000 + idx))
}

fn features(count: usize) -> FetchOutcome {
    FetchOutcome::Success(
        (0..count)
            .map(|idx| GeoFeature(json!({ "type": "Feature", "properties": { "idx": idx } })))
            .collect(),
    )
}

fn aggregator(source: Arc<ScriptedSource>, pacer: Arc<InstantPacer>) -> ResilientAggregator {
    ResilientAggregator::new(source, LoaderConfig::default().with_batch_size(5)).with_pacer(pacer)
}

async fn per_region(
    source: Arc<ScriptedSource>,
    size: usize,
) -> Result<platemap_core::LoadedMap, LoadError> {
    aggregator(source, Arc::new(InstantPacer::default()))
        .load_per_region(&catalog(size), TEMPLATE, &CancellationToken::new(), |_| {})
        .await
}

#[tokio::test]
async fn all_success_sums_feature_counts() {
    let mut source = ScriptedSource::default();
    let mut expected = 0;
    for idx in 0..31 {
        let count = idx % 3 + 1;
        expected += count;
        source = source.with(&url_for(idx), features(count));
    }

    let loaded = per_region(Arc::new(source), 31).await.unwrap();

    assert_eq!(loaded.collection.len(), expected);
    assert_eq!(loaded.report.total_features, expected);
    assert_eq!(loaded.report.success_count, 31);
    assert_eq!(loaded.report.failure_count, 0);
}

#[tokio::test]
async fn partial_failure_is_still_success() {
    let source = ScriptedSource::default()
        .with(&url_for(0), features(2))
        .with(&url_for(7), FetchOutcome::Failure(FetchError::HttpStatus { status: 429 }))
        .with(&url_for(12), features(1));

    let loaded = per_region(Arc::new(source), 31).await.unwrap();

    assert!(loaded.report.success_count >= 1);
    assert!(loaded.report.failure_count >= 1);
    assert_eq!(loaded.report.success_count, 2);
    assert_eq!(loaded.report.failure_count, 29);
    assert_eq!(loaded.collection.len(), 3);
}

#[tokio::test]
async fn total_failure_is_aggregate_empty() {
    let source = Arc::new(ScriptedSource::default());

    let err = per_region(Arc::clone(&source), 31).await.unwrap_err();

    match err {
        LoadError::AggregateEmpty { report } => {
            assert_eq!(report.success_count, 0);
            assert_eq!(report.failure_count, 31);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(source.call_count(), 31);
}

#[tokio::test]
async fn empty_feature_arrays_alone_are_fatal() {
    let mut source = ScriptedSource::default();
    for idx in 0..4 {
        source = source.with(&url_for(idx), features(0));
    }

    let err = per_region(Arc::new(source), 4).await.unwrap_err();

    assert!(matches!(err, LoadError::AggregateEmpty { report } if report.success_count == 4));
}

#[tokio::test]
async fn delay_runs_between_batches_only() {
    let pacer = Arc::new(InstantPacer::default());
    let source = Arc::new(ScriptedSource::default().with(&url_for(30), features(1)));

    let mut updates = Vec::new();
    aggregator(source, Arc::clone(&pacer))
        .load_per_region(&catalog(31), TEMPLATE, &CancellationToken::new(), |progress| {
            updates.push(progress);
        })
        .await
        .unwrap();

    assert_eq!(pacer.pauses.load(Ordering::SeqCst), 6);
    let done: Vec<usize> = updates.iter().map(|progress| progress.batches_done).collect();
    assert_eq!(done, [1, 2, 3, 4, 5, 6, 7]);
    assert!(updates.iter().all(|progress| progress.total == 31));
}

#[tokio::test]
async fn repeated_loads_are_idempotent() {
    let build = || {
        let mut source = ScriptedSource::default();
        for idx in (0..31).step_by(2) {
            source = source.with(&url_for(idx), features(2));
        }
        Arc::new(source)
    };

    let first = per_region(build(), 31).await.unwrap();
    let second = per_region(build(), 31).await.unwrap();

    assert_eq!(first.collection.len(), second.collection.len());
    assert_eq!(first.collection, second.collection);
    assert_eq!(first.report, second.report);
}

#[tokio::test(start_paused = true)]
async fn batches_never_overlap() {
    // Every fetch takes one second; with B=5 and no pacing delay, 12 regions
    // need three sequential batches.
    let source = Arc::new(
        (0..12)
            .fold(ScriptedSource::default(), |source, idx| {
                source.with(&url_for(idx), features(1))
            })
            .slow(Duration::from_secs(1)),
    );
    let started = tokio::time::Instant::now();

    let loaded = per_region(source, 12).await.unwrap();

    assert_eq!(loaded.collection.len(), 12);
    assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test]
async fn unbounded_load_is_one_batch_without_pauses() {
    let pacer = Arc::new(InstantPacer::default());
    let source = Arc::new(
        (0..12).fold(ScriptedSource::default(), |source, idx| {
            source.with(&url_for(idx), features(1))
        }),
    );

    let mut updates = Vec::new();
    let loaded = ResilientAggregator::new(
        Arc::<ScriptedSource>::clone(&source),
        LoaderConfig::default().with_batch_size(0),
    )
    .with_pacer(Arc::<InstantPacer>::clone(&pacer))
    .load_per_region(&catalog(12), TEMPLATE, &CancellationToken::new(), |progress| {
        updates.push(progress);
    })
    .await
    .unwrap();

    assert_eq!(loaded.collection.len(), 12);
    assert_eq!(source.call_count(), 12);
    assert_eq!(pacer.pauses.load(Ordering::SeqCst), 0);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].batch_count, 1);
    assert!(updates[0].is_complete());
}

fn service(source: Arc<ScriptedSource>) -> PlateMapService {
    let registry = SourceRegistry::new(vec![
        SourcePlugin {
            meta: SourceMeta {
                id: SourceId("chain".into()),
                name: "Chain".into(),
            },
            strategy: LoadStrategy::FallbackChain {
                urls: vec!["https://a/china.json".into(), "https://b/china.json".into()],
            },
        },
        SourcePlugin {
            meta: SourceMeta {
                id: SourceId("regions".into()),
                name: "Regions".into(),
            },
            strategy: LoadStrategy::PerRegion {
                url_template: TEMPLATE.into(),
            },
        },
    ]);

    PlateMapService::new(Arc::new(registry), source, LoaderConfig::default())
        .with_pacer(Arc::new(InstantPacer::default()))
}

#[tokio::test]
async fn service_load_yields_context() {
    let source = ScriptedSource::default().with("https://b/china.json", features(34));
    let service = service(Arc::new(source));

    let handle = service.start_load(&SourceId("chain".into())).unwrap();
    let progress = handle.progress();
    let context = handle.wait().await.unwrap();

    assert_eq!(context.map_name(), "china");
    assert_eq!(context.collection().len(), 34);
    assert_eq!(context.report().failure_count, 1);
    assert_eq!(context.values().len(), 34);
    assert_eq!(progress.borrow().succeeded, 1);
}

#[tokio::test]
async fn service_rejects_unknown_source() {
    let service = service(Arc::new(ScriptedSource::default()));

    let err = service.start_load(&SourceId("nope".into())).err();

    assert!(matches!(err, Some(LoadError::UnsupportedSource(_))));
}

#[tokio::test]
async fn cancelling_handle_stops_load() {
    let source = Arc::new(ScriptedSource::default().slow(Duration::from_secs(60)));
    let service = service(Arc::clone(&source));

    let handle = service.start_load(&SourceId("regions".into())).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.cancel();

    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err, LoadError::Cancelled));
    assert!(source.call_count() <= 5);
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_stops_load() {
    let source = Arc::new(ScriptedSource::default().slow(Duration::from_secs(60)));
    let service = service(Arc::clone(&source));

    let handle = service.start_load(&SourceId("regions".into())).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(source.call_count(), 5);
    drop(handle);

    // Long enough for several more batches had the load kept going.
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(source.call_count(), 5);
}

#[derive(Default)]
struct Modal {
    opened: Option<(String, String)>,
}

impl DetailView for Modal {
    fn show_detail(&mut self, name: &str, plate: &str) {
        self.opened = Some((name.to_owned(), plate.to_owned()));
    }
}

#[tokio::test]
async fn context_clicks_resolve_official_names() {
    let source = ScriptedSource::default().with("https://a/china.json", features(1));
    let service = service(Arc::new(source));
    let context = service
        .start_load(&SourceId("chain".into()))
        .unwrap()
        .wait()
        .await
        .unwrap();

    let mut modal = Modal::default();
    let outcome = context.interaction().on_click("宁夏回族自治区", &mut modal);

    assert_eq!(modal.opened, Some(("宁夏".to_owned(), "宁".to_owned())));
    assert!(matches!(outcome, ClickOutcome::Shown { .. }));
}
