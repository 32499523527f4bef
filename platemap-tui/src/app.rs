use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use platemap_core::{
    DetailView, LoadError, LoadHandle, LoadProgress, LoadReport, MapContext, NameMatcher,
    PlateMapService, SourceId, SourceMeta,
};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    SourceSelect,
    Loading,
    Map,
}

/// One row of the region list.
#[derive(Debug, Clone)]
pub(crate) struct RegionRow {
    /// Name exactly as the boundary source labels it.
    pub label: String,
    pub plate: Option<String>,
    pub value: Option<f64>,
}

/// Contents of the open detail popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Detail {
    pub name: String,
    pub plate: String,
}

#[derive(Default)]
struct DetailSlot(Option<Detail>);

impl DetailView for DetailSlot {
    fn show_detail(&mut self, name: &str, plate: &str) {
        self.0 = Some(Detail {
            name: name.to_owned(),
            plate: plate.to_owned(),
        });
    }
}

/// Total load failure shown as a dismissible popup.
#[derive(Debug, Clone)]
pub(crate) struct LoadFailure {
    pub message: String,
    pub report: Option<LoadReport>,
}

pub(crate) struct App {
    pub service: Arc<PlateMapService>,

    pub screen: Screen,
    pub sources: Vec<SourceMeta>,
    pub source_list_index: usize,
    pub selected_source: Option<SourceId>,

    pub load: Option<LoadHandle>,
    pub progress: LoadProgress,

    pub context: Option<MapContext>,
    pub regions: Vec<RegionRow>,
    pub region_index: usize,
    pub loaded_at: Option<DateTime<Local>>,

    pub detail: Option<Detail>,
    pub failure: Option<LoadFailure>,
    pub status_message: Option<String>,
}

impl App {
    pub(crate) fn new(service: Arc<PlateMapService>) -> Self {
        let sources = service.sources();
        Self {
            service,
            screen: Screen::SourceSelect,
            sources,
            source_list_index: 0,
            selected_source: None,
            load: None,
            progress: LoadProgress::default(),
            context: None,
            regions: Vec::new(),
            region_index: 0,
            loaded_at: None,
            detail: None,
            failure: None,
            status_message: None,
        }
    }

    pub(crate) fn select_current_source(&mut self) -> Option<SourceId> {
        let meta = self.sources.get(self.source_list_index)?;
        self.selected_source = Some(meta.id.clone());
        self.selected_source.clone()
    }

    pub(crate) fn select_source_by_id(&mut self, id: &str) -> Option<SourceId> {
        let position = self.sources.iter().position(|meta| meta.id.0 == id)?;
        self.source_list_index = position;
        self.select_current_source()
    }

    /// Start a fresh load of the selected source, dropping the current map.
    pub(crate) fn start_load(&mut self) {
        let Some(source) = self.selected_source.clone() else {
            self.status_message = Some("Select a data source first".into());
            return;
        };

        // Dropping a previous handle cancels it.
        self.load = None;
        self.context = None;
        self.regions.clear();
        self.region_index = 0;
        self.detail = None;
        self.failure = None;
        self.status_message = None;

        match self.service.start_load(&source) {
            Ok(handle) => {
                self.progress = handle.current_progress();
                self.load = Some(handle);
                self.screen = Screen::Loading;
            }
            Err(err) => self.on_failed(&err),
        }
    }

    pub(crate) fn cancel_load(&self) {
        if let Some(handle) = &self.load {
            handle.cancel();
        }
    }

    /// Refresh progress and take the finished handle, if any.
    pub(crate) fn poll_load(&mut self) -> Option<LoadHandle> {
        let handle = self.load.as_ref()?;
        self.progress = handle.current_progress();
        if handle.is_finished() {
            self.load.take()
        } else {
            None
        }
    }

    pub(crate) fn on_loaded(&mut self, context: MapContext) {
        self.regions = region_rows(&context, &self.service);
        self.region_index = 0;
        self.loaded_at = Some(Local::now());
        info!(source = %context.source(), report = %context.report(), "map ready");
        self.context = Some(context);
        self.screen = Screen::Map;
    }

    pub(crate) fn on_failed(&mut self, err: &LoadError) {
        if matches!(err, LoadError::Cancelled) {
            self.status_message = Some("Load cancelled".into());
            self.screen = Screen::SourceSelect;
            return;
        }

        warn!(error = %err, "map load failed");
        self.failure = Some(LoadFailure {
            message: err.to_string(),
            report: err.report(),
        });
        self.screen = Screen::SourceSelect;
    }

    pub(crate) fn dismiss_failure(&mut self) {
        self.failure = None;
    }

    pub(crate) fn click_current_region(&mut self) {
        let Some(context) = &self.context else {
            return;
        };
        let Some(row) = self.regions.get(self.region_index) else {
            return;
        };

        let mut slot = DetailSlot::default();
        context.interaction().on_click(&row.label, &mut slot);
        self.detail = slot.0;
    }

    pub(crate) fn close_detail(&mut self) {
        self.detail = None;
    }

    pub(crate) fn current_region(&self) -> Option<&RegionRow> {
        self.regions.get(self.region_index)
    }
}

/// Rows for every named feature, falling back to the catalog when the
/// source ships nameless features.
fn region_rows(context: &MapContext, service: &PlateMapService) -> Vec<RegionRow> {
    let mut labels: Vec<String> = Vec::new();
    for feature in &context.collection().features {
        if let Some(name) = feature.property_name()
            && !name.is_empty()
            && !labels.iter().any(|label| label == name)
        {
            labels.push(name.to_owned());
        }
    }
    if labels.is_empty() {
        labels = service
            .catalog()
            .iter()
            .map(|entry| entry.name.clone())
            .collect();
    }

    let values: HashMap<String, f64> = context
        .values()
        .iter()
        .map(|value| (value.name.clone(), value.value))
        .collect();
    let matcher = NameMatcher::default();

    labels
        .into_iter()
        .map(|label| {
            let tooltip = context.interaction().tooltip(&label);
            let value = matcher.resolve(&label, &values).map(|hit| *hit.value);
            RegionRow {
                label,
                plate: tooltip.plate,
                value,
            }
        })
        .collect()
}
