//! Domain data structures for regions, boundary features, and load results.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::FetchError;

/// GeoJSON `type` tag carried by every [`FeatureCollection`].
pub const FEATURE_COLLECTION_TYPE: &str = "FeatureCollection";

/// Built-in boundary data sources.
pub enum Sources {
    /// Whole-country documents mirrored on public CDNs.
    Cdn,
    /// Per-province documents from Aliyun `DataV`.
    Datav,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a boundary data source known to platemap.
pub struct SourceId(pub String);

impl fmt::Display for Sources {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            Sources::Cdn => "cdn",
            Sources::Datav => "datav",
        };
        write!(formatter, "{slug}")
    }
}

impl From<Sources> for SourceId {
    fn from(source: Sources) -> Self {
        SourceId(source.to_string())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Metadata describing a source and its human-friendly name.
pub struct SourceMeta {
    /// Unique identifier.
    pub id: SourceId,
    /// Display name shown when picking a source.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Six-digit administrative division code, e.g. `110000` for Beijing.
pub struct RegionCode(pub String);

impl fmt::Display for RegionCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A first-level administrative region.
pub struct RegionEntry {
    /// Official display name, e.g. “北京市”.
    pub name: String,
    /// Administrative division code used to address per-region documents.
    pub code: RegionCode,
}

impl RegionEntry {
    /// Construct an entry from a name and a code.
    #[must_use]
    pub fn new<N: Into<String>, C: Into<String>>(name: N, code: C) -> Self {
        Self {
            name: name.into(),
            code: RegionCode(code.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
/// One boundary unit as emitted by a source. Kept opaque by the loader.
pub struct GeoFeature(pub Value);

impl GeoFeature {
    /// `properties.name` of the feature, if present.
    ///
    /// Meant for presentation layers; the loader never looks inside features.
    #[must_use]
    pub fn property_name(&self) -> Option<&str> {
        self.0.get("properties")?.get("name")?.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// GeoJSON-shaped collection assembled by one load cycle.
pub struct FeatureCollection {
    /// Always [`FEATURE_COLLECTION_TYPE`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Features in merge order.
    pub features: Vec<GeoFeature>,
}

impl FeatureCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind: FEATURE_COLLECTION_TYPE.to_owned(),
            features: Vec::new(),
        }
    }

    /// Append features, keeping their order.
    pub fn append(&mut self, features: Vec<GeoFeature>) {
        self.features.extend(features);
    }

    /// Number of features collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether no feature has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<GeoFeature>> for FeatureCollection {
    fn from(features: Vec<GeoFeature>) -> Self {
        Self {
            kind: FEATURE_COLLECTION_TYPE.to_owned(),
            features,
        }
    }
}

#[derive(Debug, Clone)]
/// Result of a single fetch attempt.
pub enum FetchOutcome {
    /// The source returned a usable `features` array.
    Success(Vec<GeoFeature>),
    /// The attempt failed; the reason is kept for logging and reports.
    Failure(FetchError),
}

impl FetchOutcome {
    /// Whether the attempt produced features.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Summary of a finished load cycle.
pub struct LoadReport {
    /// Fetch attempts that returned features.
    pub success_count: usize,
    /// Fetch attempts that failed.
    pub failure_count: usize,
    /// Features in the merged collection.
    pub total_features: usize,
}

impl LoadReport {
    /// Total number of fetch attempts.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.success_count + self.failure_count
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} succeeded, {} failed, {} features",
            self.success_count, self.failure_count, self.total_features
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Live progress of a per-region load, published after each batch.
pub struct LoadProgress {
    /// Regions loaded so far.
    pub succeeded: usize,
    /// Regions that failed so far.
    pub failed: usize,
    /// Regions in the catalog.
    pub total: usize,
    /// Batches joined so far.
    pub batches_done: usize,
    /// Batches in the plan.
    pub batch_count: usize,
}

impl LoadProgress {
    /// Whether every batch has been joined.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.batch_count > 0 && self.batches_done == self.batch_count
    }
}

impl fmt::Display for LoadProgress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "loading {}/{}", self.succeeded, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Per-region render record handed to the presentation layer.
pub struct MapValue {
    /// Region display name as keyed in the plate table.
    pub name: String,
    /// Colour-scale value.
    pub value: f64,
    /// License-plate prefix.
    pub plate: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn collection_serializes_as_geojson() {
        let collection = FeatureCollection::from(vec![GeoFeature(json!({"type": "Feature"}))]);
        let value = serde_json::to_value(&collection).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn property_name_reads_nested_name() {
        let feature = GeoFeature(json!({"properties": {"name": "北京市"}}));
        assert_eq!(feature.property_name(), Some("北京市"));

        let nameless = GeoFeature(json!({"geometry": null}));
        assert_eq!(nameless.property_name(), None);
    }

    #[test]
    fn progress_reports_completion() {
        let mut progress = LoadProgress {
            total: 31,
            batch_count: 7,
            ..LoadProgress::default()
        };
        assert!(!progress.is_complete());

        progress.batches_done = 7;
        progress.succeeded = 30;
        assert!(progress.is_complete());
        assert_eq!(progress.to_string(), "loading 30/31");
    }
}
