//! Source loading one boundary document per province from Aliyun `DataV`.
//!
//! `DataV` rate-limits bursts, so this source relies on the aggregator's
//! batching and inter-batch pause.

use platemap_core::{
    aggregator::{CODE_PLACEHOLDER, LoadStrategy},
    model::{SourceId, SourceMeta, Sources},
    plugin::SourcePlugin,
};

const BASE_URL: &str = "https://geo.datav.aliyun.com/areas_v3/bound";

/// Outline of a single region, without its subdivisions.
#[must_use]
pub fn outline_template() -> String {
    format!("{BASE_URL}/{CODE_PLACEHOLDER}.json")
}

/// Region together with its prefecture-level subdivisions.
#[must_use]
pub fn subdivided_template() -> String {
    format!("{BASE_URL}/{CODE_PLACEHOLDER}_full.json")
}

/// Build the plugin bundle for the `DataV` source.
#[must_use]
pub fn plugin() -> SourcePlugin {
    plugin_with_template(outline_template())
}

/// Same source with a custom URL template containing `{code}`.
#[must_use]
pub fn plugin_with_template<S: Into<String>>(url_template: S) -> SourcePlugin {
    SourcePlugin {
        meta: source_meta(),
        strategy: LoadStrategy::PerRegion {
            url_template: url_template.into(),
        },
    }
}

fn source_meta() -> SourceMeta {
    SourceMeta {
        id: SourceId::from(Sources::Datav),
        name: String::from("Per province (Aliyun DataV)"),
    }
}
