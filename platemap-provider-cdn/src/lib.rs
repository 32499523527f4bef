//! Source loading the whole-country document from public CDN mirrors.
//!
//! The mirrors are tried in order; the first one that answers wins.

use platemap_core::{
    aggregator::LoadStrategy,
    model::{SourceId, SourceMeta, Sources},
    plugin::SourcePlugin,
};

/// Whole-country documents, preferred mirror first.
pub const CANDIDATE_URLS: [&str; 3] = [
    "https://cdn.jsdelivr.net/npm/echarts@5.4.3/map/json/china.json",
    "https://unpkg.com/echarts@5.4.3/map/json/china.json",
    "https://geo.datav.aliyun.com/areas_v3/bound/100000_full.json",
];

/// Build the plugin bundle for the CDN source.
#[must_use]
pub fn plugin() -> SourcePlugin {
    plugin_with_urls(CANDIDATE_URLS)
}

/// Same source with a custom mirror list, e.g. an internal cache in front.
#[must_use]
pub fn plugin_with_urls<I, S>(urls: I) -> SourcePlugin
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    SourcePlugin {
        meta: source_meta(),
        strategy: LoadStrategy::FallbackChain {
            urls: urls.into_iter().map(Into::into).collect(),
        },
    }
}

fn source_meta() -> SourceMeta {
    SourceMeta {
        id: SourceId::from(Sources::Cdn),
        name: String::from("Whole country (CDN mirrors)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_keep_preference_order() {
        let LoadStrategy::FallbackChain { urls } = plugin().strategy else {
            panic!("CDN source must be a fallback chain");
        };

        assert_eq!(urls.len(), 3);
        assert!(urls[0].contains("jsdelivr"));
        assert!(urls[2].contains("100000_full"));
    }

    #[test]
    fn registers_under_cdn_id() {
        assert_eq!(plugin().meta.id, SourceId("cdn".to_owned()));
    }
}
