//! Click and hover handling for rendered regions.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::PlateTable;
use crate::matcher::NameMatcher;

/// Presentation hook that opens the detail view for a region.
pub trait DetailView {
    /// Show `plate` for the region called `name`.
    fn show_detail(&mut self, name: &str, plate: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// What a click resulted in.
pub enum ClickOutcome {
    /// The detail view was opened.
    Shown {
        /// Table key the click resolved to.
        name: String,
        /// Plate prefix shown.
        plate: String,
    },
    /// No table entry matched; nothing was shown.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Hover text for a region.
pub struct Tooltip {
    /// Name exactly as the map labels the region.
    pub name: String,
    /// Plate prefix, when the table knows the region.
    pub plate: Option<String>,
}

/// Resolves clicked or hovered region names against the plate table.
#[derive(Debug, Clone)]
pub struct InteractionHandler {
    matcher: NameMatcher,
    table: Arc<PlateTable>,
}

impl InteractionHandler {
    /// Handler resolving against `table` with `matcher`.
    #[must_use]
    pub fn new(matcher: NameMatcher, table: Arc<PlateTable>) -> Self {
        Self { matcher, table }
    }

    /// Handle a click on `region_name`.
    ///
    /// Unknown regions are logged and otherwise ignored.
    pub fn on_click(&self, region_name: &str, view: &mut dyn DetailView) -> ClickOutcome {
        let Some(hit) = self.matcher.resolve(region_name, self.table.as_ref()) else {
            debug!(region = region_name, "no plate entry for clicked region");
            return ClickOutcome::NotFound;
        };

        view.show_detail(hit.name, hit.value);
        ClickOutcome::Shown {
            name: hit.name.to_owned(),
            plate: hit.value.clone(),
        }
    }

    /// Hover text for `region_name`.
    #[must_use]
    pub fn tooltip(&self, region_name: &str) -> Tooltip {
        Tooltip {
            name: region_name.to_owned(),
            plate: self
                .matcher
                .resolve(region_name, self.table.as_ref())
                .map(|hit| hit.value.clone()),
        }
    }
}
