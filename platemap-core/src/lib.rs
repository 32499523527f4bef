//! Core types and service wiring for the platemap boundary loader.

/// Resilient multi-source loading of boundary features.
pub mod aggregator;
/// Built-in region catalog and plate prefix table.
pub mod catalog;
/// Loader tuning knobs.
pub mod config;
/// HTTP implementation of the source fetcher port.
pub mod fetch;
/// Click and hover handling on top of the name matcher.
pub mod interaction;
/// Suffix-tolerant lookup of display names.
pub mod matcher;
/// Domain models shared by all sources and frontends.
pub mod model;
/// Registry for plugging boundary data sources into the service.
pub mod plugin;
/// Traits and error types describing the fetch boundary.
pub mod ports;
/// High-level service facade used by frontends.
pub mod service;

pub use aggregator::*;
pub use catalog::*;
pub use config::*;
pub use fetch::*;
pub use interaction::*;
pub use matcher::*;
pub use model::*;
pub use plugin::*;
pub use ports::*;
pub use service::*;
