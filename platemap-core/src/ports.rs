//! Traits describing the fetch boundary and shared error types.

use std::time::Duration;

use async_trait::async_trait;

use crate::model::{FetchOutcome, LoadReport, SourceId};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Why a single fetch attempt failed.
pub enum FetchError {
    /// Network layer failed before a response arrived.
    #[error("Transport error: {0}")]
    Transport(String),
    /// Source answered with a non-success status.
    #[error("HTTP error! status: {status}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: u16,
    },
    /// Body was not JSON or had no `features` array.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    /// No answer within the per-fetch timeout.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(thiserror::Error, Debug, Clone)]
/// Errors that abort a whole load cycle.
pub enum LoadError {
    /// Every region failed, nothing can be drawn.
    #[error("No boundary data could be loaded ({report})")]
    AggregateEmpty {
        /// Counts collected before giving up.
        report: LoadReport,
    },
    /// Every candidate of a fallback chain failed.
    #[error("All {attempts} data sources failed. Last error: {}", describe_last(.last))]
    SourcesExhausted {
        /// Attempts made, one per candidate.
        attempts: usize,
        /// Error of the last candidate tried.
        last: Option<FetchError>,
    },
    /// The caller cancelled the load.
    #[error("Load cancelled")]
    Cancelled,
    /// The requested source has no registered plugin.
    #[error("Unsupported source: {0}")]
    UnsupportedSource(SourceId),
    /// The background load task died.
    #[error("Load task failed: {0}")]
    Runtime(String),
}

impl LoadError {
    /// Success and failure counts, when the error carries them.
    #[must_use]
    pub fn report(&self) -> Option<LoadReport> {
        match self {
            LoadError::AggregateEmpty { report } => Some(*report),
            LoadError::SourcesExhausted { attempts, .. } => Some(LoadReport {
                success_count: 0,
                failure_count: *attempts,
                total_features: 0,
            }),
            LoadError::Cancelled | LoadError::UnsupportedSource(_) | LoadError::Runtime(_) => {
                None
            }
        }
    }
}

fn describe_last(last: &Option<FetchError>) -> String {
    last.as_ref()
        .map_or_else(|| "no source configured".to_owned(), ToString::to_string)
}

#[async_trait]
/// Fetches one boundary document.
///
/// Implementations never fail past this boundary: every problem is
/// reported as [`FetchOutcome::Failure`].
pub trait SourceFetcher: Send + Sync {
    /// Fetch and classify the document at `url`.
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

#[async_trait]
/// Takes the pause between two batches.
pub trait Pacer: Send + Sync {
    /// Wait for `delay`.
    async fn pause(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
/// [`Pacer`] backed by the tokio timer.
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_message_names_last_error() {
        let err = LoadError::SourcesExhausted {
            attempts: 3,
            last: Some(FetchError::HttpStatus { status: 503 }),
        };

        let message = err.to_string();
        assert!(message.contains("All 3 data sources failed"), "{message}");
        assert!(message.contains("status: 503"), "{message}");
        assert_eq!(err.report().map(|report| report.failure_count), Some(3));
    }

    #[test]
    fn cancelled_carries_no_report() {
        assert!(LoadError::Cancelled.report().is_none());
    }
}
