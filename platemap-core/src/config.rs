//! Loader configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

const DEFAULT_BATCH_SIZE: usize = 5;
const DEFAULT_INTER_BATCH_DELAY_MS: u64 = 200;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_USER_AGENT: &str = "platemap/0.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// How many per-region fetches may be in flight at once.
pub enum Concurrency {
    /// At most this many fetches per batch.
    Batched(NonZeroUsize),
    /// Every region in a single batch.
    Unbounded,
}

impl Concurrency {
    /// Batch size for a catalog of `total` regions, never zero.
    #[must_use]
    pub fn batch_size(self, total: usize) -> usize {
        match self {
            Concurrency::Batched(size) => size.get(),
            Concurrency::Unbounded => total.max(1),
        }
    }
}

impl From<usize> for Concurrency {
    /// Zero selects [`Concurrency::Unbounded`].
    fn from(batch_size: usize) -> Self {
        NonZeroUsize::new(batch_size).map_or(Concurrency::Unbounded, Concurrency::Batched)
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Concurrency::Batched(NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Tuning knobs shared by the fetcher and the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Per-region fan-out limit. Also read from `batch_size`, where a plain
    /// number is accepted and zero means unbounded.
    #[serde(alias = "batch_size", deserialize_with = "concurrency_or_size")]
    pub concurrency: Concurrency,

    /// Pause between two per-region batches.
    #[serde(with = "millis")]
    pub inter_batch_delay: Duration,

    /// Upper bound for a single fetch, including body download.
    #[serde(with = "millis")]
    pub fetch_timeout: Duration,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl LoaderConfig {
    /// Set the fan-out limit.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the batch size; zero selects [`Concurrency::Unbounded`].
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.concurrency = Concurrency::from(batch_size);
        self
    }

    /// Set the pause between batches.
    #[must_use]
    pub fn with_inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }

    /// Set the per-fetch timeout.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            concurrency: Concurrency::default(),
            inter_batch_delay: Duration::from_millis(DEFAULT_INTER_BATCH_DELAY_MS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConcurrencyRepr {
    Size(usize),
    Mode(Concurrency),
}

fn concurrency_or_size<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Concurrency, D::Error> {
    Ok(match ConcurrencyRepr::deserialize(deserializer)? {
        ConcurrencyRepr::Size(size) => Concurrency::from(size),
        ConcurrencyRepr::Mode(mode) => mode,
    })
}

// Durations are written as plain milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
