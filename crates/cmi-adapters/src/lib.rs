//! Source adapter contracts + the CSV-feed and page-scrape implementations.

pub mod csv;
pub mod discover;
pub mod scrape;

use async_trait::async_trait;
use cmi_core::RawContractor;
use cmi_store::{FetchError, HttpFetcher};
use thiserror::Error;

pub use csv::CsvFeedAdapter;
pub use discover::{suggest_card_selectors, SelectorCandidate};
pub use scrape::{PageScrapeAdapter, SelectorSet};

pub const CRATE_NAME: &str = "cmi-adapters";

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Fetch or navigation failure. Aborts the whole batch run; partial
    /// results already persisted by earlier runs are untouched.
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] FetchError),
    #[error("{0}")]
    Message(String),
}

/// One adapter pull: the raw records plus a count of rows/cards that were
/// dropped for missing required structure. The batch runner folds `malformed`
/// into its skipped and total counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterBatch {
    pub records: Vec<RawContractor>,
    pub malformed: usize,
}

#[async_trait]
pub trait SourceAdapter: Send + Sync + std::fmt::Debug {
    /// Provenance tag stored on every record this adapter yields.
    fn source_label(&self) -> &str;

    /// Acquire and shape the source in one pass. Adapters do not retry; a
    /// failed fetch propagates as [`AdapterError::SourceUnavailable`].
    async fn fetch(&self, http: &HttpFetcher) -> Result<AdapterBatch, AdapterError>;
}
