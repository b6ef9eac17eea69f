//! Persistence-store contract + HTTP fetch utilities for CMI.
//!
//! The relational store is an external collaborator; the batch pipeline only
//! sees the [`ContractorStore`] trait. A connection-scoped handle is created
//! once at startup and passed in explicitly, never constructed ad hoc.

pub mod http;
pub mod memory;
pub mod pg;

use async_trait::async_trait;
use cmi_core::{ContractorRecord, StoredContractor};
use thiserror::Error;
use uuid::Uuid;

pub use http::{FetchError, HttpClientConfig, HttpFetcher};
pub use memory::MemoryContractorStore;
pub use pg::PgContractorStore;

pub const CRATE_NAME: &str = "cmi-store";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Message(String),
}

/// Lookup key for the insert-vs-update decision: exact business name, with
/// phone and email as secondary matches when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupKey {
    pub business_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl DedupKey {
    pub fn from_record(record: &ContractorRecord) -> Self {
        Self {
            business_name: record.business_name.clone(),
            phone: record.phone.clone(),
            email: record.email.clone(),
        }
    }
}

/// Everything needed to create a user + contractor (+ optional portfolio)
/// aggregate in one transaction.
#[derive(Debug, Clone)]
pub struct NewContractor {
    /// Contact or synthesized email; becomes the owning user's unique login.
    pub user_email: String,
    pub record: ContractorRecord,
    pub portfolio_title: Option<String>,
}

/// Mutable fields only. `source`, `email`, and `created_at` are deliberately
/// absent so a merge cannot overwrite provenance, account identity, or the
/// creation timestamp.
#[derive(Debug, Clone, Default)]
pub struct ContractorUpdate {
    pub license_number: Option<String>,
    pub license_status: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub specialties: Vec<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub website: Option<String>,
}

impl ContractorUpdate {
    /// Last-write-wins merge: take the incoming record's mutable fields as-is.
    pub fn from_record(incoming: &ContractorRecord) -> Self {
        Self {
            license_number: incoming.license_number.clone(),
            license_status: incoming.license_status.clone(),
            phone: incoming.phone.clone(),
            address: incoming.address.clone(),
            city: incoming.city.clone(),
            state: incoming.state.clone(),
            zip_code: incoming.zip_code.clone(),
            specialties: incoming.specialties.clone(),
            rating: incoming.rating,
            review_count: incoming.review_count,
            website: incoming.website.clone(),
        }
    }
}

#[async_trait]
pub trait ContractorStore: Send + Sync {
    async fn find_by_dedup_key(
        &self,
        key: &DedupKey,
    ) -> Result<Option<StoredContractor>, StoreError>;

    async fn create_contractor_aggregate(
        &self,
        new: NewContractor,
    ) -> Result<StoredContractor, StoreError>;

    async fn apply_update(
        &self,
        contractor_id: Uuid,
        update: ContractorUpdate,
    ) -> Result<(), StoreError>;

    async fn contractor_count(&self) -> Result<u64, StoreError>;
}
