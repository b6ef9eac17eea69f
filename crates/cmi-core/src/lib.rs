//! Core domain model and field normalizers for CMI.

pub mod normalize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CRATE_NAME: &str = "cmi-core";

/// Raw listing as yielded by a source adapter, before any normalization.
///
/// Everything except `business_name` is optional; a source fills in whatever
/// its feed or markup actually exposes. `business_name` may still be empty
/// here — the upsert layer rejects it with a logged reason rather than the
/// adapter dropping it silently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContractor {
    pub business_name: String,
    pub license_number: Option<String>,
    pub classification_code: Option<String>,
    pub classification_name: Option<String>,
    pub license_status: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Single-line address; may embed city/state/zip (scraped cards).
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub website: Option<String>,
    /// Explicit specialty list, when the source provides one directly.
    pub specialties: Vec<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
}

/// Canonical contractor shape shared by every source.
///
/// `specialties` is always an ordered list and never empty after
/// normalization. `source` is the provenance tag and is immutable once a
/// record is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractorRecord {
    pub business_name: String,
    pub license_number: Option<String>,
    pub license_status: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub specialties: Vec<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub website: Option<String>,
    pub source: String,
}

/// Persisted contractor plus its owning user account (1:1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContractor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub record: ContractorRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
