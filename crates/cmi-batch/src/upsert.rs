//! Dedup/upsert layer: decide insert, update, or skip for one record.
//!
//! Last-write-wins merge with no optimistic concurrency check. Running two
//! import batches concurrently against the same database is unsupported: both
//! can miss the lookup and insert a duplicate.

use chrono::Utc;
use cmi_core::normalize::{phone_digit_count, synthetic_email};
use cmi_core::ContractorRecord;
use cmi_store::{ContractorStore, ContractorUpdate, DedupKey, NewContractor};
use thiserror::Error;

use crate::registry::SourcePolicy;

/// Human-readable skip reasons; logged next to the business name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("missing business name")]
    MissingBusinessName,
    #[error("license status {0:?} is not Active")]
    InactiveLicense(Option<String>),
    #[error("phone has {got} digits, need at least {min}")]
    PhoneTooShort { got: usize, min: usize },
    #[error("persistence error: {0}")]
    Persistence(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Imported,
    Updated,
    Skipped(SkipReason),
}

/// Checks that hold regardless of store state. The active-license gate runs
/// before the lookup so an inactive row is always skipped, never merged.
fn gate(record: &ContractorRecord, policy: &SourcePolicy) -> Result<(), SkipReason> {
    if record.business_name.trim().is_empty() {
        return Err(SkipReason::MissingBusinessName);
    }
    if policy.require_active_license {
        match record.license_status.as_deref() {
            Some(status) if status.eq_ignore_ascii_case("active") => {}
            other => return Err(SkipReason::InactiveLicense(other.map(ToString::to_string))),
        }
    }
    Ok(())
}

/// Insert-path-only validation; an already-known business still gets its
/// update even when, say, the scraped phone is truncated this time around.
fn validate_insert(record: &ContractorRecord, policy: &SourcePolicy) -> Result<(), SkipReason> {
    if let Some(min) = policy.min_phone_digits {
        let got = record
            .phone
            .as_deref()
            .map(phone_digit_count)
            .unwrap_or(0);
        if got < min {
            return Err(SkipReason::PhoneTooShort { got, min });
        }
    }
    Ok(())
}

/// Apply one normalized record against the store.
///
/// Found by dedup key → merge mutable fields (provenance, email, and the
/// creation timestamp are structurally excluded from the update). Not found →
/// validate, synthesize an email if the record has none, create the
/// user+contractor aggregate. Store errors are caught here and surfaced as a
/// skip so one bad record never aborts the batch.
pub async fn upsert_record(
    store: &dyn ContractorStore,
    record: ContractorRecord,
    policy: &SourcePolicy,
) -> UpsertOutcome {
    if let Err(reason) = gate(&record, policy) {
        return UpsertOutcome::Skipped(reason);
    }

    let key = DedupKey::from_record(&record);
    let existing = match store.find_by_dedup_key(&key).await {
        Ok(existing) => existing,
        Err(err) => return UpsertOutcome::Skipped(SkipReason::Persistence(err.to_string())),
    };

    match existing {
        Some(found) => {
            let update = ContractorUpdate::from_record(&record);
            match store.apply_update(found.id, update).await {
                Ok(()) => UpsertOutcome::Updated,
                Err(err) => UpsertOutcome::Skipped(SkipReason::Persistence(err.to_string())),
            }
        }
        None => {
            if let Err(reason) = validate_insert(&record, policy) {
                return UpsertOutcome::Skipped(reason);
            }
            let user_email = record
                .email
                .clone()
                .unwrap_or_else(|| synthetic_email(&record.business_name, Utc::now()));
            let portfolio_title = policy
                .seed_portfolio
                .then(|| record.business_name.clone());
            let new = NewContractor {
                user_email,
                record,
                portfolio_title,
            };
            match store.create_contractor_aggregate(new).await {
                Ok(_) => UpsertOutcome::Imported,
                Err(err) => UpsertOutcome::Skipped(SkipReason::Persistence(err.to_string())),
            }
        }
    }
}
