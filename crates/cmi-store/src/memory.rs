//! In-memory store for tests and `--dry-run` imports.
//!
//! Mirrors the Postgres store's dedup semantics (name match first, then
//! phone, then email) and enforces the unique-email constraint so conflict
//! handling is exercisable without a database.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use cmi_core::StoredContractor;
use uuid::Uuid;

use crate::{ContractorStore, ContractorUpdate, DedupKey, NewContractor, StoreError};

#[derive(Debug, Default)]
pub struct MemoryContractorStore {
    inner: Mutex<Vec<StoredContractor>>,
}

impl MemoryContractorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything persisted so far, for assertions.
    pub fn all(&self) -> Vec<StoredContractor> {
        self.inner.lock().expect("store lock poisoned").clone()
    }
}

#[async_trait]
impl ContractorStore for MemoryContractorStore {
    async fn find_by_dedup_key(
        &self,
        key: &DedupKey,
    ) -> Result<Option<StoredContractor>, StoreError> {
        let list = self.inner.lock().expect("store lock poisoned");
        let by_name = list
            .iter()
            .find(|c| c.record.business_name == key.business_name);
        let by_phone = key
            .phone
            .as_deref()
            .and_then(|p| list.iter().find(|c| c.record.phone.as_deref() == Some(p)));
        let by_email = key
            .email
            .as_deref()
            .and_then(|e| list.iter().find(|c| c.record.email.as_deref() == Some(e)));
        Ok(by_name.or(by_phone).or(by_email).cloned())
    }

    async fn create_contractor_aggregate(
        &self,
        new: NewContractor,
    ) -> Result<StoredContractor, StoreError> {
        let mut list = self.inner.lock().expect("store lock poisoned");
        if list
            .iter()
            .any(|c| c.record.email.as_deref() == Some(new.user_email.as_str()))
        {
            return Err(StoreError::Message(format!(
                "unique constraint violation on users.email: {}",
                new.user_email
            )));
        }

        let now = Utc::now();
        let mut record = new.record;
        record.email = Some(new.user_email);
        let stored = StoredContractor {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            record,
            created_at: now,
            updated_at: now,
        };
        list.push(stored.clone());
        Ok(stored)
    }

    async fn apply_update(
        &self,
        contractor_id: Uuid,
        update: ContractorUpdate,
    ) -> Result<(), StoreError> {
        let mut list = self.inner.lock().expect("store lock poisoned");
        let Some(existing) = list.iter_mut().find(|c| c.id == contractor_id) else {
            return Err(StoreError::Message(format!(
                "no contractor with id {contractor_id}"
            )));
        };
        existing.record.license_number = update.license_number;
        existing.record.license_status = update.license_status;
        existing.record.phone = update.phone;
        existing.record.address = update.address;
        existing.record.city = update.city;
        existing.record.state = update.state;
        existing.record.zip_code = update.zip_code;
        existing.record.specialties = update.specialties;
        existing.record.rating = update.rating;
        existing.record.review_count = update.review_count;
        existing.record.website = update.website;
        existing.updated_at = Utc::now();
        Ok(())
    }

    async fn contractor_count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().expect("store lock poisoned").len() as u64)
    }
}
