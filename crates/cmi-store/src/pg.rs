//! Postgres-backed contractor store.
//!
//! Runtime `sqlx::query` calls rather than compile-time checked macros so the
//! crate builds without a live database. Schema lives in `migrations/` and is
//! embedded with `sqlx::migrate!`.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cmi_core::{ContractorRecord, StoredContractor};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{ContractorStore, ContractorUpdate, DedupKey, NewContractor, StoreError};

#[derive(Debug, Clone)]
pub struct PgContractorStore {
    pool: PgPool,
}

impl PgContractorStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("connecting to postgres")?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .context("running migrations")
    }
}

const CONTRACTOR_COLUMNS: &str = "id, user_id, business_name, license_number, license_status, \
     phone, email, address, city, state, zip_code, specialties, rating, review_count, website, \
     source, created_at, updated_at";

fn row_to_stored(row: &PgRow) -> Result<StoredContractor, StoreError> {
    let specialties_json: serde_json::Value = row.try_get("specialties")?;
    let specialties: Vec<String> = serde_json::from_value(specialties_json)
        .map_err(|e| StoreError::Message(format!("malformed specialties column: {e}")))?;

    Ok(StoredContractor {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        record: ContractorRecord {
            business_name: row.try_get("business_name")?,
            license_number: row.try_get("license_number")?,
            license_status: row.try_get("license_status")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            zip_code: row.try_get("zip_code")?,
            specialties,
            rating: row.try_get("rating")?,
            review_count: row.try_get("review_count")?,
            website: row.try_get("website")?,
            source: row.try_get("source")?,
        },
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[async_trait]
impl ContractorStore for PgContractorStore {
    async fn find_by_dedup_key(
        &self,
        key: &DedupKey,
    ) -> Result<Option<StoredContractor>, StoreError> {
        let sql = format!(
            "SELECT {CONTRACTOR_COLUMNS} FROM contractors \
             WHERE business_name = $1 \
                OR ($2::text IS NOT NULL AND phone = $2) \
                OR ($3::text IS NOT NULL AND email = $3) \
             ORDER BY (business_name = $1) DESC, created_at ASC \
             LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(&key.business_name)
            .bind(&key.phone)
            .bind(&key.email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_stored).transpose()
    }

    async fn create_contractor_aggregate(
        &self,
        new: NewContractor,
    ) -> Result<StoredContractor, StoreError> {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let contractor_id = Uuid::new_v4();
        let specialties = serde_json::to_value(&new.record.specialties)
            .map_err(|e| StoreError::Message(format!("serializing specialties: {e}")))?;

        // One transaction: a failure between the user insert and the
        // contractor insert must not leave an orphan user row.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (id, email, name, role, created_at) \
             VALUES ($1, $2, $3, 'CONTRACTOR', $4)",
        )
        .bind(user_id)
        .bind(&new.user_email)
        .bind(&new.record.business_name)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO contractors (id, user_id, business_name, license_number, \
             license_status, phone, email, address, city, state, zip_code, specialties, \
             rating, review_count, website, source, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $17)",
        )
        .bind(contractor_id)
        .bind(user_id)
        .bind(&new.record.business_name)
        .bind(&new.record.license_number)
        .bind(&new.record.license_status)
        .bind(&new.record.phone)
        .bind(&new.user_email)
        .bind(&new.record.address)
        .bind(&new.record.city)
        .bind(&new.record.state)
        .bind(&new.record.zip_code)
        .bind(&specialties)
        .bind(new.record.rating)
        .bind(new.record.review_count)
        .bind(&new.record.website)
        .bind(&new.record.source)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if let Some(title) = &new.portfolio_title {
            sqlx::query(
                "INSERT INTO portfolios (id, contractor_id, title, created_at) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(contractor_id)
            .bind(title)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let mut record = new.record;
        record.email = Some(new.user_email);
        Ok(StoredContractor {
            id: contractor_id,
            user_id,
            record,
            created_at: now,
            updated_at: now,
        })
    }

    async fn apply_update(
        &self,
        contractor_id: Uuid,
        update: ContractorUpdate,
    ) -> Result<(), StoreError> {
        let specialties = serde_json::to_value(&update.specialties)
            .map_err(|e| StoreError::Message(format!("serializing specialties: {e}")))?;

        let result = sqlx::query(
            "UPDATE contractors SET license_number = $2, license_status = $3, phone = $4, \
             address = $5, city = $6, state = $7, zip_code = $8, specialties = $9, \
             rating = $10, review_count = $11, website = $12, updated_at = $13 \
             WHERE id = $1",
        )
        .bind(contractor_id)
        .bind(&update.license_number)
        .bind(&update.license_status)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(&update.city)
        .bind(&update.state)
        .bind(&update.zip_code)
        .bind(&specialties)
        .bind(update.rating)
        .bind(update.review_count)
        .bind(&update.website)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Message(format!(
                "no contractor with id {contractor_id}"
            )));
        }
        Ok(())
    }

    async fn contractor_count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM contractors")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }
}
