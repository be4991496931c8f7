//! Postgres-backed knowledge base and outcome stores
//!
//! Increment-or-raise semantics live in the SQL: `ON CONFLICT ... DO
//! UPDATE` with `frequency + 1` and `GREATEST(confidence, EXCLUDED...)`
//! makes each update atomic against the stored row, so concurrent
//! pipelines never blind-overwrite each other.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE entity_mappings (
//!     domain TEXT NOT NULL,
//!     lei_code TEXT NOT NULL,
//!     mapping_confidence DOUBLE PRECISION NOT NULL,
//!     discovery_method TEXT NOT NULL,
//!     first_mapped TIMESTAMPTZ NOT NULL,
//!     last_confirmed TIMESTAMPTZ NOT NULL,
//!     mapping_frequency INTEGER NOT NULL,
//!     PRIMARY KEY (domain, lei_code)
//! );
//! CREATE TABLE entity_relationships (
//!     parent_lei TEXT NOT NULL,
//!     child_lei TEXT NOT NULL,
//!     relationship_type TEXT NOT NULL,
//!     ownership_percentage DOUBLE PRECISION,
//!     relationship_confidence DOUBLE PRECISION NOT NULL,
//!     PRIMARY KEY (parent_lei, child_lei, relationship_type)
//! );
//! CREATE TABLE level2_outcomes (
//!     id UUID PRIMARY KEY,
//!     domain TEXT NOT NULL,
//!     attempt INTEGER NOT NULL,
//!     status TEXT NOT NULL,
//!     payload JSONB NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    EntityContext, EntityMapping, KnowledgeSnapshot, KnowledgeStore, OutcomeStore,
};
use crate::error::StorageUnavailableError;
use crate::resolution::types::Level2Outcome;

pub struct PgKnowledgeStore {
    pool: Arc<PgPool>,
}

impl PgKnowledgeStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KnowledgeStore for PgKnowledgeStore {
    async fn record_mapping(
        &self,
        domain: &str,
        lei: &str,
        confidence: f64,
        method: &str,
    ) -> Result<EntityMapping, StorageUnavailableError> {
        let row = sqlx::query(
            r#"
            INSERT INTO entity_mappings
                (domain, lei_code, mapping_confidence, discovery_method,
                 first_mapped, last_confirmed, mapping_frequency)
            VALUES ($1, $2, $3, $4, NOW(), NOW(), 1)
            ON CONFLICT (domain, lei_code) DO UPDATE SET
                mapping_frequency = entity_mappings.mapping_frequency + 1,
                last_confirmed = NOW(),
                mapping_confidence = GREATEST(entity_mappings.mapping_confidence, EXCLUDED.mapping_confidence),
                discovery_method = CASE
                    WHEN EXCLUDED.mapping_confidence > entity_mappings.mapping_confidence
                    THEN EXCLUDED.discovery_method
                    ELSE entity_mappings.discovery_method
                END
            RETURNING domain, lei_code, mapping_confidence, discovery_method,
                      first_mapped, last_confirmed, mapping_frequency
            "#,
        )
        .bind(domain)
        .bind(lei)
        .bind(confidence)
        .bind(method)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StorageUnavailableError::backend("record_mapping", e))?;

        Ok(EntityMapping {
            domain: row.get("domain"),
            lei_code: row.get("lei_code"),
            mapping_confidence: row.get("mapping_confidence"),
            discovery_method: row.get("discovery_method"),
            first_mapped: row.get::<DateTime<Utc>, _>("first_mapped"),
            last_confirmed: row.get::<DateTime<Utc>, _>("last_confirmed"),
            mapping_frequency: row.get::<i32, _>("mapping_frequency") as u32,
        })
    }

    async fn record_relationship(
        &self,
        parent_lei: &str,
        child_lei: &str,
        relationship_type: &str,
        confidence: f64,
    ) -> Result<(), StorageUnavailableError> {
        sqlx::query(
            r#"
            INSERT INTO entity_relationships
                (parent_lei, child_lei, relationship_type, relationship_confidence)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (parent_lei, child_lei, relationship_type) DO UPDATE SET
                relationship_confidence = GREATEST(
                    entity_relationships.relationship_confidence,
                    EXCLUDED.relationship_confidence)
            "#,
        )
        .bind(parent_lei)
        .bind(child_lei)
        .bind(relationship_type)
        .bind(confidence)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageUnavailableError::backend("record_relationship", e))?;

        Ok(())
    }

    async fn entity_frequency(&self, lei: &str) -> Result<u32, StorageUnavailableError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT domain) FROM entity_mappings WHERE lei_code = $1",
        )
        .bind(lei)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StorageUnavailableError::backend("entity_frequency", e))?;

        Ok(count as u32)
    }

    async fn snapshot(
        &self,
        leis: &[String],
    ) -> Result<KnowledgeSnapshot, StorageUnavailableError> {
        let rows = sqlx::query(
            r#"
            SELECT m.lei_code,
                   COUNT(DISTINCT m.domain) AS frequency,
                   EXISTS (
                       SELECT 1 FROM entity_relationships r
                       WHERE r.parent_lei = m.lei_code OR r.child_lei = m.lei_code
                   ) AS has_relationships
            FROM entity_mappings m
            WHERE m.lei_code = ANY($1)
            GROUP BY m.lei_code
            "#,
        )
        .bind(leis)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| StorageUnavailableError::backend("snapshot", e))?;

        let mut entries = std::collections::HashMap::new();
        for row in rows {
            entries.insert(
                row.get::<String, _>("lei_code"),
                EntityContext {
                    frequency: row.get::<i64, _>("frequency") as u32,
                    has_relationships: row.get("has_relationships"),
                },
            );
        }

        Ok(KnowledgeSnapshot::new(entries))
    }
}

pub struct PgOutcomeStore {
    pool: Arc<PgPool>,
}

impl PgOutcomeStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutcomeStore for PgOutcomeStore {
    async fn record_outcome(
        &self,
        outcome: &Level2Outcome,
    ) -> Result<(), StorageUnavailableError> {
        let payload = serde_json::to_value(outcome)
            .map_err(|e| StorageUnavailableError::backend("record_outcome", e))?;

        sqlx::query(
            r#"
            INSERT INTO level2_outcomes (id, domain, attempt, status, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(outcome.id)
        .bind(&outcome.domain)
        .bind(outcome.attempt as i32)
        .bind(outcome.status.as_str())
        .bind(payload)
        .bind(outcome.created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageUnavailableError::backend("record_outcome", e))?;

        Ok(())
    }

    async fn fetch_outcome(
        &self,
        id: Uuid,
    ) -> Result<Option<Level2Outcome>, StorageUnavailableError> {
        let payload: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT payload FROM level2_outcomes WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool.as_ref())
                .await
                .map_err(|e| StorageUnavailableError::backend("fetch_outcome", e))?;

        payload
            .map(|p| serde_json::from_value(p))
            .transpose()
            .map_err(|e| StorageUnavailableError::backend("fetch_outcome", e))
    }

    async fn update_outcome(
        &self,
        outcome: &Level2Outcome,
    ) -> Result<(), StorageUnavailableError> {
        let payload = serde_json::to_value(outcome)
            .map_err(|e| StorageUnavailableError::backend("update_outcome", e))?;

        sqlx::query(
            "UPDATE level2_outcomes SET status = $2, payload = $3 WHERE id = $1",
        )
        .bind(outcome.id)
        .bind(outcome.status.as_str())
        .bind(payload)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageUnavailableError::backend("update_outcome", e))?;

        Ok(())
    }

    async fn attempt_count(&self, domain: &str) -> Result<u32, StorageUnavailableError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM level2_outcomes WHERE domain = $1")
                .bind(domain)
                .fetch_one(self.pool.as_ref())
                .await
                .map_err(|e| StorageUnavailableError::backend("attempt_count", e))?;

        Ok(count as u32)
    }
}
