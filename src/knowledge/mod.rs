//! Knowledge base accumulation
//!
//! Cross-domain state that feeds back into scoring: entity mapping
//! history (domain ↔ LEI), discovered corporate relationships, and the
//! per-entity frequency counts behind the entity-complexity score.
//!
//! Writes are monotonic: frequencies only increment, confidence only
//! rises, and relationships are append-only. Scoring reads a
//! `KnowledgeSnapshot` taken before the scoring pass; writes happen in
//! one deferred step after selection, so a single domain's pipeline
//! never interleaves reads with its own writes.

pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageUnavailableError;
use crate::resolution::types::Level2Outcome;

pub use memory::{InMemoryKnowledgeStore, InMemoryOutcomeStore};
#[cfg(feature = "database")]
pub use postgres::{PgKnowledgeStore, PgOutcomeStore};

/// Accumulated mapping of one (domain, LEI) pair.
///
/// Created on first successful mapping; rediscovery increments the
/// frequency and advances the confirmation date. Frequency and
/// confidence never decrease.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMapping {
    pub lei_code: String,
    pub domain: String,
    /// 0–1 scale; raised only when a stronger attempt comes in.
    pub mapping_confidence: f64,
    pub discovery_method: String,
    pub first_mapped: DateTime<Utc>,
    pub last_confirmed: DateTime<Utc>,
    pub mapping_frequency: u32,
}

/// Discovered parent/child relationship, deduplicated by
/// (parent, child, type) with confidence kept at the max seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRelationship {
    pub parent_lei: String,
    pub child_lei: String,
    pub relationship_type: String,
    pub ownership_percentage: Option<f64>,
    pub relationship_confidence: f64,
}

/// Per-entity context inside a snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityContext {
    /// Distinct domains this entity has been mapped to.
    pub frequency: u32,
    /// Whether any parent/child relationship is on record.
    pub has_relationships: bool,
}

/// Consistent read of knowledge-base state for one scoring pass.
///
/// Scoring only ever sees a snapshot; the live store is not consulted
/// mid-pass, which keeps scoring deterministic for a fixed snapshot.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeSnapshot {
    entries: HashMap<String, EntityContext>,
}

impl KnowledgeSnapshot {
    pub fn new(entries: HashMap<String, EntityContext>) -> Self {
        Self { entries }
    }

    /// Empty snapshot; every entity scores as unseen.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn context(&self, lei: &str) -> EntityContext {
        self.entries.get(lei).copied().unwrap_or_default()
    }

    pub fn frequency(&self, lei: &str) -> u32 {
        self.context(lei).frequency
    }
}

/// Knowledge-base accumulation operations.
///
/// Updates are commutative (increment / max), so concurrent writers
/// from parallel domain pipelines need no ordering; each implementation
/// must make the read-modify-write atomic rather than blindly
/// overwriting.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Upsert by (domain, LEI): increment frequency, advance
    /// last-confirmed, raise confidence only if higher.
    async fn record_mapping(
        &self,
        domain: &str,
        lei: &str,
        confidence: f64,
        method: &str,
    ) -> Result<EntityMapping, StorageUnavailableError>;

    /// Upsert by (parent, child, type), keeping max confidence.
    async fn record_relationship(
        &self,
        parent_lei: &str,
        child_lei: &str,
        relationship_type: &str,
        confidence: f64,
    ) -> Result<(), StorageUnavailableError>;

    /// Read used by the scoring engine's entity-complexity term.
    async fn entity_frequency(&self, lei: &str) -> Result<u32, StorageUnavailableError>;

    /// Consistent snapshot of context for the given entities.
    async fn snapshot(&self, leis: &[String]) -> Result<KnowledgeSnapshot, StorageUnavailableError>;
}

/// Versioned persistence of Level 2 attempts.
#[async_trait]
pub trait OutcomeStore: Send + Sync {
    /// Append a new attempt; outcomes are never overwritten here.
    async fn record_outcome(&self, outcome: &Level2Outcome)
        -> Result<(), StorageUnavailableError>;

    async fn fetch_outcome(
        &self,
        id: Uuid,
    ) -> Result<Option<Level2Outcome>, StorageUnavailableError>;

    /// Persist a manual-review resolution of an existing outcome.
    async fn update_outcome(&self, outcome: &Level2Outcome)
        -> Result<(), StorageUnavailableError>;

    /// Number of attempts already recorded for a domain.
    async fn attempt_count(&self, domain: &str) -> Result<u32, StorageUnavailableError>;
}
