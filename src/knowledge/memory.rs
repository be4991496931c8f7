//! In-memory knowledge base and outcome stores
//!
//! Default backing for tests and single-process deployments. Each
//! update takes the write lock for the whole read-modify-write, so
//! increment-or-raise is atomic with respect to concurrent pipelines.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    EntityContext, EntityMapping, EntityRelationship, KnowledgeSnapshot, KnowledgeStore,
    OutcomeStore,
};
use crate::error::StorageUnavailableError;
use crate::resolution::types::Level2Outcome;

#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    mappings: RwLock<HashMap<(String, String), EntityMapping>>,
    relationships: RwLock<HashMap<(String, String, String), EntityRelationship>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all mappings, test/diagnostics use.
    pub async fn mappings(&self) -> Vec<EntityMapping> {
        self.mappings.read().await.values().cloned().collect()
    }

    pub async fn relationships(&self) -> Vec<EntityRelationship> {
        self.relationships.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn record_mapping(
        &self,
        domain: &str,
        lei: &str,
        confidence: f64,
        method: &str,
    ) -> Result<EntityMapping, StorageUnavailableError> {
        let mut mappings = self.mappings.write().await;
        let now = Utc::now();
        let key = (domain.to_string(), lei.to_string());

        let entry = mappings
            .entry(key)
            .and_modify(|m| {
                m.mapping_frequency += 1;
                m.last_confirmed = now;
                // A weaker attempt never lowers accumulated confidence
                if confidence > m.mapping_confidence {
                    m.mapping_confidence = confidence;
                    m.discovery_method = method.to_string();
                }
            })
            .or_insert_with(|| EntityMapping {
                lei_code: lei.to_string(),
                domain: domain.to_string(),
                mapping_confidence: confidence,
                discovery_method: method.to_string(),
                first_mapped: now,
                last_confirmed: now,
                mapping_frequency: 1,
            });

        Ok(entry.clone())
    }

    async fn record_relationship(
        &self,
        parent_lei: &str,
        child_lei: &str,
        relationship_type: &str,
        confidence: f64,
    ) -> Result<(), StorageUnavailableError> {
        let mut relationships = self.relationships.write().await;
        let key = (
            parent_lei.to_string(),
            child_lei.to_string(),
            relationship_type.to_string(),
        );

        relationships
            .entry(key)
            .and_modify(|r| {
                if confidence > r.relationship_confidence {
                    r.relationship_confidence = confidence;
                }
            })
            .or_insert_with(|| EntityRelationship {
                parent_lei: parent_lei.to_string(),
                child_lei: child_lei.to_string(),
                relationship_type: relationship_type.to_string(),
                ownership_percentage: None,
                relationship_confidence: confidence,
            });

        Ok(())
    }

    async fn entity_frequency(&self, lei: &str) -> Result<u32, StorageUnavailableError> {
        let mappings = self.mappings.read().await;
        Ok(mappings.keys().filter(|(_, l)| l == lei).count() as u32)
    }

    async fn snapshot(
        &self,
        leis: &[String],
    ) -> Result<KnowledgeSnapshot, StorageUnavailableError> {
        let mappings = self.mappings.read().await;
        let relationships = self.relationships.read().await;

        let mut entries = HashMap::new();
        for lei in leis {
            let frequency = mappings.keys().filter(|(_, l)| l == lei).count() as u32;
            let has_relationships = relationships
                .keys()
                .any(|(p, c, _)| p == lei || c == lei);
            entries.insert(
                lei.clone(),
                EntityContext {
                    frequency,
                    has_relationships,
                },
            );
        }

        Ok(KnowledgeSnapshot::new(entries))
    }
}

#[derive(Default)]
pub struct InMemoryOutcomeStore {
    outcomes: RwLock<HashMap<Uuid, Level2Outcome>>,
}

impl InMemoryOutcomeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OutcomeStore for InMemoryOutcomeStore {
    async fn record_outcome(
        &self,
        outcome: &Level2Outcome,
    ) -> Result<(), StorageUnavailableError> {
        let mut outcomes = self.outcomes.write().await;
        outcomes.insert(outcome.id, outcome.clone());
        Ok(())
    }

    async fn fetch_outcome(
        &self,
        id: Uuid,
    ) -> Result<Option<Level2Outcome>, StorageUnavailableError> {
        let outcomes = self.outcomes.read().await;
        Ok(outcomes.get(&id).cloned())
    }

    async fn update_outcome(
        &self,
        outcome: &Level2Outcome,
    ) -> Result<(), StorageUnavailableError> {
        let mut outcomes = self.outcomes.write().await;
        outcomes.insert(outcome.id, outcome.clone());
        Ok(())
    }

    async fn attempt_count(&self, domain: &str) -> Result<u32, StorageUnavailableError> {
        let outcomes = self.outcomes.read().await;
        Ok(outcomes.values().filter(|o| o.domain == domain).count() as u32)
    }
}
