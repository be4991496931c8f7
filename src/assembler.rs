//! Business-intelligence record assembly
//!
//! Merges a Level 1 result, a Level 2 outcome and knowledge-base
//! context into the final export unit. The record is a projection,
//! regenerated on demand, never the system of record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::knowledge::KnowledgeSnapshot;
use crate::level1::{FailureCategory, Level1Result};
use crate::resolution::types::{Level2Outcome, OutcomeStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionReadiness {
    /// Primary legal entity verified via the registry
    Verified,
    /// Candidates on file, awaiting a manual decision
    PendingReview,
    /// No trustworthy entity resolution yet
    Unverified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalAccessibility {
    /// Content extraction worked normally
    Accessible,
    /// Bot walls / auth gates in the way
    Restricted,
    /// Fetch itself failed
    Inaccessible,
    /// Content reachable but yielded weak signal
    Limited,
}

/// The assembled export unit for one domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessIntelligenceRecord {
    pub domain: String,
    pub level1: Level1Result,
    pub level2_status: OutcomeStatus,
    pub primary_lei_code: Option<String>,
    pub primary_legal_name: Option<String>,
    pub candidate_count: usize,
    pub business_priority: BusinessPriority,
    pub acquisition_readiness: AcquisitionReadiness,
    pub technical_accessibility: TechnicalAccessibility,
    /// Fraction of defined optional fields that are populated, 0–1.
    pub data_completeness: f64,
    /// 0–100 blend of Level 1 confidence, completeness and Level 2 status.
    pub quality_score: f64,
    /// Distinct domains the primary entity is known from (KB context).
    pub entity_frequency: u32,
    pub assembled_at: DateTime<Utc>,
}

fn status_points(status: OutcomeStatus) -> f64 {
    match status {
        OutcomeStatus::Success => 100.0,
        OutcomeStatus::CandidatesFound => 60.0,
        OutcomeStatus::Failed => 20.0,
        OutcomeStatus::NotAttempted => 0.0,
    }
}

fn accessibility(level1: &Level1Result) -> TechnicalAccessibility {
    if level1.protected || level1.failure_category == Some(FailureCategory::Protected) {
        return TechnicalAccessibility::Restricted;
    }
    match level1.failure_category {
        Some(FailureCategory::FetchError) => TechnicalAccessibility::Inaccessible,
        Some(_) => TechnicalAccessibility::Limited,
        None if level1.extraction_method.succeeded() => TechnicalAccessibility::Accessible,
        None => TechnicalAccessibility::Limited,
    }
}

/// Completeness is the populated fraction of the record's defined
/// optional fields, spanning both levels.
fn completeness(level1: &Level1Result, outcome: &Level2Outcome) -> f64 {
    let primary = outcome.primary();
    let fields: [bool; 6] = [
        level1.extracted_name.is_some(),
        !level1.geographic_markers.is_empty(),
        outcome.primary_lei_code.is_some(),
        !outcome.candidates.is_empty(),
        primary.map(|p| p.candidate.jurisdiction.is_some()).unwrap_or(false),
        primary
            .map(|p| p.candidate.headquarters.country.is_some())
            .unwrap_or(false),
    ];
    let populated = fields.iter().filter(|f| **f).count();
    populated as f64 / fields.len() as f64
}

/// Assemble the export record for one domain.
pub fn assemble_record(
    level1: &Level1Result,
    outcome: &Level2Outcome,
    kb: &KnowledgeSnapshot,
) -> BusinessIntelligenceRecord {
    let primary = outcome.primary();
    let data_completeness = completeness(level1, outcome);
    let quality_score = 0.4 * level1.confidence as f64
        + 0.3 * (data_completeness * 100.0)
        + 0.3 * status_points(outcome.status);

    let business_priority = if quality_score >= 80.0
        || primary.map(|p| p.fortune500_score >= 100.0).unwrap_or(false)
    {
        BusinessPriority::High
    } else if quality_score >= 50.0 {
        BusinessPriority::Medium
    } else {
        BusinessPriority::Low
    };

    let acquisition_readiness = match outcome.status {
        OutcomeStatus::Success => AcquisitionReadiness::Verified,
        OutcomeStatus::CandidatesFound => AcquisitionReadiness::PendingReview,
        OutcomeStatus::Failed | OutcomeStatus::NotAttempted => AcquisitionReadiness::Unverified,
    };

    let entity_frequency = primary.map(|p| kb.frequency(p.lei())).unwrap_or(0);

    BusinessIntelligenceRecord {
        domain: level1.domain.clone(),
        level1: level1.clone(),
        level2_status: outcome.status,
        primary_lei_code: outcome.primary_lei_code.clone(),
        primary_legal_name: primary.map(|p| p.candidate.legal_name.clone()),
        candidate_count: outcome.candidates.len(),
        business_priority,
        acquisition_readiness,
        technical_accessibility: accessibility(level1),
        data_completeness,
        quality_score: quality_score.clamp(0.0, 100.0),
        entity_frequency,
        assembled_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level1::ExtractionMethod;
    use crate::resolution::types::{
        EntityStatus, GleifCandidate, Headquarters, MatchMethod, ScoredCandidate,
    };
    use uuid::Uuid;

    fn level1(confidence: u8) -> Level1Result {
        Level1Result {
            domain: "apple.com".into(),
            extracted_name: Some("Apple".into()),
            extraction_method: ExtractionMethod::MetaTag,
            confidence,
            failure_category: None,
            geographic_markers: ["US".to_string()].into_iter().collect(),
            protected: false,
        }
    }

    fn success_outcome() -> Level2Outcome {
        let candidate = ScoredCandidate {
            candidate: GleifCandidate {
                lei_code: "HWUPKR0MPOU8FGXBT394".into(),
                legal_name: "Apple Inc.".into(),
                jurisdiction: Some("US".into()),
                entity_status: EntityStatus::Active,
                legal_form: Some("XTIQ".into()),
                entity_category: Some("GENERAL".into()),
                registration_status: Some("ISSUED".into()),
                headquarters: Headquarters {
                    country: Some("US".into()),
                    city: Some("Cupertino".into()),
                },
                other_names: vec![],
                direct_parent_lei: None,
            },
            name_match_score: 98.0,
            domain_tld_score: 50.0,
            fortune500_score: 100.0,
            entity_complexity_score: 50.0,
            weighted_score: 81.7,
            rank_position: 1,
            is_primary_selection: true,
            selection_reason: Some("auto-high-confidence".into()),
            match_method: MatchMethod::ExtractedName,
        };
        Level2Outcome {
            id: Uuid::new_v4(),
            domain: "apple.com".into(),
            attempt: 1,
            status: OutcomeStatus::Success,
            primary_lei_code: Some(candidate.candidate.lei_code.clone()),
            candidates: vec![candidate],
            processing_time_ms: 42,
            lookup_attempts: 1,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    fn failed_outcome() -> Level2Outcome {
        Level2Outcome {
            id: Uuid::new_v4(),
            domain: "apple.com".into(),
            attempt: 1,
            status: OutcomeStatus::Failed,
            candidates: vec![],
            primary_lei_code: None,
            processing_time_ms: 10,
            lookup_attempts: 3,
            error_message: Some("no_candidates".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_verified_record_is_high_priority() {
        let record = assemble_record(&level1(85), &success_outcome(), &KnowledgeSnapshot::empty());

        assert_eq!(record.acquisition_readiness, AcquisitionReadiness::Verified);
        assert_eq!(record.business_priority, BusinessPriority::High);
        assert_eq!(record.data_completeness, 1.0);
        assert_eq!(record.primary_legal_name.as_deref(), Some("Apple Inc."));
        assert!(record.quality_score >= 80.0);
    }

    #[test]
    fn test_failed_outcome_downgrades_record() {
        let record = assemble_record(&level1(30), &failed_outcome(), &KnowledgeSnapshot::empty());

        assert_eq!(record.acquisition_readiness, AcquisitionReadiness::Unverified);
        assert_eq!(record.business_priority, BusinessPriority::Low);
        assert!(record.data_completeness < 0.5);
        assert!(record.quality_score < 50.0);
    }

    #[test]
    fn test_protected_site_is_restricted() {
        let mut l1 = level1(50);
        l1.protected = true;
        let record = assemble_record(&l1, &failed_outcome(), &KnowledgeSnapshot::empty());
        assert_eq!(
            record.technical_accessibility,
            TechnicalAccessibility::Restricted
        );
    }

    #[test]
    fn test_entity_frequency_from_kb_context() {
        let outcome = success_outcome();
        let mut entries = std::collections::HashMap::new();
        entries.insert(
            "HWUPKR0MPOU8FGXBT394".to_string(),
            crate::knowledge::EntityContext {
                frequency: 3,
                has_relationships: false,
            },
        );
        let record = assemble_record(&level1(85), &outcome, &KnowledgeSnapshot::new(entries));
        assert_eq!(record.entity_frequency, 3);
    }
}
