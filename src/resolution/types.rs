//! Candidate and outcome types for Level 2 resolution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registry entity status. GLEIF reports ACTIVE/INACTIVE/NULL; anything
/// else is preserved verbatim so ranking stays auditable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityStatus {
    Active,
    Inactive,
    Null,
    #[serde(untagged)]
    Other(String),
}

impl EntityStatus {
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            Some("ACTIVE") => Self::Active,
            Some("INACTIVE") => Self::Inactive,
            Some("NULL") | None => Self::Null,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headquarters {
    pub country: Option<String>,
    pub city: Option<String>,
}

/// Canonical candidate shape produced by the normalizer.
///
/// Never mutated after normalization; scoring layers a
/// `ScoredCandidate` on top instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GleifCandidate {
    pub lei_code: String,
    pub legal_name: String,
    pub jurisdiction: Option<String>,
    pub entity_status: EntityStatus,
    pub legal_form: Option<String>,
    pub entity_category: Option<String>,
    pub registration_status: Option<String>,
    pub headquarters: Headquarters,
    /// Ordered as returned by the registry.
    pub other_names: Vec<String>,
    /// Parent LEI discovered from the hit's relationship links, if any.
    pub direct_parent_lei: Option<String>,
}

/// Which name the scoring engine matched candidates against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Level 1 extracted name was available
    ExtractedName,
    /// Fell back to a name derived from the domain itself
    DomainDerived,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractedName => "extracted_name",
            Self::DomainDerived => "domain_derived",
        }
    }
}

/// A candidate with its component scores, composite score and rank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: GleifCandidate,
    pub name_match_score: f64,
    pub domain_tld_score: f64,
    pub fortune500_score: f64,
    pub entity_complexity_score: f64,
    pub weighted_score: f64,
    /// 1-based rank by weighted score descending.
    pub rank_position: usize,
    pub is_primary_selection: bool,
    pub selection_reason: Option<String>,
    pub match_method: MatchMethod,
}

impl ScoredCandidate {
    pub fn lei(&self) -> &str {
        &self.candidate.lei_code
    }
}

/// Terminal status of one Level 2 attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Exactly one primary selection exists.
    Success,
    /// Pipeline failed or produced no candidates.
    Failed,
    /// Ranked candidates retained, awaiting manual review.
    CandidatesFound,
    /// Gate declined the domain; Level 2 never ran.
    NotAttempted,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::CandidatesFound => "candidates_found",
            Self::NotAttempted => "not_attempted",
        }
    }
}

/// Immutable record of one Level 2 attempt for a domain.
///
/// Attempts are versioned, never overwritten: a retry creates a new
/// outcome with `attempt` advanced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level2Outcome {
    pub id: Uuid,
    pub domain: String,
    /// 1-based attempt counter across the domain's recorded outcomes.
    pub attempt: u32,
    pub status: OutcomeStatus,
    /// Rank order; at most one candidate has `is_primary_selection`.
    pub candidates: Vec<ScoredCandidate>,
    pub primary_lei_code: Option<String>,
    pub processing_time_ms: u64,
    /// Registry lookup attempts consumed (retries included).
    pub lookup_attempts: u32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Level2Outcome {
    pub fn primary(&self) -> Option<&ScoredCandidate> {
        self.candidates.iter().find(|c| c.is_primary_selection)
    }

    /// Invariant check: status and primary-selection agree.
    pub fn is_consistent(&self) -> bool {
        let primaries = self
            .candidates
            .iter()
            .filter(|c| c.is_primary_selection)
            .count();
        match self.status {
            OutcomeStatus::Success => primaries == 1,
            OutcomeStatus::CandidatesFound => primaries == 0,
            OutcomeStatus::Failed | OutcomeStatus::NotAttempted => primaries == 0,
        }
    }
}
