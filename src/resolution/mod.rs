//! Level 2 entity resolution
//!
//! The core pipeline: eligibility gating, candidate normalization,
//! weighted scoring, primary selection, and the orchestrator that
//! sequences them per domain. Scoring and selection are pure and
//! synchronous; only the registry lookup and store access suspend.

pub mod eligibility;
pub mod normalize;
pub mod orchestrator;
pub mod scoring;
pub mod selection;
pub mod types;

pub use eligibility::{evaluate_eligibility, EligibilityDecision, EligibilityReason};
pub use normalize::{normalize_candidates, normalize_entity_text, NormalizedBatch};
pub use orchestrator::Level2Resolver;
pub use scoring::{score_candidate, ComponentScores};
pub use selection::{rank_candidates, select_primary, SelectionDecision, SelectionState};
pub use types::{
    EntityStatus, GleifCandidate, Headquarters, Level2Outcome, MatchMethod, OutcomeStatus,
    ScoredCandidate,
};
