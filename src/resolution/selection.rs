//! Primary-selection policy
//!
//! State machine over a scored candidate set:
//!
//! `no_candidates` → `scored` → {`auto_selected`, `needs_review`} → `resolved`
//!
//! Ranking is a total order: weighted score descending, ACTIVE entities
//! before non-ACTIVE on ties, lexicographic LEI as the final
//! deterministic tie-break. Auto-selection requires the top candidate
//! to clear the threshold AND beat the runner-up by the configured
//! margin; anything else is held for manual review with the full ranked
//! set retained.

use serde::{Deserialize, Serialize};

use super::types::{Level2Outcome, OutcomeStatus, ScoredCandidate};
use crate::error::{InputError, ResolutionError, StateConflictError};

pub const REASON_AUTO: &str = "auto-high-confidence";
pub const REASON_MANUAL: &str = "manual-override";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    NoCandidates,
    Scored,
    AutoSelected,
    NeedsReview,
    Resolved,
}

/// Result of running the selection policy over a ranked set
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionDecision {
    pub state: SelectionState,
    pub primary_lei: Option<String>,
}

/// Sort candidates into rank order and assign 1-based positions.
pub fn rank_candidates(mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| {
        b.weighted_score
            .total_cmp(&a.weighted_score)
            .then_with(|| {
                b.candidate
                    .entity_status
                    .is_active()
                    .cmp(&a.candidate.entity_status.is_active())
            })
            .then_with(|| a.candidate.lei_code.cmp(&b.candidate.lei_code))
    });

    for (i, c) in candidates.iter_mut().enumerate() {
        c.rank_position = i + 1;
    }
    candidates
}

/// Apply the auto-select policy to a ranked candidate set.
///
/// Expects candidates already ranked (`rank_candidates`). Mutates at
/// most the top candidate's selection fields.
pub fn select_primary(
    candidates: &mut [ScoredCandidate],
    auto_select_threshold: f64,
    min_margin: f64,
) -> SelectionDecision {
    let Some(top_score) = candidates.first().map(|c| c.weighted_score) else {
        return SelectionDecision {
            state: SelectionState::NoCandidates,
            primary_lei: None,
        };
    };

    // A lone candidate has no runner-up to clear
    let margin_ok = candidates
        .get(1)
        .map(|runner_up| top_score - runner_up.weighted_score >= min_margin)
        .unwrap_or(true);

    if top_score >= auto_select_threshold && margin_ok {
        let top = &mut candidates[0];
        top.is_primary_selection = true;
        top.selection_reason = Some(REASON_AUTO.to_string());
        SelectionDecision {
            state: SelectionState::AutoSelected,
            primary_lei: Some(top.candidate.lei_code.clone()),
        }
    } else {
        SelectionDecision {
            state: SelectionState::NeedsReview,
            primary_lei: None,
        }
    }
}

/// Resolve a `candidates_found` outcome by human choice.
///
/// Guard: only valid while the outcome still awaits review. Marks
/// exactly one candidate primary, records the manual reason and the
/// reviewer's note, and moves the outcome to `success`.
pub fn apply_manual_selection(
    outcome: &mut Level2Outcome,
    lei: &str,
    note: &str,
) -> Result<(), ResolutionError> {
    if outcome.status != OutcomeStatus::CandidatesFound {
        return Err(StateConflictError::NotAwaitingReview {
            outcome_id: outcome.id,
            status: outcome.status.as_str().to_string(),
        }
        .into());
    }

    let found = outcome
        .candidates
        .iter_mut()
        .find(|c| c.candidate.lei_code == lei);

    let Some(chosen) = found else {
        return Err(InputError::UnknownCandidate {
            outcome_id: outcome.id,
            lei: lei.to_string(),
        }
        .into());
    };

    chosen.is_primary_selection = true;
    chosen.selection_reason = Some(if note.trim().is_empty() {
        REASON_MANUAL.to_string()
    } else {
        format!("{}: {}", REASON_MANUAL, note.trim())
    });

    outcome.primary_lei_code = Some(lei.to_string());
    outcome.status = OutcomeStatus::Success;

    tracing::info!(
        outcome_id = %outcome.id,
        domain = %outcome.domain,
        lei = %lei,
        "Manual selection resolved outcome"
    );

    Ok(())
}
