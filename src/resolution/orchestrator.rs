//! Resolution orchestrator
//!
//! Sequences one domain's Level 2 pipeline:
//! gate → registry lookup (bounded retries) → normalize → score →
//! select → persist outcome → deferred knowledge-base update.
//!
//! Stage failures are converted into the outcome's terminal status,
//! never propagated as a crash; only store failures
//! (`StorageUnavailable`) abort the domain for batch-level retry.
//! Every stage boundary is an `.await` point, so a dropped pipeline
//! future cancels between stages; knowledge-base writes happen in a
//! single post-selection step and are never left half-committed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use super::eligibility::{evaluate_eligibility, EligibilityDecision};
use super::normalize::normalize_candidates;
use super::scoring::{match_target, score_candidate};
use super::selection::{
    apply_manual_selection, rank_candidates, select_primary, SelectionState, REASON_AUTO,
    REASON_MANUAL,
};
use super::types::{Level2Outcome, OutcomeStatus, ScoredCandidate};
use crate::config::ResolutionConfig;
use crate::error::{InputError, ResolutionError, Result, TransientLookupError};
use crate::fortune500::Fortune500Index;
use crate::knowledge::{KnowledgeStore, OutcomeStore};
use crate::registry::{RawEntityRecord, RegistrySearch};

pub struct Level2Resolver {
    registry: Arc<dyn RegistrySearch>,
    knowledge: Arc<dyn KnowledgeStore>,
    outcomes: Arc<dyn OutcomeStore>,
    fortune500: Arc<Fortune500Index>,
    config: ResolutionConfig,
}

impl Level2Resolver {
    pub fn new(
        registry: Arc<dyn RegistrySearch>,
        knowledge: Arc<dyn KnowledgeStore>,
        outcomes: Arc<dyn OutcomeStore>,
        fortune500: Arc<Fortune500Index>,
        config: ResolutionConfig,
    ) -> Self {
        Self {
            registry,
            knowledge,
            outcomes,
            fortune500,
            config,
        }
    }

    /// Pure eligibility check, exposed for callers that gate before
    /// scheduling work.
    pub fn evaluate_eligibility(&self, level1: &crate::level1::Level1Result) -> EligibilityDecision {
        evaluate_eligibility(level1, self.config.low_confidence_threshold)
    }

    /// Run one Level 2 attempt for a domain.
    ///
    /// Idempotent per invocation: each call records a new, independent
    /// attempt. A failed domain stays eligible for a future call.
    pub async fn resolve_level2(
        &self,
        domain: &str,
        level1: &crate::level1::Level1Result,
    ) -> Result<Level2Outcome> {
        level1.validate()?;
        if level1.domain != domain {
            return Err(InputError::MalformedLevel1 {
                domain: domain.to_string(),
                reason: format!("Level 1 result belongs to '{}'", level1.domain),
            }
            .into());
        }

        let attempt = self.outcomes.attempt_count(domain).await? + 1;
        let started = Instant::now();

        let gate = self.evaluate_eligibility(level1);
        if !gate.eligible {
            tracing::debug!(
                domain = %domain,
                reason = gate.reason.as_str(),
                "Level 2 not attempted"
            );
            let outcome = self
                .finish(domain, attempt, started, 0, |o| {
                    o.status = OutcomeStatus::NotAttempted;
                    o.error_message = Some(gate.reason.as_str().to_string());
                })
                .await?;
            return Ok(outcome);
        }

        let (target, method) = match_target(level1);

        // Registry lookup with bounded retries
        let (hits, lookup_attempts) = match self.lookup_with_retry(&target, domain).await {
            Ok(result) => result,
            Err((err, attempts)) => {
                tracing::warn!(
                    domain = %domain,
                    attempts,
                    error = %err,
                    "Registry lookup failed"
                );
                let outcome = self
                    .finish(domain, attempt, started, attempts, |o| {
                        o.status = OutcomeStatus::Failed;
                        o.error_message = Some(err.to_string());
                    })
                    .await?;
                return Ok(outcome);
            }
        };

        let batch = normalize_candidates(hits, domain, self.config.max_candidates);
        if batch.candidates.is_empty() {
            let outcome = self
                .finish(domain, attempt, started, lookup_attempts, |o| {
                    o.status = OutcomeStatus::Failed;
                    o.error_message = Some("no_candidates".to_string());
                })
                .await?;
            return Ok(outcome);
        }

        // Snapshot KB state before scoring; writes are deferred until
        // after selection so this pass never reads its own writes.
        let leis: Vec<String> = batch
            .candidates
            .iter()
            .map(|c| c.lei_code.clone())
            .collect();
        let snapshot = self.knowledge.snapshot(&leis).await?;

        let scored: Vec<ScoredCandidate> = batch
            .candidates
            .into_iter()
            .map(|c| score_candidate(domain, &target, method, c, &self.fortune500, &snapshot))
            .collect();

        let mut ranked = rank_candidates(scored);
        let decision = select_primary(
            &mut ranked,
            self.config.auto_select_threshold,
            self.config.min_margin,
        );

        let (status, primary_lei) = match decision.state {
            SelectionState::AutoSelected => (OutcomeStatus::Success, decision.primary_lei),
            _ => (OutcomeStatus::CandidatesFound, None),
        };

        let outcome = self
            .finish(domain, attempt, started, lookup_attempts, |o| {
                o.status = status;
                o.candidates = ranked;
                o.primary_lei_code = primary_lei;
            })
            .await?;

        debug_assert!(outcome.is_consistent());

        if outcome.status == OutcomeStatus::Success {
            self.commit_knowledge(&outcome, REASON_AUTO).await?;
        }

        tracing::info!(
            domain = %domain,
            attempt,
            status = outcome.status.as_str(),
            candidates = outcome.candidates.len(),
            primary = outcome.primary_lei_code.as_deref().unwrap_or("-"),
            elapsed_ms = outcome.processing_time_ms,
            "Level 2 resolution finished"
        );

        Ok(outcome)
    }

    /// Resolve a pending `candidates_found` outcome by human choice.
    pub async fn manual_select(
        &self,
        outcome_id: Uuid,
        lei: &str,
        note: &str,
    ) -> Result<Level2Outcome> {
        let mut outcome = self
            .outcomes
            .fetch_outcome(outcome_id)
            .await?
            .ok_or(InputError::UnknownOutcome(outcome_id))?;

        apply_manual_selection(&mut outcome, lei, note)?;

        self.outcomes.update_outcome(&outcome).await?;
        self.commit_knowledge(&outcome, REASON_MANUAL).await?;

        Ok(outcome)
    }

    /// Registry lookup with exponential backoff and jitter. Transient
    /// failures are retried up to the configured bound; permanent
    /// failures stop immediately. Returns attempts consumed either way.
    async fn lookup_with_retry(
        &self,
        query: &str,
        domain: &str,
    ) -> std::result::Result<(Vec<RawEntityRecord>, u32), (ResolutionError, u32)> {
        let max = self.config.max_lookup_attempts;

        for attempt in 1..=max {
            match self.registry.search(query, domain).await {
                Ok(hits) => return Ok((hits, attempt)),
                Err(err) if err.is_transient() && attempt < max => {
                    let delay = self.backoff_delay(attempt);
                    tracing::debug!(
                        domain = %domain,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient lookup failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) if err.is_transient() => {
                    return Err((
                        TransientLookupError::RetriesExhausted {
                            attempts: max,
                            last_error: err.to_string(),
                        }
                        .into(),
                        attempt,
                    ));
                }
                Err(err) => return Err((err, attempt)),
            }
        }

        unreachable!("lookup loop returns within max attempts")
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.backoff_base();
        let exp = base.saturating_mul(2u32.saturating_pow(attempt - 1));
        let capped = exp.min(self.config.backoff_cap());
        // Up to +50% jitter, still bounded by the cap
        let jitter_ms = rand::thread_rng().gen_range(0..=capped.as_millis() as u64 / 2);
        (capped + Duration::from_millis(jitter_ms)).min(self.config.backoff_cap())
    }

    /// Build and persist the attempt's outcome record.
    async fn finish(
        &self,
        domain: &str,
        attempt: u32,
        started: Instant,
        lookup_attempts: u32,
        fill: impl FnOnce(&mut Level2Outcome),
    ) -> Result<Level2Outcome> {
        let mut outcome = Level2Outcome {
            id: Uuid::new_v4(),
            domain: domain.to_string(),
            attempt,
            status: OutcomeStatus::Failed,
            candidates: Vec::new(),
            primary_lei_code: None,
            processing_time_ms: started.elapsed().as_millis() as u64,
            lookup_attempts,
            error_message: None,
            created_at: Utc::now(),
        };
        fill(&mut outcome);
        self.outcomes.record_outcome(&outcome).await?;
        Ok(outcome)
    }

    /// Deferred knowledge-base update: one step, after selection.
    async fn commit_knowledge(&self, outcome: &Level2Outcome, method: &str) -> Result<()> {
        let Some(primary) = outcome.primary() else {
            return Ok(());
        };

        let confidence = primary.weighted_score / 100.0;
        self.knowledge
            .record_mapping(&outcome.domain, primary.lei(), confidence, method)
            .await?;

        if let Some(parent) = &primary.candidate.direct_parent_lei {
            self.knowledge
                .record_relationship(parent, primary.lei(), "DIRECT_PARENT", confidence)
                .await?;
        }

        Ok(())
    }
}
