//! End-to-end pipeline tests with a scripted registry
//!
//! Drives the full resolve path (gate -> lookup -> normalize -> score
//! -> select -> stores) against in-memory stores and a mock registry
//! whose responses are scripted per call.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use domain_intel::error::{ResolutionError, TransientLookupError, PermanentLookupError};
use domain_intel::knowledge::KnowledgeStore;
use domain_intel::{
    ExtractionMethod, Fortune500Index, InMemoryKnowledgeStore, InMemoryOutcomeStore, Level1Result,
    Level2Resolver, OutcomeStatus, RawEntityRecord, RegistrySearch, ResolutionConfig,
};

// =========================================================================
// TEST INFRASTRUCTURE
// =========================================================================

/// One scripted reply from the mock registry
enum Reply {
    Hits(Vec<RawEntityRecord>),
    Timeout,
    ServerError,
    BadRequest,
}

struct ScriptedRegistry {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicU32,
}

impl ScriptedRegistry {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistrySearch for ScriptedRegistry {
    async fn search(
        &self,
        _query: &str,
        _domain_hint: &str,
    ) -> Result<Vec<RawEntityRecord>, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut replies = self.replies.lock().await;
        match replies.pop_front().expect("script exhausted") {
            Reply::Hits(hits) => Ok(hits),
            Reply::Timeout => Err(TransientLookupError::Timeout.into()),
            Reply::ServerError => Err(TransientLookupError::ServerError { status: 502 }.into()),
            Reply::BadRequest => Err(PermanentLookupError::BadRequest {
                status: 400,
                body: "bad filter".into(),
            }
            .into()),
        }
    }
}

fn raw(lei: &str, name: &str, jurisdiction: &str) -> RawEntityRecord {
    RawEntityRecord {
        lei: lei.into(),
        legal_name: name.into(),
        other_names: vec![],
        jurisdiction: Some(jurisdiction.into()),
        entity_status: Some("ACTIVE".into()),
        legal_form: Some("XTIQ".into()),
        entity_category: Some("GENERAL".into()),
        registration_status: Some("ISSUED".into()),
        headquarters_country: Some(jurisdiction.into()),
        headquarters_city: None,
        direct_parent_lei: None,
    }
}

fn apple_hit() -> RawEntityRecord {
    raw("HWUPKR0MPOU8FGXBT394", "Apple Inc.", "US")
}

fn level1(domain: &str, name: Option<&str>, confidence: u8) -> Level1Result {
    Level1Result {
        domain: domain.into(),
        extracted_name: name.map(String::from),
        extraction_method: ExtractionMethod::FooterRegex,
        confidence,
        failure_category: None,
        geographic_markers: Default::default(),
        protected: false,
    }
}

struct Harness {
    resolver: Level2Resolver,
    registry: Arc<ScriptedRegistry>,
    knowledge: Arc<InMemoryKnowledgeStore>,
}

fn harness(replies: Vec<Reply>) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let registry = Arc::new(ScriptedRegistry::new(replies));
    let knowledge = Arc::new(InMemoryKnowledgeStore::new());
    let config = ResolutionConfig {
        backoff_base_ms: 1,
        backoff_cap_ms: 5,
        ..ResolutionConfig::default()
    };
    let resolver = Level2Resolver::new(
        registry.clone(),
        knowledge.clone(),
        Arc::new(InMemoryOutcomeStore::new()),
        Arc::new(Fortune500Index::seeded()),
        config,
    );
    Harness {
        resolver,
        registry,
        knowledge,
    }
}

// =========================================================================
// SCENARIOS
// =========================================================================

#[tokio::test]
async fn auto_selects_fortune500_match() {
    let h = harness(vec![Reply::Hits(vec![
        apple_hit(),
        raw("ZZZ99999999999999901", "Appel Fruit Stand GmbH", "DE"),
    ])]);

    let outcome = h
        .resolver
        .resolve_level2("apple.com", &level1("apple.com", Some("Apple"), 45))
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(
        outcome.primary_lei_code.as_deref(),
        Some("HWUPKR0MPOU8FGXBT394")
    );
    let primary = outcome.primary().unwrap();
    assert_eq!(primary.fortune500_score, 100.0);
    assert!(primary.name_match_score >= 90.0);
    assert!(primary.weighted_score >= 75.0);
    assert_eq!(primary.rank_position, 1);
    assert_eq!(
        outcome
            .candidates
            .iter()
            .filter(|c| c.is_primary_selection)
            .count(),
        1
    );

    // Deferred KB write landed
    let mappings = h.knowledge.mappings().await;
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].domain, "apple.com");
    assert_eq!(mappings[0].mapping_frequency, 1);
}

#[tokio::test]
async fn retries_transient_failures_then_succeeds() {
    let h = harness(vec![
        Reply::Timeout,
        Reply::ServerError,
        Reply::Hits(vec![apple_hit()]),
    ]);

    let outcome = h
        .resolver
        .resolve_level2("apple.com", &level1("apple.com", Some("Apple"), 45))
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.lookup_attempts, 3);
    assert_eq!(h.registry.calls(), 3);
    // No duplicate candidates from the retries
    assert_eq!(outcome.candidates.len(), 1);
}

#[tokio::test]
async fn exhausted_retries_fail_without_crashing() {
    let h = harness(vec![Reply::Timeout, Reply::Timeout, Reply::Timeout]);

    let outcome = h
        .resolver
        .resolve_level2("slow.com", &level1("slow.com", Some("Slow Corp"), 40))
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.lookup_attempts, 3);
    assert!(outcome.error_message.as_deref().unwrap().contains("3"));
    assert_eq!(h.registry.calls(), 3);
}

#[tokio::test]
async fn permanent_failure_is_not_retried() {
    let h = harness(vec![Reply::BadRequest]);

    let outcome = h
        .resolver
        .resolve_level2("bad.com", &level1("bad.com", Some("Bad Query &&"), 40))
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(h.registry.calls(), 1);
}

#[tokio::test]
async fn empty_registry_result_fails_and_allows_reattempt() {
    let h = harness(vec![
        Reply::Hits(vec![]),
        Reply::Hits(vec![apple_hit()]),
    ]);
    let l1 = level1("apple.com", Some("Apple"), 45);

    let first = h.resolver.resolve_level2("apple.com", &l1).await.unwrap();
    assert_eq!(first.status, OutcomeStatus::Failed);
    assert_eq!(first.error_message.as_deref(), Some("no_candidates"));
    assert_eq!(first.attempt, 1);

    // Domain stays eligible; the re-attempt is an independent outcome
    let second = h.resolver.resolve_level2("apple.com", &l1).await.unwrap();
    assert_eq!(second.status, OutcomeStatus::Success);
    assert_eq!(second.attempt, 2);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn close_scores_go_to_manual_review() {
    // Two strong lookalikes: margin too thin to auto-select
    let h = harness(vec![Reply::Hits(vec![
        raw("AAA00000000000000001", "Acme Corporation", "US"),
        raw("BBB00000000000000002", "Acme Corp", "US"),
    ])]);
    let l1 = level1("acme.us", Some("Acme"), 50);

    let outcome = h.resolver.resolve_level2("acme.us", &l1).await.unwrap();

    assert_eq!(outcome.status, OutcomeStatus::CandidatesFound);
    assert!(outcome.candidates.iter().all(|c| !c.is_primary_selection));
    assert_eq!(outcome.candidates.len(), 2);
    // Ranked set is retained for the reviewer
    assert_eq!(outcome.candidates[0].rank_position, 1);
    assert_eq!(outcome.candidates[1].rank_position, 2);

    // Reviewer picks the runner-up
    let chosen = outcome.candidates[1].lei().to_string();
    let resolved = h
        .resolver
        .manual_select(outcome.id, &chosen, "confirmed against filings")
        .await
        .unwrap();

    assert_eq!(resolved.status, OutcomeStatus::Success);
    assert_eq!(resolved.primary_lei_code.as_deref(), Some(chosen.as_str()));
    assert_eq!(
        resolved
            .candidates
            .iter()
            .filter(|c| c.is_primary_selection)
            .count(),
        1
    );

    // Manual resolution feeds the knowledge base too
    let mappings = h.knowledge.mappings().await;
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].lei_code, chosen);

    // A second manual attempt hits the state guard
    let err = h
        .resolver
        .manual_select(outcome.id, &chosen, "again")
        .await
        .unwrap_err();
    assert!(matches!(err, ResolutionError::StateConflict(_)));
}

#[tokio::test]
async fn manual_select_unknown_outcome_is_input_error() {
    let h = harness(vec![]);
    let err = h
        .resolver
        .manual_select(uuid::Uuid::new_v4(), "AAA00000000000000001", "")
        .await
        .unwrap_err();
    assert!(matches!(err, ResolutionError::Input(_)));
}

#[tokio::test]
async fn confident_level1_is_not_attempted() {
    let h = harness(vec![]);
    let l1 = level1("done.com", Some("Done Deal Inc."), 95);

    let outcome = h.resolver.resolve_level2("done.com", &l1).await.unwrap();

    assert_eq!(outcome.status, OutcomeStatus::NotAttempted);
    assert_eq!(outcome.error_message.as_deref(), Some("sufficient-level1"));
    assert_eq!(h.registry.calls(), 0);
}

#[tokio::test]
async fn knowledge_base_accumulates_across_domains() {
    let lei = "HWUPKR0MPOU8FGXBT394";

    let h = harness(vec![
        Reply::Hits(vec![apple_hit()]),
        Reply::Hits(vec![apple_hit()]),
    ]);

    let first = h
        .resolver
        .resolve_level2("apple.com", &level1("apple.com", Some("Apple"), 45))
        .await
        .unwrap();
    assert_eq!(first.status, OutcomeStatus::Success);

    // Same entity behind a second domain: prior mapping raises the
    // complexity component on the next scoring pass
    let second = h
        .resolver
        .resolve_level2("apple.de", &level1("apple.de", Some("Apple"), 45))
        .await
        .unwrap();

    let first_primary = first.primary().unwrap();
    let second_primary = second.primary().unwrap();
    assert!(second_primary.entity_complexity_score > first_primary.entity_complexity_score);

    assert_eq!(h.knowledge.entity_frequency(lei).await.unwrap(), 2);
}

#[tokio::test]
async fn rescoring_identical_input_reproduces_ranking() {
    let hits = || {
        vec![
            raw("CCC00000000000000003", "Widget Holdings PLC", "GB"),
            raw("AAA00000000000000001", "Widget Industries Ltd", "GB"),
            raw("BBB00000000000000002", "Widget Industries Ltd", "GB"),
        ]
    };

    let run = |replies| async move {
        let h = harness(replies);
        h.resolver
            .resolve_level2("widget.uk", &level1("widget.uk", Some("Widget Industries"), 40))
            .await
            .unwrap()
    };

    let a = run(vec![Reply::Hits(hits())]).await;
    let b = run(vec![Reply::Hits(hits())]).await;

    let order_a: Vec<&str> = a.candidates.iter().map(|c| c.lei()).collect();
    let order_b: Vec<&str> = b.candidates.iter().map(|c| c.lei()).collect();
    assert_eq!(order_a, order_b);
    assert_eq!(a.status, b.status);
    assert_eq!(a.primary_lei_code, b.primary_lei_code);

    // Identical names, identical scores: lexicographic LEI decides
    let pos_a = order_a.iter().position(|l| *l == "AAA00000000000000001");
    let pos_b = order_a.iter().position(|l| *l == "BBB00000000000000002");
    assert!(pos_a < pos_b);
}

#[tokio::test]
async fn mismatched_domain_is_rejected() {
    let h = harness(vec![]);
    let err = h
        .resolver
        .resolve_level2("other.com", &level1("apple.com", Some("Apple"), 45))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolutionError::Input(_)));
}
