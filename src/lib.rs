//! domain-intel: domain to legal-entity resolution core
//!
//! Turns a Level 1 extraction result (a candidate company name pulled
//! from crawled page content) into a verified legal-entity record by
//! querying the GLEIF registry, scoring candidates with a deterministic
//! weighted formula, and either auto-selecting a primary entity or
//! parking the domain for manual review.
//!
//! ## Pipeline
//! Gate -> registry lookup -> normalize -> score -> select -> knowledge
//! base update -> record assembly. Domains are independent units of
//! work; the knowledge base is the only cross-domain shared state and
//! all its writes are monotonic.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_intel::{
//!     Fortune500Index, GleifClient, InMemoryKnowledgeStore, InMemoryOutcomeStore,
//!     Level2Resolver, ResolutionConfig,
//! };
//!
//! # async fn run(level1: domain_intel::Level1Result) -> anyhow::Result<()> {
//! let config = ResolutionConfig::default();
//! let client = GleifClient::new(config.rate_limit_delay(), config.search_page_size)?;
//! let resolver = Level2Resolver::new(
//!     Arc::new(client),
//!     Arc::new(InMemoryKnowledgeStore::new()),
//!     Arc::new(InMemoryOutcomeStore::new()),
//!     Arc::new(Fortune500Index::seeded()),
//!     config,
//! );
//! let outcome = resolver.resolve_level2("apple.com", &level1).await?;
//! println!("{}", outcome.status.as_str());
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Configuration
pub mod config;

// Level 1 input contract
pub mod level1;

// GLEIF registry integration
pub mod registry;

// Level 2 resolution core
pub mod resolution;

// Cross-domain knowledge accumulation
pub mod knowledge;

// Fortune-500 reference index
pub mod fortune500;

// Business-intelligence record projection
pub mod assembler;

// Public re-exports for the common call path
pub use assembler::{assemble_record, BusinessIntelligenceRecord};
pub use config::ResolutionConfig;
pub use error::{ResolutionError, Result};
pub use fortune500::Fortune500Index;
pub use knowledge::{
    EntityMapping, EntityRelationship, InMemoryKnowledgeStore, InMemoryOutcomeStore,
    KnowledgeSnapshot, KnowledgeStore, OutcomeStore,
};
pub use level1::{ExtractionMethod, FailureCategory, Level1Result};
pub use registry::{GleifClient, RawEntityRecord, RegistrySearch};
pub use resolution::{
    evaluate_eligibility, EligibilityDecision, EligibilityReason, GleifCandidate, Level2Outcome,
    Level2Resolver, OutcomeStatus, ScoredCandidate,
};

#[cfg(feature = "database")]
pub use knowledge::{PgKnowledgeStore, PgOutcomeStore};
