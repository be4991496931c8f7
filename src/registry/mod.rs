//! GLEIF legal-entity registry integration
//!
//! This module provides:
//! - Wire types for the GLEIF lei-records search endpoint
//! - The `RegistrySearch` trait the orchestrator depends on
//! - A rate-limited reqwest client implementing it

pub mod client;
pub mod types;

pub use client::{GleifClient, RegistrySearch};
pub use types::{extract_lei_from_url, RawEntityRecord};
