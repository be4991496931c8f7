//! Level 1 extraction result: the input contract
//!
//! Level 1 is the low-cost pass that pulls a company name straight out of
//! crawled page content. It is owned by the extraction side of the
//! platform; this crate consumes its output read-only. One result is
//! produced per domain per processing attempt and is immutable once
//! written.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// How the Level 1 extractor arrived at (or failed to arrive at) a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Name pulled from page metadata (title/og tags)
    MetaTag,
    /// Name matched from footer copyright patterns
    FooterRegex,
    /// Name pulled from structured data (JSON-LD, microdata)
    StructuredData,
    /// Headless-browser dump heuristics
    DomHeuristic,
    /// Extraction ran but produced nothing usable
    Failed,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetaTag => "meta-tag",
            Self::FooterRegex => "footer-regex",
            Self::StructuredData => "structured-data",
            Self::DomHeuristic => "dom-heuristic",
            Self::Failed => "failed",
        }
    }

    pub fn succeeded(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Why a Level 1 extraction came up empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Site blocked the crawler (bot walls, auth gates)
    Protected,
    /// Page fetched but no name-bearing content found
    NoSignal,
    /// Content present but ambiguous (marketplaces, parked pages)
    Ambiguous,
    /// Fetch itself failed (DNS, TLS, timeouts)
    FetchError,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Protected => "protected",
            Self::NoSignal => "no_signal",
            Self::Ambiguous => "ambiguous",
            Self::FetchError => "fetch_error",
        }
    }
}

/// Immutable Level 1 result for one domain, one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level1Result {
    pub domain: String,
    /// Best extracted company name, if any. A partial fragment counts.
    pub extracted_name: Option<String>,
    pub extraction_method: ExtractionMethod,
    /// Extractor self-reported confidence, 0–100.
    pub confidence: u8,
    pub failure_category: Option<FailureCategory>,
    /// Country/locale hints spotted in page content (ISO country codes).
    #[serde(default)]
    pub geographic_markers: HashSet<String>,
    /// External signal: domain flagged as a protected site.
    #[serde(default)]
    pub protected: bool,
}

impl Level1Result {
    /// Validate the caller-supplied contract before any pipeline work.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.domain.trim().is_empty() {
            return Err(InputError::MissingDomain);
        }
        if self.confidence > 100 {
            return Err(InputError::MalformedLevel1 {
                domain: self.domain.clone(),
                reason: format!("confidence {} out of range 0-100", self.confidence),
            });
        }
        if let Some(name) = &self.extracted_name {
            if name.trim().is_empty() {
                return Err(InputError::MalformedLevel1 {
                    domain: self.domain.clone(),
                    reason: "extracted_name present but blank".into(),
                });
            }
        }
        Ok(())
    }

    /// True when extraction failed but left a usable name fragment behind.
    pub fn has_partial_fragment(&self) -> bool {
        !self.extraction_method.succeeded()
            && self
                .extracted_name
                .as_deref()
                .map(|n| !n.trim().is_empty())
                .unwrap_or(false)
    }
}
