//! Eligibility gate for Level 2 lookups
//!
//! Pure predicate over a `Level1Result`. Rules are evaluated in order,
//! first match wins:
//!
//! 1. Extraction failed but a partial name fragment exists
//! 2. Name present with confidence below the enrichment threshold
//! 3. Domain flagged as a protected site
//! 4. Confident successful extraction, Level 2 not needed
//!
//! A failed extraction with nothing to search on falls through to
//! not-eligible (`no-recovery-signal`). No side effects, deterministic
//! for identical input.

use serde::{Deserialize, Serialize};

use crate::level1::Level1Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EligibilityReason {
    PartialFailureRecovery,
    LowConfidenceEnrichment,
    ProtectedSiteReview,
    SufficientLevel1,
    NoRecoverySignal,
}

impl EligibilityReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PartialFailureRecovery => "partial-failure-recovery",
            Self::LowConfidenceEnrichment => "low-confidence-enrichment",
            Self::ProtectedSiteReview => "protected-site-review",
            Self::SufficientLevel1 => "sufficient-level1",
            Self::NoRecoverySignal => "no-recovery-signal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityDecision {
    pub eligible: bool,
    pub reason: EligibilityReason,
}

/// Decide whether a domain's Level 1 result warrants a Level 2 lookup.
pub fn evaluate_eligibility(
    level1: &Level1Result,
    low_confidence_threshold: u8,
) -> EligibilityDecision {
    // Rule 1: failed extraction left a usable fragment to recover from
    if level1.has_partial_fragment() {
        return EligibilityDecision {
            eligible: true,
            reason: EligibilityReason::PartialFailureRecovery,
        };
    }

    // Rule 2: a name exists but the extractor wasn't confident in it
    if level1.extracted_name.is_some() && level1.confidence < low_confidence_threshold {
        return EligibilityDecision {
            eligible: true,
            reason: EligibilityReason::LowConfidenceEnrichment,
        };
    }

    // Rule 3: protected sites always get registry review
    if level1.protected {
        return EligibilityDecision {
            eligible: true,
            reason: EligibilityReason::ProtectedSiteReview,
        };
    }

    // Rule 4: confident successful extraction stands on its own
    if level1.confidence >= low_confidence_threshold && level1.extraction_method.succeeded() {
        return EligibilityDecision {
            eligible: false,
            reason: EligibilityReason::SufficientLevel1,
        };
    }

    // Failed extraction, no fragment, not protected: nothing to query on
    EligibilityDecision {
        eligible: false,
        reason: EligibilityReason::NoRecoverySignal,
    }
}
