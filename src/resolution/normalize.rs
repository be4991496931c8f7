//! Text normalization and candidate normalization
//!
//! Name normalization for matching:
//! - Unicode NFKC normalization
//! - Lowercase conversion
//! - Punctuation stripping (except digits)
//! - Whitespace collapsing
//! - Optional legal suffix removal
//!
//! Candidate normalization converts raw registry hits into the
//! canonical `GleifCandidate` shape: trimmed strings, dedup by LEI
//! (first occurrence wins), malformed hits dropped and counted, output
//! capped with a truncation flag. A bad hit never aborts the batch.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

use super::types::{EntityStatus, GleifCandidate, Headquarters};
use crate::registry::RawEntityRecord;

/// Common legal suffixes to optionally strip during normalization
const LEGAL_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "llc",
    "ltd",
    "limited",
    "plc",
    "sa",
    "ag",
    "gmbh",
    "co",
    "company",
    "lp",
    "llp",
    "nv",
    "bv",
    "sarl",
    "sas",
    "se",
    "kg",
    "ohg",
    "pty",
    "pte",
];

/// Normalize entity text for matching.
///
/// Performs:
/// - Unicode NFKC fold
/// - Lowercase conversion
/// - Strip punctuation (replace with space)
/// - Collapse whitespace
/// - Optionally strip legal suffixes
pub fn normalize_entity_text(s: &str, strip_legal_suffixes: bool) -> String {
    // Unicode NFKC normalization
    let folded: String = s.nfkc().collect();

    // Replace non-alphanumeric with space, lowercase
    let stripped: String = folded
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();

    let tokens: Vec<&str> = stripped.split_whitespace().collect();

    let filtered: Vec<&str> = if strip_legal_suffixes {
        tokens.into_iter().filter(|t| !is_legal_suffix(t)).collect()
    } else {
        tokens
    };

    filtered.join(" ")
}

fn is_legal_suffix(token: &str) -> bool {
    LEGAL_SUFFIXES.contains(&token)
}

/// NFKC-fold and trim a wire string; `None` if nothing survives.
fn clean_field(s: &str) -> Option<String> {
    let folded: String = s.nfkc().collect();
    let trimmed = folded.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Result of normalizing one batch of raw registry hits
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    /// Canonical candidates, registry order preserved, deduped by LEI.
    pub candidates: Vec<GleifCandidate>,
    /// Malformed hits dropped (empty LEI or legal name).
    pub dropped: usize,
    /// True when the cap cut candidates off the tail.
    pub truncated: bool,
}

/// Normalize raw registry hits for a domain.
pub fn normalize_candidates(
    raw: Vec<RawEntityRecord>,
    domain: &str,
    max_candidates: usize,
) -> NormalizedBatch {
    let mut seen_leis: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();
    let mut dropped = 0usize;
    let mut truncated = false;

    for hit in raw {
        let (lei, legal_name) = match (clean_field(&hit.lei), clean_field(&hit.legal_name)) {
            (Some(lei), Some(name)) => (lei, name),
            _ => {
                dropped += 1;
                tracing::debug!(domain = %domain, "Dropped malformed registry hit");
                continue;
            }
        };

        // First occurrence wins
        if !seen_leis.insert(lei.clone()) {
            continue;
        }

        if candidates.len() >= max_candidates {
            truncated = true;
            continue;
        }

        candidates.push(GleifCandidate {
            lei_code: lei,
            legal_name,
            jurisdiction: hit.jurisdiction.as_deref().and_then(clean_field),
            entity_status: EntityStatus::from_wire(hit.entity_status.as_deref()),
            legal_form: hit.legal_form.as_deref().and_then(clean_field),
            entity_category: hit.entity_category.as_deref().and_then(clean_field),
            registration_status: hit.registration_status.as_deref().and_then(clean_field),
            headquarters: Headquarters {
                country: hit.headquarters_country.as_deref().and_then(clean_field),
                city: hit.headquarters_city.as_deref().and_then(clean_field),
            },
            other_names: hit
                .other_names
                .iter()
                .filter_map(|n| clean_field(n))
                .collect(),
            direct_parent_lei: hit.direct_parent_lei.as_deref().and_then(clean_field),
        });
    }

    if dropped > 0 || truncated {
        tracing::info!(
            domain = %domain,
            kept = candidates.len(),
            dropped,
            truncated,
            "Normalized registry batch"
        );
    }

    NormalizedBatch {
        candidates,
        dropped,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(lei: &str, name: &str) -> RawEntityRecord {
        RawEntityRecord {
            lei: lei.into(),
            legal_name: name.into(),
            other_names: vec![],
            jurisdiction: Some("US".into()),
            entity_status: Some("ACTIVE".into()),
            legal_form: None,
            entity_category: None,
            registration_status: Some("ISSUED".into()),
            headquarters_country: Some("US".into()),
            headquarters_city: None,
            direct_parent_lei: None,
        }
    }

    #[test]
    fn test_normalize_with_suffix_strip() {
        assert_eq!(normalize_entity_text("Apple, Inc.", true), "apple");
        assert_eq!(
            normalize_entity_text("Ford Motor Company", true),
            "ford motor"
        );
        assert_eq!(
            normalize_entity_text("Goldman Sachs & Co.", true),
            "goldman sachs"
        );
    }

    #[test]
    fn test_normalize_without_suffix_strip() {
        assert_eq!(normalize_entity_text("Apple, Inc.", false), "apple inc");
    }

    #[test]
    fn test_unicode_normalization() {
        // Full-width characters are converted to ASCII by NFKC
        assert_eq!(normalize_entity_text("Ａｐｐｌｅ", false), "apple");
        // Accented characters are preserved (NFKC doesn't strip diacritics)
        assert_eq!(
            normalize_entity_text("Société Générale", false),
            "société générale"
        );
    }

    #[test]
    fn test_dedup_by_lei_first_wins() {
        let batch = normalize_candidates(
            vec![
                raw("LEI00000000000000001", "Acme Inc."),
                raw("LEI00000000000000001", "Acme Incorporated"),
            ],
            "acme.com",
            25,
        );
        assert_eq!(batch.candidates.len(), 1);
        assert_eq!(batch.candidates[0].legal_name, "Acme Inc.");
        assert_eq!(batch.dropped, 0);
    }

    #[test]
    fn test_malformed_hits_dropped_not_fatal() {
        let batch = normalize_candidates(
            vec![
                raw("", "No Lei Corp"),
                raw("LEI00000000000000002", "   "),
                raw("LEI00000000000000003", "Kept GmbH"),
            ],
            "kept.de",
            25,
        );
        assert_eq!(batch.candidates.len(), 1);
        assert_eq!(batch.candidates[0].legal_name, "Kept GmbH");
        assert_eq!(batch.dropped, 2);
    }

    #[test]
    fn test_cap_sets_truncation_flag() {
        let hits: Vec<_> = (0..30)
            .map(|i| raw(&format!("LEI{:017}", i), &format!("Entity {}", i)))
            .collect();
        let batch = normalize_candidates(hits, "big.com", 25);
        assert_eq!(batch.candidates.len(), 25);
        assert!(batch.truncated);
    }

    #[test]
    fn test_fields_trimmed_and_folded() {
        let mut hit = raw("LEI00000000000000004", "  Ｗｉｄｇｅｔ Ltd  ");
        hit.other_names = vec!["  Widget International  ".into(), "  ".into()];
        let batch = normalize_candidates(vec![hit], "widget.com", 25);
        let c = &batch.candidates[0];
        assert_eq!(c.legal_name, "Widget Ltd");
        assert_eq!(c.other_names, vec!["Widget International"]);
    }
}
