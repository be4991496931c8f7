//! Weighted candidate scoring
//!
//! Pure function of (domain, Level 1 result, candidate, knowledge
//! snapshot). Four component scores, each 0–100, combined with fixed
//! weights:
//!
//!   weighted = 0.40·name + 0.25·fortune500 + 0.20·tld + 0.15·complexity
//!
//! No I/O and no wall clock: identical inputs (snapshot included)
//! always produce identical scores.

use strsim::jaro_winkler;

use super::normalize::normalize_entity_text;
use super::types::{GleifCandidate, MatchMethod, ScoredCandidate};
use crate::fortune500::{Fortune500Index, ReferenceMatch};
use crate::knowledge::KnowledgeSnapshot;
use crate::level1::Level1Result;

pub const WEIGHT_NAME_MATCH: f64 = 0.40;
pub const WEIGHT_FORTUNE500: f64 = 0.25;
pub const WEIGHT_DOMAIN_TLD: f64 = 0.20;
pub const WEIGHT_ENTITY_COMPLEXITY: f64 = 0.15;

/// Blend between suffix-stripped core similarity and suffix-preserving
/// full-name similarity.
const CORE_BLEND: f64 = 0.8;

/// Country-code TLDs the TLD component recognizes.
const CCTLD_COUNTRIES: &[(&str, &str)] = &[
    ("at", "AT"),
    ("au", "AU"),
    ("be", "BE"),
    ("br", "BR"),
    ("ca", "CA"),
    ("ch", "CH"),
    ("cn", "CN"),
    ("de", "DE"),
    ("dk", "DK"),
    ("es", "ES"),
    ("fi", "FI"),
    ("fr", "FR"),
    ("hk", "HK"),
    ("ie", "IE"),
    ("in", "IN"),
    ("it", "IT"),
    ("jp", "JP"),
    ("kr", "KR"),
    ("lu", "LU"),
    ("mx", "MX"),
    ("nl", "NL"),
    ("no", "NO"),
    ("pl", "PL"),
    ("pt", "PT"),
    ("se", "SE"),
    ("sg", "SG"),
    ("uk", "GB"),
    ("us", "US"),
];

/// The four component scores for one candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentScores {
    pub name_match: f64,
    pub fortune500: f64,
    pub domain_tld: f64,
    pub entity_complexity: f64,
}

impl ComponentScores {
    pub fn weighted(&self) -> f64 {
        WEIGHT_NAME_MATCH * self.name_match
            + WEIGHT_FORTUNE500 * self.fortune500
            + WEIGHT_DOMAIN_TLD * self.domain_tld
            + WEIGHT_ENTITY_COMPLEXITY * self.entity_complexity
    }
}

/// Name the scoring pass matches against: the Level 1 extraction when
/// present, otherwise a name derived from the domain itself.
pub fn match_target(level1: &Level1Result) -> (String, MatchMethod) {
    match level1
        .extracted_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        Some(name) => (name.to_string(), MatchMethod::ExtractedName),
        None => (
            derive_name_from_domain(&level1.domain),
            MatchMethod::DomainDerived,
        ),
    }
}

/// "acme-widgets.co.uk" -> "acme widgets"
pub fn derive_name_from_domain(domain: &str) -> String {
    let labels: Vec<&str> = domain.split('.').collect();
    let base = labels.first().copied().unwrap_or(domain);
    base.replace(['-', '_'], " ").trim().to_string()
}

/// Effective TLD label of a domain ("apple.com" -> "com",
/// "acme.co.uk" -> "uk").
fn domain_tld(domain: &str) -> Option<&str> {
    domain.rsplit('.').next().filter(|t| !t.is_empty())
}

fn cctld_country(tld: &str) -> Option<&'static str> {
    CCTLD_COUNTRIES
        .iter()
        .find(|(t, _)| *t == tld)
        .map(|(_, c)| *c)
}

/// GLEIF jurisdictions may carry a region suffix ("US-DE"); compare on
/// the country part only.
fn country_part(jurisdiction: &str) -> &str {
    jurisdiction.split('-').next().unwrap_or(jurisdiction)
}

/// Similarity of one name variant against the target, 0–1.
fn name_similarity(target: &str, name: &str) -> f64 {
    let target_core = normalize_entity_text(target, true);
    let name_core = normalize_entity_text(name, true);
    let target_full = normalize_entity_text(target, false);
    let name_full = normalize_entity_text(name, false);

    if target_full.is_empty() || name_full.is_empty() {
        return 0.0;
    }

    let full = jaro_winkler(&target_full, &name_full);

    // Names made entirely of legal suffixes have no core to compare
    if target_core.is_empty() || name_core.is_empty() {
        return full;
    }

    let core = jaro_winkler(&target_core, &name_core);
    CORE_BLEND * core + (1.0 - CORE_BLEND) * full
}

/// nameMatchScore: max similarity across legal name and other names.
pub fn name_match_score(target: &str, candidate: &GleifCandidate) -> f64 {
    let best = std::iter::once(candidate.legal_name.as_str())
        .chain(candidate.other_names.iter().map(|n| n.as_str()))
        .map(|name| name_similarity(target, name))
        .fold(0.0f64, f64::max);
    (best * 100.0).clamp(0.0, 100.0)
}

/// fortune500Score: 100 exact/alias, 50 fuzzy, 0 otherwise.
pub fn fortune500_score(candidate: &GleifCandidate, index: &Fortune500Index) -> f64 {
    match index.lookup(&candidate.legal_name) {
        ReferenceMatch::Exact => 100.0,
        ReferenceMatch::Fuzzy => 50.0,
        ReferenceMatch::None => 0.0,
    }
}

/// domainTldScore: alignment between the domain's TLD country signal
/// and the candidate's jurisdiction / headquarters country.
pub fn domain_tld_score(domain: &str, candidate: &GleifCandidate) -> f64 {
    let tld = match domain_tld(domain) {
        Some(t) => t.to_ascii_lowercase(),
        None => return 50.0,
    };

    let tld_country = match cctld_country(&tld) {
        Some(c) => c,
        // Generic TLDs carry no country signal: neutral mid-value
        None => return 50.0,
    };

    let jurisdiction_match = candidate
        .jurisdiction
        .as_deref()
        .map(country_part)
        .map(|c| c.eq_ignore_ascii_case(tld_country))
        .unwrap_or(false);
    if jurisdiction_match {
        return 100.0;
    }

    let hq_match = candidate
        .headquarters
        .country
        .as_deref()
        .map(|c| c.eq_ignore_ascii_case(tld_country))
        .unwrap_or(false);
    if hq_match {
        return 80.0;
    }

    20.0
}

/// entityComplexityScore: maturity signal from category/legal form plus
/// accumulated knowledge-base context. Entities seen across many
/// domains or with known corporate structure score higher.
pub fn entity_complexity_score(candidate: &GleifCandidate, snapshot: &KnowledgeSnapshot) -> f64 {
    let base = match candidate.entity_category.as_deref() {
        Some("GENERAL") => 40.0,
        Some("FUND") => 30.0,
        Some("BRANCH") => 25.0,
        Some("SOLE_PROPRIETOR") => 10.0,
        _ => 25.0,
    };

    let legal_form = if candidate.legal_form.is_some() {
        10.0
    } else {
        0.0
    };

    let context = snapshot.context(&candidate.lei_code);
    // 6 points per distinct prior domain, capped
    let frequency = (context.frequency.min(5) as f64) * 6.0;
    let relationships = if context.has_relationships || candidate.direct_parent_lei.is_some() {
        20.0
    } else {
        0.0
    };

    (base + legal_form + frequency + relationships).clamp(0.0, 100.0)
}

/// Compute all components for one candidate.
pub fn component_scores(
    domain: &str,
    target: &str,
    candidate: &GleifCandidate,
    index: &Fortune500Index,
    snapshot: &KnowledgeSnapshot,
) -> ComponentScores {
    ComponentScores {
        name_match: name_match_score(target, candidate),
        fortune500: fortune500_score(candidate, index),
        domain_tld: domain_tld_score(domain, candidate),
        entity_complexity: entity_complexity_score(candidate, snapshot),
    }
}

/// Score one candidate into a `ScoredCandidate` (rank assigned later).
pub fn score_candidate(
    domain: &str,
    target: &str,
    method: MatchMethod,
    candidate: GleifCandidate,
    index: &Fortune500Index,
    snapshot: &KnowledgeSnapshot,
) -> ScoredCandidate {
    let scores = component_scores(domain, target, &candidate, index, snapshot);
    ScoredCandidate {
        candidate,
        name_match_score: scores.name_match,
        domain_tld_score: scores.domain_tld,
        fortune500_score: scores.fortune500,
        entity_complexity_score: scores.entity_complexity,
        weighted_score: scores.weighted(),
        rank_position: 0,
        is_primary_selection: false,
        selection_reason: None,
        match_method: method,
    }
}
