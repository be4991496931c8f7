//! Fortune-500 reference index
//!
//! Static lookup used by the scoring engine's fortune500 component.
//! Three tiers of match:
//! - exact normalized legal-name match
//! - alias match (well-known short forms)
//! - fuzzy match via Jaro-Winkler over all indexed names
//!
//! The index is built once at construction and shared read-only across
//! domain pipelines.

use std::collections::{HashMap, HashSet};

use crate::resolution::normalize::normalize_entity_text;

/// Minimum Jaro-Winkler similarity for a fuzzy alias match
const FUZZY_MATCH_THRESHOLD: f64 = 0.92;

/// Scoring grade for a reference-list lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceMatch {
    /// Exact or alias hit
    Exact,
    /// Fuzzy hit above the similarity threshold
    Fuzzy,
    /// Not on the list
    None,
}

/// Seed list for tests and default construction. Production deployments
/// load the full list via `Fortune500Index::from_entries`.
const SEED_COMPANIES: &[(&str, &[&str])] = &[
    ("Apple Inc.", &["Apple"]),
    ("Microsoft Corporation", &["Microsoft"]),
    ("Amazon.com Inc.", &["Amazon"]),
    ("Alphabet Inc.", &["Google", "Alphabet"]),
    ("Ford Motor Company", &["Ford"]),
    ("The Goldman Sachs Group Inc.", &["Goldman Sachs"]),
    ("JPMorgan Chase & Co.", &["JPMorgan", "Chase"]),
    ("Walmart Inc.", &["Walmart"]),
    ("Exxon Mobil Corporation", &["ExxonMobil", "Exxon"]),
    ("Berkshire Hathaway Inc.", &["Berkshire Hathaway"]),
    ("Johnson & Johnson", &[]),
    ("The Coca-Cola Company", &["Coca-Cola", "Coke"]),
    ("Intel Corporation", &["Intel"]),
    ("International Business Machines Corporation", &["IBM"]),
    ("General Motors Company", &["GM", "General Motors"]),
];

/// Immutable reference index over Fortune-500 names and aliases.
pub struct Fortune500Index {
    /// Normalized legal names (suffixes stripped) -> canonical name
    names: HashMap<String, String>,
    /// Normalized aliases -> canonical name
    aliases: HashMap<String, String>,
    /// All normalized keys for fuzzy scanning
    fuzzy_keys: HashSet<String>,
}

impl Fortune500Index {
    /// Build from (legal name, aliases) entries.
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a [&'a str])>,
    ) -> Self {
        let mut names = HashMap::new();
        let mut aliases = HashMap::new();
        let mut fuzzy_keys = HashSet::new();

        for (legal_name, alias_list) in entries {
            let key = normalize_entity_text(legal_name, true);
            if key.is_empty() {
                continue;
            }
            fuzzy_keys.insert(key.clone());
            names.insert(key, legal_name.to_string());

            for alias in alias_list {
                let alias_key = normalize_entity_text(alias, true);
                if alias_key.is_empty() {
                    continue;
                }
                fuzzy_keys.insert(alias_key.clone());
                aliases.insert(alias_key, legal_name.to_string());
            }
        }

        Self {
            names,
            aliases,
            fuzzy_keys,
        }
    }

    /// Index seeded with the built-in list.
    pub fn seeded() -> Self {
        Self::from_entries(SEED_COMPANIES.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Look up a candidate legal name against the reference list.
    pub fn lookup(&self, legal_name: &str) -> ReferenceMatch {
        let key = normalize_entity_text(legal_name, true);
        if key.is_empty() {
            return ReferenceMatch::None;
        }

        if self.names.contains_key(&key) || self.aliases.contains_key(&key) {
            return ReferenceMatch::Exact;
        }

        let best = self
            .fuzzy_keys
            .iter()
            .map(|k| strsim::jaro_winkler(&key, k))
            .fold(0.0f64, f64::max);

        if best >= FUZZY_MATCH_THRESHOLD {
            ReferenceMatch::Fuzzy
        } else {
            ReferenceMatch::None
        }
    }

    /// Canonical name for an exact/alias hit, if any.
    pub fn canonical_name(&self, legal_name: &str) -> Option<&str> {
        let key = normalize_entity_text(legal_name, true);
        self.names
            .get(&key)
            .or_else(|| self.aliases.get(&key))
            .map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_on_legal_name() {
        let index = Fortune500Index::seeded();
        assert_eq!(index.lookup("Apple Inc."), ReferenceMatch::Exact);
        // Suffix variation still matches the stripped core
        assert_eq!(index.lookup("Apple, Incorporated"), ReferenceMatch::Exact);
    }

    #[test]
    fn test_alias_match() {
        let index = Fortune500Index::seeded();
        assert_eq!(index.lookup("IBM"), ReferenceMatch::Exact);
        assert_eq!(
            index.canonical_name("IBM"),
            Some("International Business Machines Corporation")
        );
    }

    #[test]
    fn test_fuzzy_match() {
        let index = Fortune500Index::seeded();
        // Abbreviated form stays above the Jaro-Winkler threshold
        assert_eq!(index.lookup("Goldman Sachs Grp"), ReferenceMatch::Fuzzy);
    }

    #[test]
    fn test_no_match() {
        let index = Fortune500Index::seeded();
        assert_eq!(
            index.lookup("Obscure Widgets of Nowhere Ltd"),
            ReferenceMatch::None
        );
    }

    #[test]
    fn test_custom_entries() {
        let entries: [(&str, &[&str]); 1] = [("Acme Holdings SE", &["Acme"] as &[&str])];
        let index = Fortune500Index::from_entries(entries);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("Acme"), ReferenceMatch::Exact);
    }
}
