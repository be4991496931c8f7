//! Resolution pipeline configuration
//!
//! Thresholds and limits for the Level 2 pipeline. Loaded from a TOML
//! file when `DOMAIN_INTEL_CONFIG` points at one, with individual env
//! overrides for the knobs that get tuned in deployment. Scoring weights
//! are deliberately NOT configurable; they are fixed constants in the
//! scoring module with an invariant test.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Tunable parameters for one resolver instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Level 1 confidence below which an extracted name warrants Level 2.
    pub low_confidence_threshold: u8,
    /// Top candidate must score at least this to auto-select.
    pub auto_select_threshold: f64,
    /// Top candidate must beat the runner-up by at least this margin.
    pub min_margin: f64,
    /// Normalizer output cap; excess candidates are dropped.
    pub max_candidates: usize,
    /// Bounded retries for the registry lookup.
    pub max_lookup_attempts: u32,
    /// Base delay for exponential backoff.
    pub backoff_base_ms: u64,
    /// Upper bound on a single backoff sleep.
    pub backoff_cap_ms: u64,
    /// Minimum spacing between registry requests (shared pacer).
    pub rate_limit_delay_ms: u64,
    /// Page size requested from the registry search endpoint.
    pub search_page_size: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: 70,
            auto_select_threshold: 75.0,
            min_margin: 10.0,
            max_candidates: 25,
            max_lookup_attempts: 3,
            backoff_base_ms: 250,
            backoff_cap_ms: 5_000,
            rate_limit_delay_ms: 200, // 5 req/sec to be safe
            search_page_size: 50,
        }
    }
}

impl ResolutionConfig {
    /// Load from TOML, falling back to defaults for missing keys.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve config from the environment: `DOMAIN_INTEL_CONFIG` names a
    /// TOML file, individual `DOMAIN_INTEL_*` vars override single knobs.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var("DOMAIN_INTEL_CONFIG") {
            Ok(path) => Self::from_toml_file(path)?,
            Err(_) => Self::default(),
        };

        if let Some(v) = env_parse("DOMAIN_INTEL_AUTO_SELECT_THRESHOLD") {
            config.auto_select_threshold = v;
        }
        if let Some(v) = env_parse("DOMAIN_INTEL_MIN_MARGIN") {
            config.min_margin = v;
        }
        if let Some(v) = env_parse("DOMAIN_INTEL_MAX_CANDIDATES") {
            config.max_candidates = v;
        }
        if let Some(v) = env_parse("DOMAIN_INTEL_MAX_LOOKUP_ATTEMPTS") {
            config.max_lookup_attempts = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.low_confidence_threshold <= 100,
            "low_confidence_threshold must be 0-100, got {}",
            self.low_confidence_threshold
        );
        anyhow::ensure!(
            (0.0..=100.0).contains(&self.auto_select_threshold),
            "auto_select_threshold must be 0-100, got {}",
            self.auto_select_threshold
        );
        anyhow::ensure!(
            self.min_margin >= 0.0,
            "min_margin must be non-negative, got {}",
            self.min_margin
        );
        anyhow::ensure!(self.max_candidates > 0, "max_candidates must be positive");
        anyhow::ensure!(
            self.max_lookup_attempts > 0,
            "max_lookup_attempts must be positive"
        );
        Ok(())
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
