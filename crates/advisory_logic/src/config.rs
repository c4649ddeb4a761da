//! Configuration for the resolution engine.
//!
//! The defaults reproduce the reference behaviour: first-complementary-pair
//! resolution, tautologies kept, iteration caps of 100 (proofs) and 50
//! (consistency checks). Stricter behaviour is opt-in.
//!
//! # Examples
//!
//! ```
//! # use advisory_logic::{EngineConfig, ResolutionStrategy};
//! let config = EngineConfig::default();
//! assert_eq!(config.prove_max_iterations, 100);
//! assert_eq!(config.strategy, ResolutionStrategy::FirstPair);
//!
//! let strict = EngineConfig::strict();
//! assert!(strict.discard_tautologies);
//! ```

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding [`EngineConfig::prove_max_iterations`].
pub const ENV_PROVE_MAX_ITERATIONS: &str = "ADVISORY_PROVE_MAX_ITERATIONS";
/// Environment variable overriding [`EngineConfig::consistency_max_iterations`].
pub const ENV_CONSISTENCY_MAX_ITERATIONS: &str = "ADVISORY_CONSISTENCY_MAX_ITERATIONS";
/// Environment variable overriding [`EngineConfig::strategy`] (`first_pair` or `all_pairs`).
pub const ENV_RESOLUTION_STRATEGY: &str = "ADVISORY_RESOLUTION_STRATEGY";
/// Environment variable overriding [`EngineConfig::discard_tautologies`].
pub const ENV_DISCARD_TAUTOLOGIES: &str = "ADVISORY_DISCARD_TAUTOLOGIES";
/// Environment variable overriding [`EngineConfig::exclusive_polarity_pairs`].
pub const ENV_EXCLUSIVE_POLARITY: &str = "ADVISORY_EXCLUSIVE_POLARITY";
/// Environment variable overriding [`EngineConfig::verbose_trace`].
pub const ENV_VERBOSE_TRACE: &str = "ADVISORY_VERBOSE_TRACE";

/// How two clauses are resolved against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Resolve on the first complementary pair only, in literal order.
    #[default]
    FirstPair,
    /// Produce one resolvent per complementary pair.
    AllPairs,
}

impl std::str::FromStr for ResolutionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first_pair" | "first" => Ok(ResolutionStrategy::FirstPair),
            "all_pairs" | "all" => Ok(ResolutionStrategy::AllPairs),
            other => Err(Error::InvalidConfig(format!(
                "unknown resolution strategy: {}",
                other
            ))),
        }
    }
}

/// Settings for a [`ResolutionEngine`](crate::engine::ResolutionEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Saturation passes allowed in `prove_by_contradiction`.
    pub prove_max_iterations: usize,
    /// Saturation passes allowed in `check_consistency`.
    pub consistency_max_iterations: usize,
    /// Binary resolution variant.
    pub strategy: ResolutionStrategy,
    /// Drop tautological clauses, whether loaded from a rule or derived as a
    /// resolvent, instead of adding them to the clause set.
    ///
    /// Changes observable results versus the reference behaviour.
    pub discard_tautologies: bool,
    /// Load a `¬a ∨ ¬b` clause for every polarity pair that applies in the
    /// loaded mode, so `Station_Closed_X` and `Station_Open_X` cannot both hold.
    /// See [`polarity_pairs_for_mode`](crate::KnowledgeBase::polarity_pairs_for_mode).
    ///
    /// Changes observable results versus the reference behaviour.
    pub exclusive_polarity_pairs: bool,
    /// Record every derived resolvent in proof traces.
    pub verbose_trace: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prove_max_iterations: 100,
            consistency_max_iterations: 50,
            strategy: ResolutionStrategy::FirstPair,
            discard_tautologies: false,
            exclusive_polarity_pairs: false,
            verbose_trace: false,
        }
    }
}

impl EngineConfig {
    /// Logically stricter settings: all-pairs resolution, tautology filtering
    /// and mutually exclusive polarity pairs.
    pub fn strict() -> Self {
        Self {
            strategy: ResolutionStrategy::AllPairs,
            discard_tautologies: true,
            exclusive_polarity_pairs: true,
            ..Self::default()
        }
    }

    /// Small iteration caps and verbose traces, for tests.
    pub fn test_mode() -> Self {
        Self {
            prove_max_iterations: 10,
            consistency_max_iterations: 10,
            verbose_trace: true,
            ..Self::default()
        }
    }

    /// Builds a configuration from the `ADVISORY_*` environment variables on top of
    /// the defaults. Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(n) = parse_var(&lookup, ENV_PROVE_MAX_ITERATIONS) {
            config.prove_max_iterations = n;
        }
        if let Some(n) = parse_var(&lookup, ENV_CONSISTENCY_MAX_ITERATIONS) {
            config.consistency_max_iterations = n;
        }
        if let Some(strategy) = parse_var(&lookup, ENV_RESOLUTION_STRATEGY) {
            config.strategy = strategy;
        }
        if let Some(flag) = parse_flag(&lookup, ENV_DISCARD_TAUTOLOGIES) {
            config.discard_tautologies = flag;
        }
        if let Some(flag) = parse_flag(&lookup, ENV_EXCLUSIVE_POLARITY) {
            config.exclusive_polarity_pairs = flag;
        }
        if let Some(flag) = parse_flag(&lookup, ENV_VERBOSE_TRACE) {
            config.verbose_trace = flag;
        }

        config
    }

    /// Checks that both iteration caps allow at least one pass.
    pub fn validate(&self) -> Result<()> {
        if self.prove_max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "prove_max_iterations must be at least 1".to_string(),
            ));
        }
        if self.consistency_max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "consistency_max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

fn parse_flag<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!("Ignoring {}={:?}: expected a boolean flag", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.prove_max_iterations, 100);
        assert_eq!(config.consistency_max_iterations, 50);
        assert!(!config.discard_tautologies);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (ENV_PROVE_MAX_ITERATIONS, "20"),
            (ENV_RESOLUTION_STRATEGY, "all_pairs"),
            (ENV_EXCLUSIVE_POLARITY, "yes"),
        ]));
        assert_eq!(config.prove_max_iterations, 20);
        assert_eq!(config.consistency_max_iterations, 50);
        assert_eq!(config.strategy, ResolutionStrategy::AllPairs);
        assert!(config.exclusive_polarity_pairs);
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (ENV_CONSISTENCY_MAX_ITERATIONS, "lots"),
            (ENV_VERBOSE_TRACE, "maybe"),
        ]));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_caps() {
        let config = EngineConfig {
            consistency_max_iterations: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"strategy": "all_pairs"}"#).unwrap();
        assert_eq!(config.strategy, ResolutionStrategy::AllPairs);
        assert_eq!(config.prove_max_iterations, 100);
    }
}
