//! Environment-driven configuration (spec.md §6.5). Every field has a
//! documented default and `EngineConfig::default()` never touches the
//! environment, so the engine is embeddable and testable without env setup.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum tree depth accepted by the validator and evaluator.
    pub max_criteria_depth: usize,
    /// Cache entry lifetime in days.
    pub cache_ttl_days: u64,

    /// Model identifier passed to the LLM client.
    pub llm_model_id: String,
    /// Sampling temperature for the compiler's draft call.
    pub llm_temperature: f32,
    /// Per-call timeout for LLM invocations.
    pub llm_timeout: Duration,
    /// Base URL of the LLM chat-completions endpoint.
    pub llm_endpoint: String,

    /// Base URL of the FHIR R4 datastore.
    pub fhir_endpoint: String,
    /// Per-call timeout for FHIR searches.
    pub fhir_timeout: Duration,
    /// Bounded retry count for transient FHIR failures.
    pub fhir_max_retries: u32,

    /// When `Some(n)`, leaves within a group are dispatched with up to
    /// `n` concurrent FHIR queries in flight. `None` evaluates leaves
    /// sequentially. Either mode preserves `results[]` ordering.
    pub leaf_concurrency: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_criteria_depth: 10,
            cache_ttl_days: 7,
            llm_model_id: "claude-sonnet".to_string(),
            llm_temperature: 0.1,
            llm_timeout: Duration::from_secs(60),
            llm_endpoint: "http://localhost:4000/v1/messages".to_string(),
            fhir_endpoint: "http://localhost:8080/fhir".to_string(),
            fhir_timeout: Duration::from_secs(10),
            fhir_max_retries: 3,
            leaf_concurrency: None,
        }
    }
}

impl EngineConfig {
    /// Reads recognized environment variables, falling back to the
    /// documented defaults in spec.md §6.5 for anything unset or
    /// unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_criteria_depth: env_usize("MAX_CRITERIA_DEPTH", defaults.max_criteria_depth),
            cache_ttl_days: env_u64("CACHE_TTL_DAYS", defaults.cache_ttl_days),
            llm_model_id: env::var("LLM_MODEL_ID").unwrap_or(defaults.llm_model_id),
            llm_temperature: env_f32("LLM_TEMPERATURE", defaults.llm_temperature),
            llm_timeout: Duration::from_secs(env_u64(
                "LLM_TIMEOUT_S",
                defaults.llm_timeout.as_secs(),
            )),
            llm_endpoint: env::var("LLM_ENDPOINT").unwrap_or(defaults.llm_endpoint),
            fhir_endpoint: env::var("FHIR_ENDPOINT").unwrap_or(defaults.fhir_endpoint),
            fhir_timeout: Duration::from_secs(env_u64(
                "FHIR_TIMEOUT_S",
                defaults.fhir_timeout.as_secs(),
            )),
            fhir_max_retries: env_u32("FHIR_MAX_RETRIES", defaults.fhir_max_retries),
            leaf_concurrency: defaults.leaf_concurrency,
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_criteria_depth, 10);
        assert_eq!(cfg.cache_ttl_days, 7);
        assert_eq!(cfg.llm_temperature, 0.1);
        assert_eq!(cfg.llm_timeout, Duration::from_secs(60));
        assert_eq!(cfg.fhir_timeout, Duration::from_secs(10));
        assert_eq!(cfg.fhir_max_retries, 3);
    }
}
