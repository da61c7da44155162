//! Stable error taxonomy for the eligibility engine (spec.md §7).

use thiserror::Error;

/// Classification of a failed FHIR search, per spec.md §7 `query_failed:<kind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFailureKind {
    Network,
    Timeout,
    Http4xx,
    Http5xx,
}

impl std::fmt::Display for QueryFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Http4xx => "http_4xx",
            Self::Http5xx => "http_5xx",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("schema_invalid: {0}")]
    SchemaInvalid(String),

    #[error("llm_unavailable: {0}")]
    LlmUnavailable(String),

    #[error("llm_output_malformed: {0}")]
    LlmOutputMalformed(String),

    #[error("depth_exceeded: depth {depth} exceeds limit {limit}")]
    DepthExceeded { depth: usize, limit: usize },

    #[error("query_failed:{kind}: {detail}")]
    QueryFailed {
        kind: QueryFailureKind,
        detail: String,
    },

    #[error("evaluator_error:{category}: {detail}")]
    EvaluatorError { category: String, detail: String },

    #[error("unknown_category: {0}")]
    UnknownCategory(String),

    #[error("unknown_operator: {0}")]
    UnknownOperator(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("http client construction failed: {0}")]
    HttpClientInit(String),

    #[error("cache backend error: {0}")]
    Cache(String),

    #[error(transparent)]
    Http(#[from] reqwest_middleware::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// The stable identifier prefix used in `reason` strings (spec.md §7),
    /// independent of any dynamic detail appended after it.
    pub fn stable_reason(&self) -> String {
        match self {
            Self::SchemaInvalid(_) => "schema_invalid".to_string(),
            Self::LlmUnavailable(_) => "llm_unavailable".to_string(),
            Self::LlmOutputMalformed(_) => "llm_output_malformed".to_string(),
            Self::DepthExceeded { .. } => "depth_exceeded".to_string(),
            Self::QueryFailed { kind, .. } => format!("query_failed:{kind}"),
            Self::EvaluatorError { category, .. } => format!("evaluator_error:{category}"),
            Self::UnknownCategory(_) => "unknown_category".to_string(),
            Self::UnknownOperator(_) => "unknown_operator".to_string(),
            Self::InvalidArgument(_) => "invalid_argument".to_string(),
            Self::HttpClientInit(_) => "http_client_init".to_string(),
            Self::Cache(_) => "cache_error".to_string(),
            Self::Http(_) => "http_error".to_string(),
            Self::Json(_) => "json_error".to_string(),
        }
    }
}
