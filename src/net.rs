//! Shared HTTP plumbing used by the FHIR Gateway and the LLM client: a
//! single retrying middleware client, a body reader with a size cap, and
//! an excerpt helper for error messages, so neither caller re-implements
//! connection handling.

use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::error::{EngineError, QueryFailureKind};

/// Response bodies larger than this are rejected rather than buffered
/// in full; FHIR bundles and LLM completions are both bounded in
/// practice and a misbehaving server should not exhaust memory.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Builds a `reqwest-middleware` client with bounded exponential-backoff
/// retries on transient failures and the given per-request timeout.
pub fn retrying_client(
    timeout: Duration,
    max_retries: u32,
) -> Result<ClientWithMiddleware, EngineError> {
    let inner = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| EngineError::HttpClientInit(e.to_string()))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
    Ok(ClientBuilder::new(inner)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Reads a response body, enforcing [`MAX_BODY_BYTES`] and classifying
/// transport-level failures per spec.md §7's `query_failed:<kind>` set.
pub async fn read_body_capped(
    resp: reqwest::Response,
    api: &str,
) -> Result<(reqwest::StatusCode, Vec<u8>), EngineError> {
    let status = resp.status();
    if let Some(len) = resp.content_length()
        && len as usize > MAX_BODY_BYTES
    {
        return Err(EngineError::QueryFailed {
            kind: QueryFailureKind::Network,
            detail: format!("{api}: response body too large ({len} bytes)"),
        });
    }
    let bytes = resp.bytes().await.map_err(|e| {
        let kind = if e.is_timeout() {
            QueryFailureKind::Timeout
        } else {
            QueryFailureKind::Network
        };
        EngineError::QueryFailed {
            kind,
            detail: format!("{api}: {e}"),
        }
    })?;
    if bytes.len() > MAX_BODY_BYTES {
        return Err(EngineError::QueryFailed {
            kind: QueryFailureKind::Network,
            detail: format!("{api}: response body too large ({} bytes)", bytes.len()),
        });
    }
    Ok((status, bytes.to_vec()))
}

/// First `n` bytes of a response body, decoded lossily, for embedding in
/// error messages without risking megabytes of HTML in a log line.
pub fn body_excerpt(bytes: &[u8]) -> String {
    const MAX_EXCERPT: usize = 400;
    let text = String::from_utf8_lossy(bytes);
    if text.chars().count() <= MAX_EXCERPT {
        text.into_owned()
    } else {
        let truncated: String = text.chars().take(MAX_EXCERPT).collect();
        format!("{truncated}…")
    }
}

/// Maps an HTTP status to a `query_failed:<kind>` classification.
pub fn classify_status(status: reqwest::StatusCode) -> QueryFailureKind {
    if status.is_server_error() {
        QueryFailureKind::Http5xx
    } else {
        QueryFailureKind::Http4xx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_excerpt_passes_short_text_through() {
        assert_eq!(body_excerpt(b"hello"), "hello");
    }

    #[test]
    fn body_excerpt_truncates_long_text() {
        let long = "a".repeat(1000);
        let excerpt = body_excerpt(long.as_bytes());
        assert!(excerpt.ends_with('…'));
        assert!(excerpt.len() < long.len());
    }

    #[test]
    fn classify_status_distinguishes_4xx_and_5xx() {
        assert_eq!(
            classify_status(reqwest::StatusCode::NOT_FOUND),
            QueryFailureKind::Http4xx
        );
        assert_eq!(
            classify_status(reqwest::StatusCode::BAD_GATEWAY),
            QueryFailureKind::Http5xx
        );
    }
}
