use reqwest::StatusCode;
use thiserror::Error;

/// Error bodies are cut to this many characters before they reach a log line
/// or a fallback reason.
const BODY_SNIPPET_CHARS: usize = 200;

/// Why a provider call did not produce usable data. Never returned to
/// gateway callers; it becomes the `reason` of a fallback.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Provider rate limit hit{}", .retry_after.map(|s| format!(", retry after {}s", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Provider unavailable (HTTP {status}): {body}")]
    Unavailable { status: u16, body: String },

    #[error("Provider rejected the request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unexpected response shape: {0}")]
    Schema(#[from] serde_json::Error),
}

impl GatewayError {
    /// Classify a non-success response. `retry_after` is the raw
    /// `Retry-After` header, honored only in its delay-seconds form.
    pub fn from_response(status: StatusCode, retry_after: Option<&str>, body: &str) -> Self {
        let body = snippet(body);
        if status == StatusCode::TOO_MANY_REQUESTS {
            return GatewayError::RateLimited {
                retry_after: retry_after.and_then(|v| v.trim().parse().ok()),
            };
        }
        if status.is_server_error() {
            GatewayError::Unavailable {
                status: status.as_u16(),
                body,
            }
        } else {
            GatewayError::Rejected {
                status: status.as_u16(),
                body,
            }
        }
    }

    /// Whether the same request might succeed later without any change.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited { .. }
                | GatewayError::Unavailable { .. }
                | GatewayError::Network(_)
        )
    }
}

/// Single-line prefix of a response body.
fn snippet(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= BODY_SNIPPET_CHARS {
        flat
    } else {
        let head: String = flat.chars().take(BODY_SNIPPET_CHARS).collect();
        format!("{}... ({} bytes)", head, body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            GatewayError::from_response(StatusCode::BAD_GATEWAY, None, "upstream"),
            GatewayError::Unavailable { status: 502, body } if body == "upstream"
        ));
        assert!(matches!(
            GatewayError::from_response(StatusCode::NOT_FOUND, None, ""),
            GatewayError::Rejected { status: 404, .. }
        ));
        assert!(matches!(
            GatewayError::from_response(StatusCode::FORBIDDEN, None, ""),
            GatewayError::Rejected { status: 403, .. }
        ));
    }

    #[test]
    fn test_rate_limit_retry_after() {
        let err = GatewayError::from_response(StatusCode::TOO_MANY_REQUESTS, Some(" 30 "), "");
        assert!(matches!(err, GatewayError::RateLimited { retry_after: Some(30) }));
        assert_eq!(err.to_string(), "Provider rate limit hit, retry after 30s");

        // HTTP-date form is not interpreted
        let err = GatewayError::from_response(
            StatusCode::TOO_MANY_REQUESTS,
            Some("Wed, 21 Oct 2015 07:28:00 GMT"),
            "",
        );
        assert!(matches!(err, GatewayError::RateLimited { retry_after: None }));
        assert_eq!(err.to_string(), "Provider rate limit hit");
    }

    #[test]
    fn test_transient_errors() {
        assert!(GatewayError::RateLimited { retry_after: None }.is_transient());
        assert!(GatewayError::from_response(StatusCode::SERVICE_UNAVAILABLE, None, "").is_transient());
        assert!(!GatewayError::from_response(StatusCode::BAD_REQUEST, None, "").is_transient());
        assert!(!GatewayError::InvalidResponse("empty".to_string()).is_transient());
    }

    #[test]
    fn test_long_body_is_flattened_and_cut() {
        let body = format!("<html>\n  {}\n</html>", "é".repeat(1000));
        match GatewayError::from_response(StatusCode::INTERNAL_SERVER_ERROR, None, &body) {
            GatewayError::Unavailable { body: snippet, .. } => {
                assert!(!snippet.contains('\n'));
                assert!(snippet.starts_with("<html> éé"));
                assert!(snippet.ends_with(&format!("... ({} bytes)", body.len())));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
