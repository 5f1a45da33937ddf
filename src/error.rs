//! Error types returned by the request context.

use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Errors surfaced by [`crate::http::ConnectClient`] and the embedded-JSON helpers.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// HTTP 429 from the service. Never retried.
    #[error("Rate limited: {method} {url} returned 429 Too Many Requests")]
    RateLimited { method: Method, url: String },

    /// Any status other than 200/204/429.
    #[error("Request failed: {method} {url} returned {status}")]
    RequestFailed {
        status: StatusCode,
        method: Method,
        url: String,
    },

    /// Every attempt was rejected with 401/403.
    #[error("Authentication failed after {attempts} attempts: {source}")]
    AuthenticationFailed {
        attempts: usize,
        #[source]
        source: Box<ConnectError>,
    },

    /// The response did not contain what the caller asked for.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The token refresher could not produce a token.
    #[error("Token refresh failed: {0:#}")]
    TokenRefresh(#[source] anyhow::Error),

    /// A cookie or token that cannot be sent as a header value.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ConnectError {
    /// 401/403 rejections, the only failures the retry loop absorbs.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ConnectError::RequestFailed { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ConnectError::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            ConnectError::RequestFailed { status, .. } => Some(*status),
            ConnectError::AuthenticationFailed { source, .. } => source.status(),
            ConnectError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_failed(status: u16) -> ConnectError {
        ConnectError::RequestFailed {
            status: StatusCode::from_u16(status).unwrap(),
            method: Method::GET,
            url: "https://connect.example/userprofile".to_string(),
        }
    }

    #[test]
    fn test_is_auth_failure() {
        assert!(request_failed(401).is_auth_failure());
        assert!(request_failed(403).is_auth_failure());
        assert!(!request_failed(404).is_auth_failure());
        assert!(!request_failed(500).is_auth_failure());

        let err = ConnectError::RateLimited {
            method: Method::GET,
            url: "https://connect.example/".to_string(),
        };
        assert!(!err.is_auth_failure());
        assert!(!ConnectError::UnexpectedResponse("x".into()).is_auth_failure());
    }

    #[test]
    fn test_request_failed_display_includes_method_and_url() {
        let msg = request_failed(500).to_string();
        assert!(msg.contains("GET"));
        assert!(msg.contains("https://connect.example/userprofile"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn test_authentication_failed_wraps_source() {
        let err = ConnectError::AuthenticationFailed {
            attempts: 3,
            source: Box::new(request_failed(403)),
        };
        assert!(err.to_string().contains("after 3 attempts"));
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));

        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("403"));
    }

    #[test]
    fn test_status() {
        let err = ConnectError::RateLimited {
            method: Method::PUT,
            url: "https://connect.example/".to_string(),
        };
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(ConnectError::UnexpectedResponse("x".into()).status(), None);
    }

    #[test]
    fn test_token_refresh_display_keeps_context() {
        let inner = anyhow::anyhow!("connection refused").context("Failed to exchange cookie");
        let err = ConnectError::TokenRefresh(inner);
        let msg = err.to_string();
        assert!(msg.contains("Failed to exchange cookie"));
        assert!(msg.contains("connection refused"));
    }
}
