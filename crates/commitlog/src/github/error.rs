//! GitHub API error types.

use serde::Deserialize;
use thiserror::Error;

use crate::http::{HttpError, HttpResponse};

/// Errors that can occur when fetching from the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// No usable access token was supplied; raised before any request.
    #[error("GitHub access token is missing or empty")]
    MissingToken,

    /// The API answered with a non-200 status. Carries the raw response.
    #[error("GitHub API error ({}): {}", response.status, short_body(response))]
    Api { response: HttpResponse },

    #[error("Invalid commit query: {0}")]
    InvalidQuery(String),

    #[error("GitHub transport error: {0}")]
    Transport(#[from] HttpError),

    #[error("GitHub JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

impl GitHubError {
    /// HTTP status of the failed response, if this is an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { response } => Some(response.status),
            _ => None,
        }
    }

    /// The `message` field GitHub puts in error bodies, if present.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Api { response } => response
                .json::<ApiMessage>()
                .ok()
                .map(|body| body.message),
            _ => None,
        }
    }

    /// The raw failed response, for diagnostics.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Self::Api { response } => Some(response),
            _ => None,
        }
    }
}

fn short_body(response: &HttpResponse) -> String {
    let body = String::from_utf8_lossy(&response.body);
    let line = body.lines().next().unwrap_or_default();
    if line.chars().count() > 200 {
        line.chars().take(200).collect::<String>() + "..."
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> GitHubError {
        GitHubError::Api {
            response: HttpResponse {
                status: 404,
                headers: Vec::new(),
                body: br#"{"message":"Not Found","documentation_url":"https://docs.github.com"}"#
                    .to_vec(),
            },
        }
    }

    #[test]
    fn api_error_exposes_status_and_message() {
        let err = not_found();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message().as_deref(), Some("Not Found"));
        assert_eq!(err.response().map(|r| r.status), Some(404));
    }

    #[test]
    fn api_error_display_includes_status() {
        let msg = not_found().to_string();
        assert!(msg.contains("404"), "unexpected message: {msg}");
        assert!(msg.contains("Not Found"), "unexpected message: {msg}");
    }

    #[test]
    fn message_is_none_for_non_json_body() {
        let err = GitHubError::Api {
            response: HttpResponse {
                status: 502,
                headers: Vec::new(),
                body: b"<html>bad gateway</html>".to_vec(),
            },
        };
        assert_eq!(err.message(), None);
    }

    #[test]
    fn non_api_errors_have_no_status() {
        assert_eq!(GitHubError::MissingToken.status(), None);
        assert!(GitHubError::MissingToken.response().is_none());
        let transport: GitHubError = HttpError::Transport("reset".to_string()).into();
        assert_eq!(transport.status(), None);
    }
}
