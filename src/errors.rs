//! Typed error hierarchy for the dashboard.
//!
//! Two top-level enums cover the two layers:
//! - `ApiError` — a single REST call against the platform API
//! - `ListError` — outcomes of list-controller operations surfaced to the user

use thiserror::Error;

/// Errors from one request against the platform REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 304: the cached view is still valid. Never shown to the user.
    #[error("Not modified")]
    NotModified,

    #[error("Request failed with status {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },

    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("No '{key}' page link is available")]
    MissingPageLink { key: String },

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn is_not_modified(&self) -> bool {
        matches!(self, ApiError::NotModified)
    }

    /// HTTP status of the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotModified => Some(304),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The `{message}` carried in the server's error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                message: Some(m), ..
            } if !m.is_empty() => Some(m),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }
}

/// Errors from list-controller operations.
#[derive(Debug, Error)]
pub enum ListError {
    /// Bulk action requested with nothing selected; no request was issued.
    #[error("No {noun} selected.")]
    EmptySelection { noun: &'static str },

    /// Some of the concurrent deletes failed. The page was still refreshed.
    #[error("{failed} of {total} deletes failed")]
    PartialDeleteFailure { failed: usize, total: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_modified_is_matchable_and_reports_304() {
        let err = ApiError::NotModified;
        assert!(err.is_not_modified());
        assert_eq!(err.status(), Some(304));
        assert!(err.server_message().is_none());
    }

    #[test]
    fn status_error_carries_server_message() {
        let err = ApiError::Status {
            status: 500,
            message: Some("boom".into()),
        };
        assert!(!err.is_not_modified());
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.server_message(), Some("boom"));
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn empty_server_message_is_treated_as_absent() {
        let err = ApiError::Status {
            status: 404,
            message: Some(String::new()),
        };
        assert!(err.server_message().is_none());
    }

    #[test]
    fn empty_selection_names_the_entity() {
        let err = ListError::EmptySelection { noun: "factory" };
        assert_eq!(err.to_string(), "No factory selected.");
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ApiError::NotModified);
        assert_std_error(&ListError::PartialDeleteFailure { failed: 1, total: 3 });
        assert_std_error(&ListError::EmptySelection { noun: "workspace" });
    }
}
