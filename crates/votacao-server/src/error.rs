//! HTTP error mapping.
//!
//! Every failure becomes `{"ok": false, "message": ...}` with a status code
//! derived from the domain error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use votacao_core::error::VoteError;

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    /// Logged, never sent to the client.
    source: Option<anyhow::Error>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl From<VoteError> for ApiError {
    fn from(err: VoteError) -> Self {
        let status = match err {
            VoteError::MissingField(_) | VoteError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
            VoteError::NotFound { .. } => StatusCode::NOT_FOUND,
            VoteError::Forbidden(_) => StatusCode::FORBIDDEN,
            VoteError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            return Self::internal("internal error").with_source(anyhow::Error::new(err));
        }
        Self::new(status, err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("internal error").with_source(err)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    ok: bool,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    message = %self.message,
                    error = %format!("{source:#}"),
                    "request failed"
                ),
                None => tracing::error!(status = %self.status, message = %self.message, "request failed"),
            }
        }

        let body = ErrorBody {
            ok: false,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Unwrap an optional request field or fail with `MissingField`.
pub fn require(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| VoteError::missing(field).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use votacao_core::error::{Entity, Forbidden};

    #[test]
    fn status_mapping() {
        let cases = [
            (VoteError::missing("code"), StatusCode::BAD_REQUEST),
            (VoteError::InvalidRange { max: 5 }, StatusCode::BAD_REQUEST),
            (VoteError::not_found(Entity::Topic, "9"), StatusCode::NOT_FOUND),
            (VoteError::Forbidden(Forbidden::DuplicateStar), StatusCode::FORBIDDEN),
            (VoteError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn export_failure_is_a_generic_500() {
        let err = ApiError::from(VoteError::internal(
            "failed to export spreadsheet",
            anyhow::anyhow!("disk full"),
        ));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "internal error");
        let source = err.source.as_ref().unwrap().to_string();
        assert!(source.contains("failed to export spreadsheet: disk full"));
    }

    #[test]
    fn internal_message_is_generic() {
        let err = ApiError::from(VoteError::Internal("secret path".into()));
        assert_eq!(err.message(), "internal error");
        assert!(err.source.is_some());
    }

    #[test]
    fn require_trims_and_rejects_blank() {
        assert_eq!(require(Some(" 8 ".into()), "code").unwrap(), "8");
        let err = require(Some("  ".into()), "code").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "missing required field: code");
        assert!(require(None, "code").is_err());
    }

    #[test]
    fn display() {
        let err = ApiError::new(StatusCode::FORBIDDEN, "nope");
        assert_eq!(err.to_string(), "[403] nope");
    }
}
