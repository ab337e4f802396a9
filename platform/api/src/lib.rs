use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use platform_authz::{AuthzError, Decision, Reason};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Shared handler result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("resource not found")]
    NotFound,
    #[error("forbidden: {reason}")]
    Forbidden { reason: Reason },
    #[error("bad request: {0}")]
    InvalidInput(String),
    #[error("internal server error")]
    Internal(Arc<anyhow::Error>),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Forbidden { reason } => reason.as_str(),
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::Internal(Arc::new(err))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::internal(value)
    }
}

impl From<AuthzError> for ApiError {
    fn from(value: AuthzError) -> Self {
        Self::internal(value.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            error!(error = %err, "request failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Translate a policy decision into the HTTP error contract.
///
/// `hide_existence` must be true only on read paths where a 403 would
/// confirm that the resource exists.
pub fn require(decision: Decision, hide_existence: bool) -> ApiResult<()> {
    if decision.is_allow() {
        return Ok(());
    }
    match decision.reason {
        Reason::NoRule => Err(ApiError::internal(anyhow!(
            "no rule registered for an exposed route"
        ))),
        Reason::TenantMismatch | Reason::NotOwner if hide_existence => Err(ApiError::NotFound),
        reason => Err(ApiError::Forbidden { reason }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_masked() {
        let err = ApiError::internal(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "internal server error");
        assert_eq!(err.code(), "INTERNAL");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn denials_carry_the_reason_code() {
        assert!(require(Decision::allow(), false).is_ok());
        let err = require(Decision::deny(Reason::MissingPermission), false).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "MISSING_PERMISSION");
    }

    #[test]
    fn hidden_denials_read_as_missing() {
        let err = require(Decision::deny(Reason::TenantMismatch), true).unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let err = require(Decision::deny(Reason::NotOwner), true).unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        // Hiding never masks a plain permission denial.
        let err = require(Decision::deny(Reason::MissingPermission), true).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn unregistered_routes_surface_as_internal() {
        let err = require(Decision::deny(Reason::NoRule), false).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "INTERNAL");
    }
}
