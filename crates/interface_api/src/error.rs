//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain_ledger::{AuthorizationError, LedgerError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    /// Status code and stable error kind
    pub fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Ledger(err) => (ledger_status(err), err.kind()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        }
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::Validation(_) | LedgerError::BusinessRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::Authorization(AuthorizationError::AccountNotFound(_)) => StatusCode::NOT_FOUND,
        LedgerError::Authorization(AuthorizationError::Forbidden { .. }) => StatusCode::FORBIDDEN,
        LedgerError::Authorization(AuthorizationError::CurrencyMismatch { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LedgerError::TransactionNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::Conflict(_) => StatusCode::CONFLICT,
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        // Storage details stay in the logs
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: kind.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingPermission(role) => {
                ApiError::Forbidden(format!("missing permission {}", role))
            }
            _ => ApiError::Unauthorized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{AccountId, MinorUnits, PortError, TransactionId};
    use domain_ledger::{BusinessRuleError, ValidationError};

    fn status(err: LedgerError) -> StatusCode {
        ApiError::from(err).status_and_kind().0
    }

    #[test]
    fn test_ledger_errors_map_to_status_codes() {
        let account_id = AccountId::new();
        assert_eq!(
            status(ValidationError::InvalidEntryCount { count: 1 }.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(
                BusinessRuleError::InsufficientBalance {
                    account_id,
                    current: MinorUnits::zero(),
                    required_magnitude: MinorUnits::from(5),
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(AuthorizationError::AccountNotFound(account_id).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AuthorizationError::Forbidden { account_id }.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(LedgerError::TransactionNotFound(TransactionId::new())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(LedgerError::Conflict("busy".into())), StatusCode::CONFLICT);
        assert_eq!(
            status(LedgerError::Storage(PortError::internal("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_permission_is_forbidden() {
        let err = ApiError::from(AuthError::MissingPermission("ledger:repair".into()));
        assert_eq!(err.status_and_kind(), (StatusCode::FORBIDDEN, "forbidden"));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let err = ApiError::from(AuthError::TokenExpired);
        assert_eq!(err.status_and_kind().0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_storage_details_are_not_returned() {
        let err = ApiError::from(LedgerError::Storage(PortError::internal("relation missing")));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "storage");
        assert_eq!(body.message, "Internal server error");
    }
}
