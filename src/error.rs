//! Service-level error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::catalog::StockFetchError;
use crate::checkout::CheckoutError;
use crate::domain::aggregates::cart::CartError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Stock(#[from] StockFetchError),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::BadRequest(errors.to_string())
    }
}

impl ServiceError {
    /// HTTP status for each error class:
    /// - not found: 404
    /// - bad request / cart validation: 400
    /// - checkout gate refusals: 409 (the shopper must adjust and resubmit)
    /// - payment provider failure: 502
    /// - stock source unavailable: 503
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::Cart(CartError::LineNotFound) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Cart(_) => StatusCode::BAD_REQUEST,
            Self::Checkout(CheckoutError::Gateway(_)) => StatusCode::BAD_GATEWAY,
            Self::Checkout(_) => StatusCode::CONFLICT,
            Self::Stock(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServiceError::NotFound("product".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Cart(CartError::ZeroQuantity).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Cart(CartError::LineNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Checkout(CheckoutError::StockConflict).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::Checkout(CheckoutError::Gateway("declined".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
