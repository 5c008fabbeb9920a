use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::workflow::WorkflowViolation;

/// Stage of the type resolution cascade that failed. Each resolution
/// failure is tagged with exactly the first broken link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionStage {
    Product,
    ProductType,
    VariationType,
    OrderItemType,
    OrderType,
}

impl std::fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolutionStage::Product => "product",
            ResolutionStage::ProductType => "product type",
            ResolutionStage::VariationType => "variation type",
            ResolutionStage::OrderItemType => "order item type",
            ResolutionStage::OrderType => "order type",
        };
        f.write_str(s)
    }
}

/// Error taxonomy for the checkout pipeline. Lower components return these
/// typed errors; the orchestrator and handlers decide user-facing
/// messaging versus operator logging. No variant is retried automatically.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A broken link in the type resolution cascade. A configuration
    /// defect, not transient; surfaced to the user as "unavailable".
    #[error("type resolution failed at the {0} stage")]
    Resolution(ResolutionStage),

    /// No payment gateway passed the eligibility filter for the order.
    #[error("no eligible payment gateways for order {0}")]
    NoEligibleGateways(Uuid),

    /// The gateway referenced by the submitted payment option can no
    /// longer be loaded.
    #[error("payment gateway {0} is no longer available")]
    GatewayGone(String),

    /// The gateway refused or failed the payment execution. The order is
    /// left in draft; nothing is persisted.
    #[error("payment execution failed: {0}")]
    PaymentExecution(String),

    #[error(transparent)]
    WorkflowViolation(#[from] WorkflowViolation),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Generic user-facing message for payment failures. Deliberately vague so
/// payment configuration details never reach the end user.
const GENERIC_PAYMENT_ERROR: &str =
    "An unexpected error has occurred, please try again. If the error persists, contact us.";

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CheckoutError::Resolution(_) => (
                StatusCode::NOT_FOUND,
                "This product is not available for purchase here.".to_string(),
            ),
            CheckoutError::NoEligibleGateways(_)
            | CheckoutError::GatewayGone(_)
            | CheckoutError::PaymentExecution(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERIC_PAYMENT_ERROR.to_string(),
            ),
            CheckoutError::WorkflowViolation(_) | CheckoutError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            CheckoutError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            CheckoutError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message,
            "timestamp": Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_names_its_stage() {
        let err = CheckoutError::Resolution(ResolutionStage::OrderItemType);
        assert_eq!(
            err.to_string(),
            "type resolution failed at the order item type stage"
        );
    }

    #[test]
    fn payment_errors_map_to_internal_server_error() {
        let resp = CheckoutError::NoEligibleGateways(Uuid::new_v4()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = CheckoutError::PaymentExecution("declined".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn resolution_errors_map_to_not_found() {
        let resp = CheckoutError::Resolution(ResolutionStage::Product).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
