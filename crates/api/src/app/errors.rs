use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use bazaar_core::DomainError;
use bazaar_infra::stores::StoreError;

/// Map a storage error onto the wire. The not-found family keeps the
/// storefront's original message strings.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::UserNotFound => {
            json_error(StatusCode::NOT_FOUND, "user_not_found", "User not found")
        }
        StoreError::ProductNotFound => {
            json_error(StatusCode::NOT_FOUND, "product_not_found", "Product not found")
        }
        StoreError::NotInCart => json_error(
            StatusCode::NOT_FOUND,
            "not_in_cart",
            "Product not found in inventory",
        ),
        StoreError::OrderNotFound => {
            json_error(StatusCode::NOT_FOUND, "order_not_found", "Order not found")
        }
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Unavailable(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidItem(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_item", msg),
        DomainError::EmptyOrder => json_error(
            StatusCode::BAD_REQUEST,
            "empty_order",
            "Order must contain at least one item",
        ),
        DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::BAD_REQUEST, "insufficient_stock", "Insufficient stock")
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
