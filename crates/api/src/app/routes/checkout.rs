use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;

use bazaar_infra::checkout::{CheckoutPolicy, CheckoutRequest};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/checkout", post(run_checkout))
}

/// Server-side home of the flow the original storefront ran from its cart
/// page (create order, then per item decrement stock and drop the cart
/// entry). One request, one orchestrated run, one per-line report back.
pub async fn run_checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CheckoutRequestBody>,
) -> axum::response::Response {
    let uid = body.uid.filter(|u| !u.is_empty());
    let (Some(uid), Some(items), Some(address)) = (uid, body.items, body.address) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Missing required fields: uid, items, or address",
        );
    };
    let uid = match dto::to_user_id(uid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let items = match dto::to_product_map(items) {
        Ok(items) => items,
        Err(resp) => return resp,
    };
    let policy = match body.mode.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<CheckoutPolicy>() {
            Ok(policy) => Some(policy),
            Err(e) => return errors::domain_error_to_response(e),
        },
    };

    let request = CheckoutRequest {
        uid,
        items,
        address,
        declared_total: body.total_amount,
        policy,
    };

    let outcome = match services.checkout.checkout(request).await {
        Ok(outcome) => outcome,
        Err(e) => return errors::store_error_to_response(e),
    };

    if outcome.aborted() {
        // The order was cancelled and every applied decrement restored; the
        // report shows which line ran dry.
        let mut response = dto::to_object(&outcome);
        response.insert("error".into(), json!("insufficient_stock"));
        response.insert("message".into(), json!("Insufficient stock"));
        return (StatusCode::BAD_REQUEST, Json(serde_json::Value::Object(response)))
            .into_response();
    }

    (StatusCode::CREATED, Json(outcome)).into_response()
}
