use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use bazaar_core::OrderId;
use bazaar_orders::{NewOrder, Order};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub uid: Option<String>,
}

pub fn router() -> Router {
    Router::new().route("/order", get(list_orders).post(create_order))
}

/// Direct order creation. The declared total is stored as sent; only the
/// checkout flow verifies totals against the catalog.
pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateOrderRequest>,
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

    let order = match Order::new(
        NewOrder {
            id: OrderId::generate(),
            uid,
            items,
            address,
            total_amount: body.total_amount.unwrap_or(0),
        },
        Utc::now(),
    ) {
        Ok(order) => order,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let stored = match services.orders.create(order).await {
        Ok(order) => order,
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut response = dto::to_object(&stored);
    response.insert("message".into(), json!("Order created successfully"));
    response.insert("orderId".into(), json!(stored.id()));
    (StatusCode::CREATED, Json(serde_json::Value::Object(response))).into_response()
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<OrderListQuery>,
) -> axum::response::Response {
    let Some(uid) = query.uid.filter(|u| !u.is_empty()) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Missing uid parameter",
        );
    };
    let uid = match dto::to_user_id(uid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.orders.list_for_user(&uid).await {
        Ok(orders) => (StatusCode::OK, Json(json!({ "orders": orders }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
