//! The "inventory" endpoints: the original storefront's name for the
//! per-user cart kept on the user document.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use bazaar_carts::Cart;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    pub uid: Option<String>,
    #[serde(rename = "productId")]
    pub product_id: Option<String>,
}

pub fn router() -> Router {
    Router::new().route(
        "/inventory",
        post(add_items)
            .get(get_inventory)
            .put(set_quantity)
            .delete(remove_item),
    )
}

fn inventory_body(message: impl Into<String>, cart: &Cart) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(json!({
            "message": message.into(),
            "inventory": cart,
        })),
    )
        .into_response()
}

pub async fn add_items(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AddCartItemsRequest>,
) -> axum::response::Response {
    let uid = body.uid.filter(|u| !u.is_empty());
    let items = body.items.filter(|i| !i.is_empty());
    let (Some(uid), Some(items)) = (uid, items) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Missing or invalid fields: uid and items (array of products with quantities)",
        );
    };
    let count = items.len();
    let items = match dto::to_cart_items(items) {
        Ok(items) => items,
        Err(resp) => return resp,
    };
    let uid = match dto::to_user_id(uid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.carts.add_items(&uid, &items).await {
        Ok(cart) => inventory_body(
            format!("{count} items updated in inventory successfully"),
            &cart,
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<InventoryQuery>,
) -> axum::response::Response {
    let Some(uid) = query.uid.filter(|u| !u.is_empty()) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "Missing uid");
    };
    let uid = match dto::to_user_id(uid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.carts.cart(&uid).await {
        Ok(cart) => inventory_body("Inventory retrieved successfully", &cart),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn set_quantity(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<InventoryQuery>,
    Json(body): Json<dto::SetCartQuantityRequest>,
) -> axum::response::Response {
    let uid = query.uid.filter(|u| !u.is_empty());
    let product_id = query.product_id.filter(|p| !p.is_empty());
    let quantity = body.quantity.filter(|q| *q >= 0);
    let (Some(uid), Some(product_id), Some(quantity)) = (uid, product_id, quantity) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Missing or invalid parameters",
        );
    };
    let uid = match dto::to_user_id(uid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let product_id = match dto::to_product_id(product_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.carts.set_quantity(&uid, &product_id, quantity).await {
        Ok(cart) => inventory_body("Inventory updated successfully", &cart),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<InventoryQuery>,
) -> axum::response::Response {
    let uid = query.uid.filter(|u| !u.is_empty());
    let product_id = query.product_id.filter(|p| !p.is_empty());
    let (Some(uid), Some(product_id)) = (uid, product_id) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Missing parameters",
        );
    };
    let uid = match dto::to_user_id(uid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let product_id = match dto::to_product_id(product_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.carts.remove_item(&uid, &product_id).await {
        Ok(cart) => inventory_body("Item removed from inventory successfully", &cart),
        Err(e) => errors::store_error_to_response(e),
    }
}
