use std::collections::BTreeMap;

use axum::http::StatusCode;
use serde::Deserialize;

use bazaar_carts::CartItem;
use bazaar_core::{ProductId, UserId};
use bazaar_orders::Address;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------
//
// Fields the wire requires are still `Option` here: presence checks live in
// the handlers so a missing field gets the storefront's own error message
// instead of a serde rejection.

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub img: Option<String>,
    pub price: Option<u64>,
    pub rating: Option<f64>,
    pub stock: Option<i64>,
    pub uid: Option<String>,
    pub nameseller: Option<String>,
    pub imgseller: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub uid: Option<String>,
    /// productId -> quantity, the original order document shape.
    pub items: Option<BTreeMap<String, i64>>,
    pub address: Option<Address>,
    #[serde(rename = "totalAmount")]
    pub total_amount: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequestBody {
    pub uid: Option<String>,
    pub items: Option<BTreeMap<String, i64>>,
    pub address: Option<Address>,
    #[serde(rename = "totalAmount")]
    pub total_amount: Option<u64>,
    /// `"best_effort"` or `"atomic"`; absent means the service default.
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    #[serde(rename = "productId")]
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AddCartItemsRequest {
    pub uid: Option<String>,
    pub items: Option<Vec<CartItemRequest>>,
}

#[derive(Debug, Deserialize)]
pub struct SetCartQuantityRequest {
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub uid: Option<String>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

/// Serialize a record into a JSON object so handlers can splice extra
/// top-level fields (`message`, `orderId`, ...) into the response, the way
/// the original endpoints spread their documents.
pub fn to_object(record: &impl serde::Serialize) -> serde_json::Map<String, serde_json::Value> {
    match serde_json::to_value(record) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}

/// Validate and convert the cart-items array of `POST /inventory`.
pub fn to_cart_items(
    raw: Vec<CartItemRequest>,
) -> Result<Vec<CartItem>, axum::response::Response> {
    let mut items = Vec::with_capacity(raw.len());
    for entry in raw {
        let (Some(product_id), Some(quantity)) = (entry.product_id, entry.quantity) else {
            return Err(invalid_item_format());
        };
        if quantity < 1 {
            return Err(invalid_item_format());
        }
        let product_id = match ProductId::new(product_id) {
            Ok(id) => id,
            Err(_) => return Err(invalid_item_format()),
        };
        items.push(CartItem {
            product_id,
            quantity,
        });
    }
    Ok(items)
}

fn invalid_item_format() -> axum::response::Response {
    errors::json_error(
        StatusCode::BAD_REQUEST,
        "invalid_item",
        "Invalid item format. Each item must have productId and positive quantity",
    )
}

/// Convert a `productId -> quantity` wire map into typed ids.
pub fn to_product_map(
    raw: BTreeMap<String, i64>,
) -> Result<BTreeMap<ProductId, i64>, axum::response::Response> {
    let mut items = BTreeMap::new();
    for (key, quantity) in raw {
        let product_id = match ProductId::new(key) {
            Ok(id) => id,
            Err(e) => {
                return Err(errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    e.to_string(),
                ))
            }
        };
        items.insert(product_id, quantity);
    }
    Ok(items)
}

pub fn to_user_id(raw: String) -> Result<UserId, axum::response::Response> {
    UserId::new(raw).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string())
    })
}

pub fn to_product_id(raw: String) -> Result<ProductId, axum::response::Response> {
    ProductId::new(raw).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string())
    })
}
