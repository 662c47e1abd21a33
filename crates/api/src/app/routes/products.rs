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

use bazaar_catalog::{NewProduct, Product};
use bazaar_core::ProductId;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySearchQuery {
    pub c: Option<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/market", get(list_market).post(create_product))
        .route("/market/category", get(list_by_category))
        .route("/categories", get(search_categories))
        .route("/product", get(get_product).put(update_stock))
}

pub async fn list_market(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.stock.list().await {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    // Presence checks in the order the original storefront ran them, so a
    // request missing several fields reports the same one it always did.
    fn blank(value: &Option<String>) -> bool {
        value.as_deref().map_or(true, |v| v.trim().is_empty())
    }
    fn missing(field: &str) -> axum::response::Response {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("Missing required field: {field}"),
        )
    }
    if blank(&body.desc) {
        return missing("desc");
    }
    if blank(&body.img) {
        return missing("img");
    }
    if body.price.is_none() {
        return missing("price");
    }
    if body.rating.is_none() {
        return missing("rating");
    }
    if blank(&body.title) {
        return missing("title");
    }
    if blank(&body.uid) {
        return missing("uid");
    }
    if blank(&body.nameseller) {
        return missing("nameseller");
    }
    if blank(&body.imgseller) {
        return missing("imgseller");
    }
    if blank(&body.category) {
        return missing("category");
    }
    let Some(stock) = body.stock.filter(|s| *s >= 0) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Stock must be a non-negative number",
        );
    };

    let seller_uid = match dto::to_user_id(body.uid.unwrap_or_default()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let input = NewProduct {
        id: ProductId::generate(),
        title: body.title.unwrap_or_default(),
        description: body.desc.unwrap_or_default(),
        image_url: body.img.unwrap_or_default(),
        price: body.price.unwrap_or_default(),
        rating: body.rating.unwrap_or_default(),
        stock,
        seller_uid,
        seller_name: body.nameseller.unwrap_or_default(),
        seller_image_url: body.imgseller.unwrap_or_default(),
        category: body.category.unwrap_or_default(),
    };

    let product = match Product::new(input, Utc::now()) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let stored = match services.stock.insert(product).await {
        Ok(p) => p,
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut response = dto::to_object(&stored);
    response.insert("message".into(), json!("Product created successfully"));
    (StatusCode::CREATED, Json(serde_json::Value::Object(response))).into_response()
}

pub async fn list_by_category(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<CategoryQuery>,
) -> axum::response::Response {
    let Some(category) = query.category.filter(|c| !c.is_empty()) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Category parameter is required",
        );
    };
    match services.stock.list_by_category(&category).await {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// The original exposed category search twice (`/categories?c=` and
/// `/market/category?category=`) with identical behavior; both land on the
/// same store operation here.
pub async fn search_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<CategorySearchQuery>,
) -> axum::response::Response {
    let Some(fragment) = query.c.filter(|c| !c.is_empty()) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Search query is required",
        );
    };
    match services.stock.list_by_category(&fragment).await {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ProductQuery>,
) -> axum::response::Response {
    let id = match require_product_id(query.id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.stock.get(&id).await {
        Ok(Some(product)) => (StatusCode::OK, Json(product)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "product_not_found", "Product not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// `PUT /product?id=` decrements stock by the bought quantity. The original
/// read the counter and wrote it back unchecked; here the conditional
/// decrement happens inside the store, so a racing purchase can no longer
/// drive the counter negative.
pub async fn update_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ProductQuery>,
    Json(body): Json<dto::UpdateStockRequest>,
) -> axum::response::Response {
    let id = match require_product_id(query.id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Some(quantity) = body.quantity.filter(|q| *q >= 0) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Valid quantity is required",
        );
    };

    match services.stock.decrement(&id, quantity).await {
        Ok(new_stock) => (
            StatusCode::OK,
            Json(json!({
                "message": "Stock updated successfully",
                "newStock": new_stock,
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn require_product_id(raw: Option<String>) -> Result<ProductId, axum::response::Response> {
    let Some(raw) = raw.filter(|id| !id.is_empty()) else {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Product ID is required",
        ));
    };
    dto::to_product_id(raw)
}
