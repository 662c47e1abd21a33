use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/user", post(register_user))
}

/// Provision an empty user record. The original created these through its
/// identity provider; anything that needs a cart needs the record to exist.
pub async fn register_user(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterUserRequest>,
) -> axum::response::Response {
    let Some(uid) = body.uid.filter(|u| !u.is_empty()) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "Missing uid");
    };
    let uid = match dto::to_user_id(uid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.carts.create_user(&uid).await {
        Ok(record) => {
            let mut response = dto::to_object(&record);
            response.insert("message".into(), json!("User created successfully"));
            (StatusCode::CREATED, Json(serde_json::Value::Object(response))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
