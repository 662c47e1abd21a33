use axum::Router;

pub mod checkout;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod system;
pub mod users;

/// Router for every storefront endpoint. Paths keep the original service's
/// flat shape: `/order`, `/product`, `/inventory`, `/market`, `/checkout`.
pub fn router() -> Router {
    Router::new()
        .merge(products::router())
        .merge(inventory::router())
        .merge(orders::router())
        .merge(checkout::router())
        .merge(users::router())
}
