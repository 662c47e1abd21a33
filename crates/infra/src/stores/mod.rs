//! Storage traits for the three independently-stored resources.
//!
//! The order ledger, the stock counters, and the per-user carts live in
//! three separate stores with no cross-store transactions. Anything that
//! must hold across two of them is the checkout orchestrator's job, not
//! the stores'.

pub mod in_memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_carts::{Cart, CartItem};
use bazaar_catalog::Product;
use bazaar_core::{DomainError, OrderId, ProductId, UserId};
use bazaar_orders::{Order, OrderStatus};

/// Storage operation error.
///
/// Missing-document outcomes are kept apart from domain rule violations so
/// the API layer can map each to its own status code. `Domain` wraps rule
/// violations raised while applying an update inside a store (for example a
/// cart batch that fails validation).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    UserNotFound,

    #[error("product not found")]
    ProductNotFound,

    #[error("product not in cart")]
    NotInCart,

    #[error("order not found")]
    OrderNotFound,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A stored user document: the cart plus its audit stamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: UserId,
    pub cart: Cart,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn new(uid: UserId, now: DateTime<Utc>) -> Self {
        Self {
            uid,
            cart: Cart::empty(),
            created_at: now,
            updated_at: None,
        }
    }
}

/// The product catalog and its authoritative per-product stock counters.
#[async_trait::async_trait]
pub trait StockStore: Send + Sync {
    /// Register a product. `Conflict` if the id is already taken.
    async fn insert(&self, product: Product) -> StoreResult<Product>;

    async fn get(&self, id: &ProductId) -> StoreResult<Option<Product>>;

    async fn list(&self) -> StoreResult<Vec<Product>>;

    /// Products whose category contains `fragment`, case-insensitively.
    async fn list_by_category(&self, fragment: &str) -> StoreResult<Vec<Product>>;

    /// Conditionally decrement a product's stock, returning the new counter.
    ///
    /// The `stock >= qty` check and the write happen in one critical
    /// section; two concurrent decrements of the same product can never
    /// both pass the check against the same counter value. Fails with
    /// `InsufficientStock` (stock untouched) when the counter would go
    /// negative.
    async fn decrement(&self, id: &ProductId, qty: i64) -> StoreResult<i64>;

    /// Add stock back, returning the new counter. The compensating action
    /// for an aborted checkout.
    async fn restore(&self, id: &ProductId, qty: i64) -> StoreResult<i64>;
}

/// The per-user cart documents.
#[async_trait::async_trait]
pub trait CartStore: Send + Sync {
    /// Provision a user record with an empty cart. `Conflict` if the uid is
    /// already registered.
    async fn create_user(&self, uid: &UserId) -> StoreResult<UserRecord>;

    /// The user's cart. A missing user is `UserNotFound`; an empty cart is
    /// a normal value, not an error.
    async fn cart(&self, uid: &UserId) -> StoreResult<Cart>;

    /// Add-or-increment a batch of lines. The batch is validated before
    /// any mutation; on failure the cart is untouched.
    async fn add_items(&self, uid: &UserId, items: &[CartItem]) -> StoreResult<Cart>;

    /// Overwrite one line's quantity; zero deletes the line.
    async fn set_quantity(
        &self,
        uid: &UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> StoreResult<Cart>;

    /// Remove one line. `NotInCart` if the product is not in the cart, so
    /// a repeated removal fails visibly instead of masking a double-clear.
    async fn remove_item(&self, uid: &UserId, product_id: &ProductId) -> StoreResult<Cart>;
}

/// The append-mostly order ledger.
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    /// Append an order to the ledger. Validity is the order type's concern;
    /// the ledger only refuses id collisions (`Conflict`).
    async fn create(&self, order: Order) -> StoreResult<Order>;

    async fn get(&self, id: &OrderId) -> StoreResult<Option<Order>>;

    /// Every order placed by `uid`. Result order is not contractual.
    async fn list_for_user(&self, uid: &UserId) -> StoreResult<Vec<Order>>;

    /// Move an order along its lifecycle, guarded by
    /// `OrderStatus::can_become`.
    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> StoreResult<Order>;
}
