//! In-memory store implementations for tests and development.
//!
//! Plain `RwLock<HashMap>` maps. Every mutation takes the write lock for
//! the full read-check-write, which is what makes the stock decrement
//! atomic here; nothing awaits while a lock is held.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use bazaar_carts::{Cart, CartItem};
use bazaar_catalog::Product;
use bazaar_core::{DomainError, OrderId, ProductId, UserId};
use bazaar_orders::{Order, OrderStatus};

use super::{CartStore, OrderStore, StockStore, StoreError, StoreResult, UserRecord};

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
}

/// In-memory catalog and stock counters.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StockStore for InMemoryStockStore {
    async fn insert(&self, product: Product) -> StoreResult<Product> {
        let mut products = write(&self.products)?;
        if products.contains_key(product.id()) {
            return Err(DomainError::conflict(format!(
                "product {} already exists",
                product.id()
            ))
            .into());
        }
        products.insert(product.id().clone(), product.clone());
        Ok(product)
    }

    async fn get(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        Ok(read(&self.products)?.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        let mut all: Vec<Product> = read(&self.products)?.values().cloned().collect();
        all.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(all)
    }

    async fn list_by_category(&self, fragment: &str) -> StoreResult<Vec<Product>> {
        let needle = fragment.to_lowercase();
        let mut matching: Vec<Product> = read(&self.products)?
            .values()
            .filter(|p| p.category().to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(matching)
    }

    async fn decrement(&self, id: &ProductId, qty: i64) -> StoreResult<i64> {
        // read-check-write under one write lock
        let mut products = write(&self.products)?;
        let product = products.get(id).ok_or(StoreError::ProductNotFound)?;
        let updated = product.decremented(qty, Utc::now())?;
        let new_stock = updated.stock();
        products.insert(id.clone(), updated);
        Ok(new_stock)
    }

    async fn restore(&self, id: &ProductId, qty: i64) -> StoreResult<i64> {
        let mut products = write(&self.products)?;
        let product = products.get(id).ok_or(StoreError::ProductNotFound)?;
        let updated = product.restocked(qty, Utc::now())?;
        let new_stock = updated.stock();
        products.insert(id.clone(), updated);
        Ok(new_stock)
    }
}

/// In-memory user records and carts.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_cart<F>(&self, uid: &UserId, apply: F) -> StoreResult<Cart>
    where
        F: FnOnce(&Cart) -> Result<Cart, StoreError>,
    {
        let mut users = write(&self.users)?;
        let record = users.get_mut(uid).ok_or(StoreError::UserNotFound)?;
        let updated = apply(&record.cart)?;
        record.cart = updated.clone();
        record.updated_at = Some(Utc::now());
        Ok(updated)
    }
}

#[async_trait::async_trait]
impl CartStore for InMemoryCartStore {
    async fn create_user(&self, uid: &UserId) -> StoreResult<UserRecord> {
        let mut users = write(&self.users)?;
        if users.contains_key(uid) {
            return Err(DomainError::conflict(format!("user {uid} already exists")).into());
        }
        let record = UserRecord::new(uid.clone(), Utc::now());
        users.insert(uid.clone(), record.clone());
        Ok(record)
    }

    async fn cart(&self, uid: &UserId) -> StoreResult<Cart> {
        read(&self.users)?
            .get(uid)
            .map(|record| record.cart.clone())
            .ok_or(StoreError::UserNotFound)
    }

    async fn add_items(&self, uid: &UserId, items: &[CartItem]) -> StoreResult<Cart> {
        self.update_cart(uid, |cart| Ok(cart.merge_add(items)?))
    }

    async fn set_quantity(
        &self,
        uid: &UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> StoreResult<Cart> {
        self.update_cart(uid, |cart| Ok(cart.with_quantity(product_id, quantity)?))
    }

    async fn remove_item(&self, uid: &UserId, product_id: &ProductId) -> StoreResult<Cart> {
        self.update_cart(uid, |cart| {
            cart.without(product_id).map_err(|err| match err {
                DomainError::NotFound => StoreError::NotInCart,
                other => other.into(),
            })
        })
    }
}

/// In-memory order ledger.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: Order) -> StoreResult<Order> {
        let mut orders = write(&self.orders)?;
        if orders.contains_key(order.id()) {
            return Err(DomainError::conflict(format!("order {} already exists", order.id())).into());
        }
        orders.insert(order.id().clone(), order.clone());
        Ok(order)
    }

    async fn get(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        Ok(read(&self.orders)?.get(id).cloned())
    }

    async fn list_for_user(&self, uid: &UserId) -> StoreResult<Vec<Order>> {
        let mut matching: Vec<Order> = read(&self.orders)?
            .values()
            .filter(|order| order.uid() == uid)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(matching)
    }

    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> StoreResult<Order> {
        let mut orders = write(&self.orders)?;
        let order = orders.get(id).ok_or(StoreError::OrderNotFound)?;
        let updated = order.with_status(status, Utc::now())?;
        orders.insert(id.clone(), updated.clone());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use bazaar_catalog::NewProduct;

    fn pid(s: &str) -> ProductId {
        ProductId::new(s).unwrap()
    }

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn test_product(id: &str, category: &str, stock: i64) -> Product {
        Product::new(
            NewProduct {
                id: pid(id),
                title: format!("product {id}"),
                description: "test".to_string(),
                image_url: "https://img.example/p.png".to_string(),
                price: 1_000,
                rating: 4.0,
                stock,
                seller_uid: uid("seller"),
                seller_name: "Seller".to_string(),
                seller_image_url: "https://img.example/s.png".to_string(),
                category: category.to_string(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn item(p: &str, quantity: i64) -> CartItem {
        CartItem {
            product_id: pid(p),
            quantity,
        }
    }

    #[tokio::test]
    async fn insert_rejects_a_duplicate_product_id() {
        let store = InMemoryStockStore::new();
        store.insert(test_product("p1", "games", 3)).await.unwrap();
        let err = store.insert(test_product("p1", "games", 3)).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn category_filter_matches_substrings_case_insensitively() {
        let store = InMemoryStockStore::new();
        store.insert(test_product("p1", "Board Games", 3)).await.unwrap();
        store.insert(test_product("p2", "electronics", 3)).await.unwrap();

        let hits = store.list_by_category("game").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), &pid("p1"));
    }

    #[tokio::test]
    async fn decrement_returns_the_new_counter_and_stops_at_zero() {
        let store = InMemoryStockStore::new();
        store.insert(test_product("p1", "games", 5)).await.unwrap();

        assert_eq!(store.decrement(&pid("p1"), 2).await.unwrap(), 3);
        let err = store.decrement(&pid("p1"), 4).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InsufficientStock { available: 3 })
        ));
        // the failed decrement left the counter untouched
        assert_eq!(store.get(&pid("p1")).await.unwrap().unwrap().stock(), 3);
    }

    #[tokio::test]
    async fn decrement_of_a_missing_product_is_product_not_found() {
        let store = InMemoryStockStore::new();
        assert!(matches!(
            store.decrement(&pid("ghost"), 1).await.unwrap_err(),
            StoreError::ProductNotFound
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_decrements_never_oversell() {
        let store = Arc::new(InMemoryStockStore::new());
        store.insert(test_product("p1", "games", 10)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..7 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.decrement(&pid("p1"), 2).await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }

        // 7 buyers of 2 against a counter of 10: exactly 5 can win
        assert_eq!(wins, 5);
        assert_eq!(store.get(&pid("p1")).await.unwrap().unwrap().stock(), 0);
    }

    #[tokio::test]
    async fn cart_operations_require_a_provisioned_user() {
        let store = InMemoryCartStore::new();
        assert!(matches!(
            store.cart(&uid("u1")).await.unwrap_err(),
            StoreError::UserNotFound
        ));
        assert!(matches!(
            store.add_items(&uid("u1"), &[item("p1", 1)]).await.unwrap_err(),
            StoreError::UserNotFound
        ));
    }

    #[tokio::test]
    async fn create_user_is_not_idempotent() {
        let store = InMemoryCartStore::new();
        store.create_user(&uid("u1")).await.unwrap();
        assert!(matches!(
            store.create_user(&uid("u1")).await.unwrap_err(),
            StoreError::Domain(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn removing_an_absent_cart_line_is_not_in_cart() {
        let store = InMemoryCartStore::new();
        store.create_user(&uid("u1")).await.unwrap();
        store.add_items(&uid("u1"), &[item("p1", 2)]).await.unwrap();

        store.remove_item(&uid("u1"), &pid("p1")).await.unwrap();
        assert!(matches!(
            store.remove_item(&uid("u1"), &pid("p1")).await.unwrap_err(),
            StoreError::NotInCart
        ));
    }

    #[tokio::test]
    async fn a_rejected_batch_leaves_the_stored_cart_untouched() {
        let store = InMemoryCartStore::new();
        store.create_user(&uid("u1")).await.unwrap();
        store.add_items(&uid("u1"), &[item("p1", 2)]).await.unwrap();

        let err = store
            .add_items(&uid("u1"), &[item("p2", 1), item("p3", 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::InvalidItem(_))));

        let cart = store.cart(&uid("u1")).await.unwrap();
        assert_eq!(cart.quantity(&pid("p1")), Some(2));
        assert!(!cart.contains(&pid("p2")));
    }

    #[tokio::test]
    async fn set_status_applies_the_lifecycle_guard() {
        let store = InMemoryOrderStore::new();
        let order = bazaar_orders::Order::new(
            bazaar_orders::NewOrder {
                id: OrderId::new("o1").unwrap(),
                uid: uid("u1"),
                items: [(pid("p1"), 1)].into_iter().collect(),
                address: bazaar_orders::Address {
                    street: "1 Main".to_string(),
                    city: "Town".to_string(),
                    state: "TS".to_string(),
                    zip_code: "0001".to_string(),
                },
                total_amount: 1_000,
            },
            Utc::now(),
        )
        .unwrap();
        store.create(order).await.unwrap();

        let id = OrderId::new("o1").unwrap();
        store.set_status(&id, OrderStatus::Processing).await.unwrap();
        let err = store.set_status(&id, OrderStatus::Pending).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));
    }
}
