//! Postgres-backed store implementations.
//!
//! Each store keeps its documents in its own table; there are no joins and
//! no foreign keys between them, mirroring the three independent stores
//! the rest of the system assumes. The stock decrement is a single
//! conditional `UPDATE`, so the availability check and the write cannot
//! interleave with another decrement of the same row.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use bazaar_carts::{Cart, CartItem};
use bazaar_catalog::Product;
use bazaar_core::{DomainError, OrderId, ProductId, UserId};
use bazaar_orders::{Address, Order, OrderStatus};

use super::{CartStore, OrderStore, StockStore, StoreError, StoreResult, UserRecord};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS market (
        id               TEXT PRIMARY KEY,
        title            TEXT NOT NULL,
        description      TEXT NOT NULL,
        image_url        TEXT NOT NULL,
        price            BIGINT NOT NULL CHECK (price >= 0),
        rating           DOUBLE PRECISION NOT NULL,
        stock            BIGINT NOT NULL CHECK (stock >= 0),
        seller_uid       TEXT NOT NULL,
        seller_name      TEXT NOT NULL,
        seller_image_url TEXT NOT NULL,
        category         TEXT NOT NULL,
        created_at       TIMESTAMPTZ NOT NULL,
        updated_at       TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        uid        TEXT PRIMARY KEY,
        inventory  JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id           TEXT PRIMARY KEY,
        uid          TEXT NOT NULL,
        items        JSONB NOT NULL,
        address      JSONB NOT NULL,
        total_amount BIGINT NOT NULL CHECK (total_amount >= 0),
        status       TEXT NOT NULL,
        created_at   TIMESTAMPTZ NOT NULL,
        updated_at   TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS orders_uid_created_idx ON orders (uid, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS market_category_idx ON market (category)",
];

/// Connect and make sure the three tables exist.
pub async fn connect(database_url: &str) -> StoreResult<PgPool> {
    let pool = PgPool::connect(database_url)
        .await
        .map_err(|err| StoreError::Unavailable(format!("database connection failed: {err}")))?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Idempotent schema bootstrap.
pub async fn ensure_schema(pool: &PgPool) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|err| map_sqlx_error("schema bootstrap", err))?;
    }
    tracing::debug!("database schema verified");
    Ok(())
}

fn map_sqlx_error(op: &'static str, err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(format!("{op} failed: {err}"))
}

fn decode_err(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(format!("row decode failed: {err}"))
}

fn row_to_product(row: &PgRow) -> StoreResult<Product> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let seller_uid: String = row.try_get("seller_uid").map_err(decode_err)?;
    let price: i64 = row.try_get("price").map_err(decode_err)?;
    let price = u64::try_from(price)
        .map_err(|_| StoreError::Unavailable(format!("negative price stored for {id}")))?;

    Ok(Product::rehydrate(
        ProductId::new(id)?,
        row.try_get("title").map_err(decode_err)?,
        row.try_get("description").map_err(decode_err)?,
        row.try_get("image_url").map_err(decode_err)?,
        price,
        row.try_get("rating").map_err(decode_err)?,
        row.try_get("stock").map_err(decode_err)?,
        UserId::new(seller_uid)?,
        row.try_get("seller_name").map_err(decode_err)?,
        row.try_get("seller_image_url").map_err(decode_err)?,
        row.try_get("category").map_err(decode_err)?,
        row.try_get("created_at").map_err(decode_err)?,
        row.try_get("updated_at").map_err(decode_err)?,
    ))
}

fn row_to_order(row: &PgRow) -> StoreResult<Order> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let uid: String = row.try_get("uid").map_err(decode_err)?;
    let Json(items): Json<BTreeMap<ProductId, i64>> =
        row.try_get("items").map_err(decode_err)?;
    let Json(address): Json<Address> = row.try_get("address").map_err(decode_err)?;
    let total_amount: i64 = row.try_get("total_amount").map_err(decode_err)?;
    let total_amount = u64::try_from(total_amount)
        .map_err(|_| StoreError::Unavailable(format!("negative total stored for {id}")))?;
    let status: String = row.try_get("status").map_err(decode_err)?;

    Ok(Order::rehydrate(
        OrderId::new(id)?,
        UserId::new(uid)?,
        items,
        address,
        total_amount,
        status.parse::<OrderStatus>()?,
        row.try_get("created_at").map_err(decode_err)?,
        row.try_get("updated_at").map_err(decode_err)?,
    ))
}

/// Postgres-backed catalog and stock counters.
#[derive(Debug, Clone)]
pub struct PostgresStockStore {
    pool: PgPool,
}

impl PostgresStockStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl StockStore for PostgresStockStore {
    async fn insert(&self, product: Product) -> StoreResult<Product> {
        let price = i64::try_from(product.price())
            .map_err(|_| DomainError::invariant("price exceeds storable range"))?;
        let result = sqlx::query(
            r#"
            INSERT INTO market
                (id, title, description, image_url, price, rating, stock,
                 seller_uid, seller_name, seller_image_url, category,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(product.id().as_str())
        .bind(product.title())
        .bind(product.description())
        .bind(product.image_url())
        .bind(price)
        .bind(product.rating())
        .bind(product.stock())
        .bind(product.seller_uid().as_str())
        .bind(product.seller_name())
        .bind(product.seller_image_url())
        .bind(product.category())
        .bind(product.created_at())
        .bind(product.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("insert product", err))?;

        if result.rows_affected() == 0 {
            return Err(
                DomainError::conflict(format!("product {} already exists", product.id())).into(),
            );
        }
        Ok(product)
    }

    async fn get(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query("SELECT * FROM market WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| map_sqlx_error("get product", err))?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query("SELECT * FROM market ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|err| map_sqlx_error("list products", err))?;
        rows.iter().map(row_to_product).collect()
    }

    async fn list_by_category(&self, fragment: &str) -> StoreResult<Vec<Product>> {
        // substring match on the category, case-insensitive
        let pattern = format!("%{}%", fragment.to_lowercase());
        let rows = sqlx::query(
            "SELECT * FROM market WHERE lower(category) LIKE $1 ORDER BY created_at DESC",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("list products by category", err))?;
        rows.iter().map(row_to_product).collect()
    }

    async fn decrement(&self, id: &ProductId, qty: i64) -> StoreResult<i64> {
        if qty < 0 {
            return Err(DomainError::validation("quantity cannot be negative").into());
        }

        // The availability check is part of the UPDATE predicate, so the
        // whole decrement is one atomic statement.
        let row = sqlx::query(
            r#"
            UPDATE market
            SET stock = stock - $2, updated_at = $3
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(id.as_str())
        .bind(qty)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("decrement stock", err))?;

        match row {
            Some(row) => row.try_get("stock").map_err(decode_err),
            None => {
                // zero rows matched: missing product or short counter
                let current = sqlx::query("SELECT stock FROM market WHERE id = $1")
                    .bind(id.as_str())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|err| map_sqlx_error("read stock", err))?;
                match current {
                    Some(row) => {
                        let available: i64 = row.try_get("stock").map_err(decode_err)?;
                        Err(DomainError::InsufficientStock { available }.into())
                    }
                    None => Err(StoreError::ProductNotFound),
                }
            }
        }
    }

    async fn restore(&self, id: &ProductId, qty: i64) -> StoreResult<i64> {
        if qty < 0 {
            return Err(DomainError::validation("quantity cannot be negative").into());
        }
        let row = sqlx::query(
            r#"
            UPDATE market
            SET stock = stock + $2, updated_at = $3
            WHERE id = $1
            RETURNING stock
            "#,
        )
        .bind(id.as_str())
        .bind(qty)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("restore stock", err))?;

        match row {
            Some(row) => row.try_get("stock").map_err(decode_err),
            None => Err(StoreError::ProductNotFound),
        }
    }
}

/// Postgres-backed user records and carts.
#[derive(Debug, Clone)]
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Read-modify-write on one user document, serialized by a row lock so
    /// concurrent cart updates for the same user cannot lose writes.
    async fn update_cart<F>(&self, uid: &UserId, apply: F) -> StoreResult<Cart>
    where
        F: FnOnce(&Cart) -> Result<Cart, StoreError> + Send,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| map_sqlx_error("begin cart update", err))?;

        let row = sqlx::query("SELECT inventory FROM users WHERE uid = $1 FOR UPDATE")
            .bind(uid.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|err| map_sqlx_error("load cart", err))?
            .ok_or(StoreError::UserNotFound)?;
        let Json(cart): Json<Cart> = row.try_get("inventory").map_err(decode_err)?;

        let updated = apply(&cart)?;

        sqlx::query("UPDATE users SET inventory = $2, updated_at = $3 WHERE uid = $1")
            .bind(uid.as_str())
            .bind(Json(&updated))
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|err| map_sqlx_error("write cart", err))?;

        tx.commit()
            .await
            .map_err(|err| map_sqlx_error("commit cart update", err))?;
        Ok(updated)
    }
}

#[async_trait::async_trait]
impl CartStore for PostgresCartStore {
    async fn create_user(&self, uid: &UserId) -> StoreResult<UserRecord> {
        let record = UserRecord::new(uid.clone(), Utc::now());
        let result = sqlx::query(
            r#"
            INSERT INTO users (uid, inventory, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (uid) DO NOTHING
            "#,
        )
        .bind(uid.as_str())
        .bind(Json(&record.cart))
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("create user", err))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::conflict(format!("user {uid} already exists")).into());
        }
        Ok(record)
    }

    async fn cart(&self, uid: &UserId) -> StoreResult<Cart> {
        let row = sqlx::query("SELECT inventory FROM users WHERE uid = $1")
            .bind(uid.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| map_sqlx_error("load cart", err))?
            .ok_or(StoreError::UserNotFound)?;
        let Json(cart): Json<Cart> = row.try_get("inventory").map_err(decode_err)?;
        Ok(cart)
    }

    async fn add_items(&self, uid: &UserId, items: &[CartItem]) -> StoreResult<Cart> {
        self.update_cart(uid, |cart| Ok(cart.merge_add(items)?)).await
    }

    async fn set_quantity(
        &self,
        uid: &UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> StoreResult<Cart> {
        self.update_cart(uid, |cart| Ok(cart.with_quantity(product_id, quantity)?))
            .await
    }

    async fn remove_item(&self, uid: &UserId, product_id: &ProductId) -> StoreResult<Cart> {
        self.update_cart(uid, |cart| {
            cart.without(product_id).map_err(|err| match err {
                DomainError::NotFound => StoreError::NotInCart,
                other => other.into(),
            })
        })
        .await
    }
}

/// Postgres-backed order ledger.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create(&self, order: Order) -> StoreResult<Order> {
        let total = i64::try_from(order.total_amount())
            .map_err(|_| DomainError::invariant("total exceeds storable range"))?;
        let result = sqlx::query(
            r#"
            INSERT INTO orders
                (id, uid, items, address, total_amount, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(order.id().as_str())
        .bind(order.uid().as_str())
        .bind(Json(order.items()))
        .bind(Json(order.address()))
        .bind(total)
        .bind(order.status().to_string())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("create order", err))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::conflict(format!("order {} already exists", order.id())).into());
        }
        Ok(order)
    }

    async fn get(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| map_sqlx_error("get order", err))?;
        row.as_ref().map(row_to_order).transpose()
    }

    async fn list_for_user(&self, uid: &UserId) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE uid = $1 ORDER BY created_at DESC")
            .bind(uid.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|err| map_sqlx_error("list orders", err))?;
        rows.iter().map(row_to_order).collect()
    }

    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> StoreResult<Order> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| map_sqlx_error("begin status update", err))?;

        let row = sqlx::query("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|err| map_sqlx_error("load order", err))?
            .ok_or(StoreError::OrderNotFound)?;
        let order = row_to_order(&row)?;

        let updated = order.with_status(status, Utc::now())?;
        sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id.as_str())
            .bind(updated.status().to_string())
            .bind(updated.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(|err| map_sqlx_error("write status", err))?;

        tx.commit()
            .await
            .map_err(|err| map_sqlx_error("commit status update", err))?;
        Ok(updated)
    }
}
