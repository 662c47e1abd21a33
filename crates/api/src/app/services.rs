//! Infrastructure wiring: which store implementations back the API and the
//! checkout orchestrator that coordinates them.

use std::sync::Arc;

use bazaar_infra::checkout::{CheckoutPolicy, CheckoutService};
use bazaar_infra::stores::in_memory::{InMemoryCartStore, InMemoryOrderStore, InMemoryStockStore};
use bazaar_infra::stores::postgres::{
    self, PostgresCartStore, PostgresOrderStore, PostgresStockStore,
};
use bazaar_infra::stores::{CartStore, OrderStore, StockStore};

use crate::config::ApiConfig;

/// Everything the handlers need, behind trait objects so the in-memory and
/// Postgres wirings look the same from a route's point of view.
pub struct AppServices {
    pub stock: Arc<dyn StockStore>,
    pub carts: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderStore>,
    pub checkout: Arc<CheckoutService>,
}

pub async fn build_services(config: &ApiConfig) -> AppServices {
    if config.use_persistent_stores {
        build_persistent_services(config).await
    } else {
        build_in_memory_services(config)
    }
}

fn build_in_memory_services(config: &ApiConfig) -> AppServices {
    let stock: Arc<dyn StockStore> = Arc::new(InMemoryStockStore::new());
    let carts: Arc<dyn CartStore> = Arc::new(InMemoryCartStore::new());
    let orders: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());
    wire(stock, carts, orders, config.checkout_policy)
}

async fn build_persistent_services(config: &ApiConfig) -> AppServices {
    let database_url = config
        .database_url
        .as_deref()
        .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");

    let pool = postgres::connect(database_url)
        .await
        .expect("failed to connect to Postgres");

    let stock: Arc<dyn StockStore> = Arc::new(PostgresStockStore::new(pool.clone()));
    let carts: Arc<dyn CartStore> = Arc::new(PostgresCartStore::new(pool.clone()));
    let orders: Arc<dyn OrderStore> = Arc::new(PostgresOrderStore::new(pool));
    wire(stock, carts, orders, config.checkout_policy)
}

fn wire(
    stock: Arc<dyn StockStore>,
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    default_policy: CheckoutPolicy,
) -> AppServices {
    let checkout = Arc::new(CheckoutService::new(
        stock.clone(),
        carts.clone(),
        orders.clone(),
        default_policy,
    ));
    AppServices {
        stock,
        carts,
        orders,
        checkout,
    }
}
