//! Checkout orchestration across the three stores.
//!
//! Checkout is the one place where the order ledger, the stock counters,
//! and the user's cart must be made to agree, and there is no transaction
//! spanning them. The orchestrator runs the flow as an explicit saga:
//! create the order first (the commit point), then reconcile stock, then
//! clear the cart, reporting per line what happened. Under the `Atomic`
//! policy a failed stock phase is compensated by restoring every applied
//! decrement and cancelling the order.
//!
//! Ordering guarantees, and nothing more:
//! - order creation happens before any stock decrement;
//! - a line's cart removal starts only after its decrement was
//!   acknowledged (the cart phase begins when the whole stock phase has
//!   resolved);
//! - decrements of different lines run concurrently and carry no mutual
//!   order, as do cart removals.

pub mod state;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use bazaar_core::{DomainError, OrderId, ProductId, UserId};
use bazaar_orders::{Address, NewOrder, Order, OrderStatus};

use crate::stores::{CartStore, OrderStore, StockStore, StoreError, StoreResult};

pub use state::{CheckoutRun, CheckoutState};

/// What a completed-but-imperfect checkout is allowed to leave behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPolicy {
    /// Order creation is the commit point; per-line failures after it are
    /// reported, never rolled back.
    #[default]
    BestEffort,
    /// All lines or none: a failed stock phase restores every applied
    /// decrement and cancels the order.
    Atomic,
}

impl core::str::FromStr for CheckoutPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best_effort" => Ok(CheckoutPolicy::BestEffort),
            "atomic" => Ok(CheckoutPolicy::Atomic),
            other => Err(DomainError::validation(format!(
                "unknown checkout policy: {other}"
            ))),
        }
    }
}

impl core::fmt::Display for CheckoutPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CheckoutPolicy::BestEffort => f.write_str("best_effort"),
            CheckoutPolicy::Atomic => f.write_str("atomic"),
        }
    }
}

/// A checkout submission: the cart snapshot the buyer confirmed.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub uid: UserId,
    pub items: BTreeMap<ProductId, i64>,
    pub address: Address,
    /// The total the client showed the buyer, if it sent one. It is only
    /// verified against the server-computed total, never charged.
    pub declared_total: Option<u64>,
    pub policy: Option<CheckoutPolicy>,
}

/// What happened to one step of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Applied,
    Failed,
    Skipped,
    /// Applied first, then undone by compensation.
    Reverted,
}

/// Per-line account of the stock and cart steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineReport {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(rename = "unitPrice")]
    pub unit_price: u64,
    pub stock: StepStatus,
    pub cart: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The terminal result of a checkout run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub state: CheckoutState,
    pub policy: CheckoutPolicy,
    #[serde(rename = "totalAmount")]
    pub total_amount: u64,
    pub lines: Vec<LineReport>,
}

impl CheckoutOutcome {
    pub fn aborted(&self) -> bool {
        self.state == CheckoutState::Aborted
    }
}

struct PricedLine {
    product_id: ProductId,
    quantity: i64,
    unit_price: u64,
}

/// The checkout saga runner.
pub struct CheckoutService {
    stock: Arc<dyn StockStore>,
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    default_policy: CheckoutPolicy,
}

impl CheckoutService {
    pub fn new(
        stock: Arc<dyn StockStore>,
        carts: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        default_policy: CheckoutPolicy,
    ) -> Self {
        Self {
            stock,
            carts,
            orders,
            default_policy,
        }
    }

    /// Run one checkout.
    ///
    /// Everything up to order creation is side-effect free: a returned
    /// error before that point means nothing was written anywhere. From
    /// the moment the order exists, failures are reported in the outcome
    /// (or compensated under `Atomic`), never raised as errors.
    #[instrument(skip_all, fields(uid = %request.uid), err)]
    pub async fn checkout(&self, request: CheckoutRequest) -> StoreResult<CheckoutOutcome> {
        let policy = request.policy.unwrap_or(self.default_policy);

        if request.items.is_empty() {
            return Err(DomainError::EmptyOrder.into());
        }
        for (product_id, quantity) in &request.items {
            if *quantity < 1 {
                return Err(DomainError::invalid_item(format!(
                    "each item must have a positive quantity (got {quantity} for {product_id})"
                ))
                .into());
            }
        }
        // the cart document must exist even though the submitted snapshot
        // is what gets ordered
        self.carts.cart(&request.uid).await?;

        let (priced, total) = self.price_lines(&request.items).await?;
        if let Some(declared) = request.declared_total {
            if declared != total {
                return Err(DomainError::validation(format!(
                    "totalAmount mismatch: client declared {declared}, server computed {total}"
                ))
                .into());
            }
        }

        // commit point: from here on the order exists
        let order = Order::new(
            NewOrder {
                id: OrderId::generate(),
                uid: request.uid.clone(),
                items: request.items.clone(),
                address: request.address.clone(),
                total_amount: total,
            },
            Utc::now(),
        )?;
        let order = self.orders.create(order).await?;

        let mut run = CheckoutRun::new();
        run.advance(CheckoutState::OrderCreated)?;
        info!(order_id = %order.id(), %policy, total, "order created");

        // stock phase: all decrements in flight at once
        let decrements = join_all(priced.iter().map(|line| {
            let stock = &self.stock;
            async move { stock.decrement(&line.product_id, line.quantity).await }
        }))
        .await;

        let mut lines: Vec<LineReport> = Vec::with_capacity(priced.len());
        for (line, result) in priced.iter().zip(decrements) {
            match result {
                Ok(_) => lines.push(LineReport {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    stock: StepStatus::Applied,
                    cart: StepStatus::Skipped,
                    reason: None,
                }),
                Err(err) => {
                    warn!(
                        order_id = %order.id(),
                        product_id = %line.product_id,
                        %err,
                        "stock decrement failed"
                    );
                    lines.push(LineReport {
                        product_id: line.product_id.clone(),
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                        stock: StepStatus::Failed,
                        cart: StepStatus::Skipped,
                        reason: Some(err.to_string()),
                    });
                }
            }
        }

        let stock_failed = lines.iter().any(|line| line.stock == StepStatus::Failed);
        if stock_failed {
            run.advance(CheckoutState::StockPartial)?;
            if policy == CheckoutPolicy::Atomic {
                run.advance(CheckoutState::Compensating)?;
                let status = self.compensate(&order, &priced, &mut lines).await;
                run.advance(CheckoutState::Aborted)?;
                info!(order_id = %order.id(), state = %run.state(), "checkout aborted");
                return Ok(CheckoutOutcome {
                    order_id: order.id().clone(),
                    status,
                    state: run.state(),
                    policy,
                    total_amount: total,
                    lines,
                });
            }
        } else {
            run.advance(CheckoutState::StockReconciled)?;
        }

        // cart phase: only lines whose decrement was acknowledged
        let cleared: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.stock == StepStatus::Applied)
            .map(|(idx, _)| idx)
            .collect();
        let removals = join_all(cleared.iter().map(|&idx| {
            let carts = &self.carts;
            let uid = &request.uid;
            let product_id = &priced[idx].product_id;
            async move { carts.remove_item(uid, product_id).await }
        }))
        .await;

        for (&idx, result) in cleared.iter().zip(removals) {
            match result {
                Ok(_) => lines[idx].cart = StepStatus::Applied,
                Err(err) => {
                    warn!(
                        order_id = %order.id(),
                        product_id = %lines[idx].product_id,
                        %err,
                        "cart removal failed"
                    );
                    lines[idx].cart = StepStatus::Failed;
                    if lines[idx].reason.is_none() {
                        lines[idx].reason = Some(err.to_string());
                    }
                }
            }
        }

        let cart_failed = lines.iter().any(|line| line.cart == StepStatus::Failed);
        run.advance(if cart_failed || stock_failed {
            CheckoutState::CartPartial
        } else {
            CheckoutState::CartCleared
        })?;
        run.advance(CheckoutState::Completed)?;
        info!(order_id = %order.id(), state = %run.state(), "checkout completed");

        Ok(CheckoutOutcome {
            order_id: order.id().clone(),
            status: order.status(),
            state: run.state(),
            policy,
            total_amount: total,
            lines,
        })
    }

    /// Price every line against the catalog. An unknown product fails the
    /// whole request; arithmetic is checked so a hostile quantity cannot
    /// wrap the total.
    async fn price_lines(
        &self,
        items: &BTreeMap<ProductId, i64>,
    ) -> StoreResult<(Vec<PricedLine>, u64)> {
        let fetched = join_all(items.iter().map(|(product_id, quantity)| {
            let stock = &self.stock;
            async move { (product_id, *quantity, stock.get(product_id).await) }
        }))
        .await;

        let mut priced = Vec::with_capacity(items.len());
        let mut total: u64 = 0;
        for (product_id, quantity, result) in fetched {
            let product = result?.ok_or(StoreError::ProductNotFound)?;
            let unit_price = product.price();
            let qty = u64::try_from(quantity)
                .map_err(|_| DomainError::invalid_item("quantity out of range"))?;
            let line_total = unit_price
                .checked_mul(qty)
                .ok_or_else(|| DomainError::invariant("order total overflow"))?;
            total = total
                .checked_add(line_total)
                .ok_or_else(|| DomainError::invariant("order total overflow"))?;
            priced.push(PricedLine {
                product_id: product_id.clone(),
                quantity,
                unit_price,
            });
        }
        Ok((priced, total))
    }

    /// Undo a partially-applied stock phase and cancel the order. Errors
    /// here are logged and the run still terminates; a stuck counter is
    /// preferable to a hung checkout.
    async fn compensate(
        &self,
        order: &Order,
        priced: &[PricedLine],
        lines: &mut [LineReport],
    ) -> OrderStatus {
        let applied: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.stock == StepStatus::Applied)
            .map(|(idx, _)| idx)
            .collect();

        let restores = join_all(applied.iter().map(|&idx| {
            let stock = &self.stock;
            let line = &priced[idx];
            async move { stock.restore(&line.product_id, line.quantity).await }
        }))
        .await;

        for (&idx, result) in applied.iter().zip(restores) {
            match result {
                Ok(_) => lines[idx].stock = StepStatus::Reverted,
                Err(err) => error!(
                    order_id = %order.id(),
                    product_id = %priced[idx].product_id,
                    %err,
                    "stock restore failed"
                ),
            }
        }

        match self
            .orders
            .set_status(order.id(), OrderStatus::Cancelled)
            .await
        {
            Ok(cancelled) => cancelled.status(),
            Err(err) => {
                error!(order_id = %order.id(), %err, "order cancellation failed");
                order.status()
            }
        }
    }
}
