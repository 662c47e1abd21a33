use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, OrderId, ProductId, UserId};

/// Shipping address attached to an order. `zipCode` keeps the wire name of
/// the original order documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "zipCode")]
    pub zip_code: String,
}

impl Address {
    pub fn validate(&self) -> DomainResult<()> {
        fn required(field: &'static str, value: &str) -> DomainResult<()> {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{field} cannot be empty")));
            }
            Ok(())
        }
        required("street", &self.street)?;
        required("city", &self.city)?;
        required("state", &self.state)?;
        required("zipCode", &self.zip_code)
    }
}

/// Order fulfilment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Fulfilment only moves forward. `Cancelled` is reachable from
    /// `Pending` alone: it is the compensating action of an aborted
    /// checkout, not a customer-facing transition.
    pub fn can_become(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Shipped, Delivered)
        )
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// Input for placing a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub id: OrderId,
    pub uid: UserId,
    pub items: BTreeMap<ProductId, i64>,
    pub address: Address,
    pub total_amount: u64,
}

/// A ledger entry: what was bought, by whom, shipped where, for how much.
///
/// The ledger is append-mostly. Once written, only `status` (and the
/// `updated_at` stamp that rides along with it) ever changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    uid: UserId,
    items: BTreeMap<ProductId, i64>,
    address: Address,
    #[serde(rename = "totalAmount")]
    total_amount: u64,
    status: OrderStatus,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Validate and record a new order. Every order starts out `pending`
    /// with a server-side `created_at`; client-supplied timestamps are
    /// never trusted.
    pub fn new(input: NewOrder, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.items.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        for (product_id, quantity) in &input.items {
            if *quantity < 1 {
                return Err(DomainError::invalid_item(format!(
                    "each item must have a positive quantity (got {quantity} for {product_id})"
                )));
            }
        }
        input.address.validate()?;

        Ok(Self {
            id: input.id,
            uid: input.uid,
            items: input.items,
            address: input.address,
            total_amount: input.total_amount,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: None,
        })
    }

    /// Rebuild an order from trusted storage without re-validating.
    pub fn rehydrate(
        id: OrderId,
        uid: UserId,
        items: BTreeMap<ProductId, i64>,
        address: Address,
        total_amount: u64,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            uid,
            items,
            address,
            total_amount,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn uid(&self) -> &UserId {
        &self.uid
    }

    pub fn items(&self) -> &BTreeMap<ProductId, i64> {
        &self.items
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Move the order along its lifecycle, stamping `updated_at`.
    pub fn with_status(&self, next: OrderStatus, now: DateTime<Utc>) -> DomainResult<Self> {
        if !self.status.can_become(next) {
            return Err(DomainError::conflict(format!(
                "order cannot move from {} to {}",
                self.status, next
            )));
        }
        let mut updated = self.clone();
        updated.status = next;
        updated.updated_at = Some(now);
        Ok(updated)
    }
}
