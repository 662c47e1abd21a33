//! Checkout run state machine.
//!
//! The orchestrator only moves through transitions this module allows; an
//! illegal hop is a bug surfaced as an invariant error, never silently
//! recorded.

use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult};

/// Where a checkout run currently stands.
///
/// Forward path: `Started → OrderCreated → {StockReconciled | StockPartial}
/// → {CartCleared | CartPartial} → Completed`. The hardened path bails out
/// through `Compensating → Aborted` once the order exists but the run
/// cannot be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    #[default]
    Started,
    OrderCreated,
    StockReconciled,
    StockPartial,
    CartCleared,
    CartPartial,
    Completed,
    Compensating,
    Aborted,
}

impl CheckoutState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CheckoutState::Completed | CheckoutState::Aborted)
    }

    pub fn can_advance_to(self, next: CheckoutState) -> bool {
        use CheckoutState::*;
        matches!(
            (self, next),
            (Started, OrderCreated)
                | (OrderCreated, StockReconciled)
                | (OrderCreated, StockPartial)
                | (StockReconciled, CartCleared)
                | (StockReconciled, CartPartial)
                | (StockPartial, CartCleared)
                | (StockPartial, CartPartial)
                | (StockPartial, Compensating)
                | (CartCleared, Completed)
                | (CartPartial, Completed)
                | (Compensating, Aborted)
        )
    }
}

impl core::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            CheckoutState::Started => "started",
            CheckoutState::OrderCreated => "order_created",
            CheckoutState::StockReconciled => "stock_reconciled",
            CheckoutState::StockPartial => "stock_partial",
            CheckoutState::CartCleared => "cart_cleared",
            CheckoutState::CartPartial => "cart_partial",
            CheckoutState::Completed => "completed",
            CheckoutState::Compensating => "compensating",
            CheckoutState::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// One checkout run's progress, with the transition trail it took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRun {
    state: CheckoutState,
    trail: Vec<CheckoutState>,
}

impl CheckoutRun {
    pub fn new() -> Self {
        Self {
            state: CheckoutState::Started,
            trail: vec![CheckoutState::Started],
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn trail(&self) -> &[CheckoutState] {
        &self.trail
    }

    pub fn advance(&mut self, next: CheckoutState) -> DomainResult<()> {
        if !self.state.can_advance_to(next) {
            return Err(DomainError::invariant(format!(
                "checkout cannot move from {} to {}",
                self.state, next
            )));
        }
        self.state = next;
        self.trail.push(next);
        Ok(())
    }
}

impl Default for CheckoutRun {
    fn default() -> Self {
        Self::new()
    }
}
