use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, ProductId};

/// One requested line: a product and a desired quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A per-user cart: product id → desired quantity.
///
/// Invariant: every key present maps to a quantity >= 1. Setting an entry to
/// zero deletes it rather than retaining a zero.
///
/// Serializes as the plain `{ "<productId>": quantity }` map the original
/// inventory documents used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: BTreeMap<ProductId, i64>,
}

impl Cart {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rebuild a cart from trusted storage without re-validating.
    pub fn rehydrate(entries: BTreeMap<ProductId, i64>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn quantity(&self, product_id: &ProductId) -> Option<i64> {
        self.entries.get(product_id).copied()
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.entries.contains_key(product_id)
    }

    pub fn entries(&self) -> &BTreeMap<ProductId, i64> {
        &self.entries
    }

    /// Validate a batch of requested lines without touching the cart.
    ///
    /// Every line must carry a quantity >= 1; the whole batch is rejected on
    /// the first offender so callers never apply a partial batch.
    pub fn validate_items(items: &[CartItem]) -> DomainResult<()> {
        if items.is_empty() {
            return Err(DomainError::invalid_item("items cannot be empty"));
        }
        for item in items {
            if item.quantity < 1 {
                return Err(DomainError::invalid_item(format!(
                    "each item must have a positive quantity (got {} for {})",
                    item.quantity, item.product_id
                )));
            }
        }
        Ok(())
    }

    /// Add-or-increment a batch of lines: `cart[p] = existing + qty`, with a
    /// missing entry treated as zero. Only the given keys change.
    pub fn merge_add(&self, items: &[CartItem]) -> DomainResult<Self> {
        Self::validate_items(items)?;

        let mut updated = self.clone();
        for item in items {
            let current = updated.entries.get(&item.product_id).copied().unwrap_or(0);
            let next = current
                .checked_add(item.quantity)
                .ok_or_else(|| DomainError::invariant("cart quantity overflow"))?;
            updated.entries.insert(item.product_id.clone(), next);
        }
        Ok(updated)
    }

    /// Overwrite one entry's quantity. Zero deletes the entry.
    pub fn with_quantity(&self, product_id: &ProductId, quantity: i64) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        let mut updated = self.clone();
        if quantity == 0 {
            updated.entries.remove(product_id);
        } else {
            updated.entries.insert(product_id.clone(), quantity);
        }
        Ok(updated)
    }

    /// Remove one entry. Fails if the product is not currently in the cart,
    /// so a second removal of the same key is a visible `NotFound`.
    pub fn without(&self, product_id: &ProductId) -> DomainResult<Self> {
        if !self.entries.contains_key(product_id) {
            return Err(DomainError::NotFound);
        }
        let mut updated = self.clone();
        updated.entries.remove(product_id);
        Ok(updated)
    }
}
