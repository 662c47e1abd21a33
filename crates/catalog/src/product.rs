use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, ProductId, UserId};

/// A catalog product and its authoritative stock counter.
///
/// Prices are in the smallest currency unit (e.g. cents). Field renames keep
/// the wire format of the original market documents (`desc`, `img`, `uid` for
/// the seller, `nameseller`, `imgseller`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    title: String,
    #[serde(rename = "desc")]
    description: String,
    #[serde(rename = "img")]
    image_url: String,
    price: u64,
    rating: f64,
    stock: i64,
    #[serde(rename = "uid")]
    seller_uid: UserId,
    #[serde(rename = "nameseller")]
    seller_name: String,
    #[serde(rename = "imgseller")]
    seller_image_url: String,
    category: String,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// Input for registering a new product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub price: u64,
    pub rating: f64,
    pub stock: i64,
    pub seller_uid: UserId,
    pub seller_name: String,
    pub seller_image_url: String,
    pub category: String,
}

impl Product {
    /// Validate and build a product record, stamping `created_at`.
    pub fn new(input: NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        fn required(field: &'static str, value: &str) -> DomainResult<()> {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{field} cannot be empty")));
            }
            Ok(())
        }

        required("title", &input.title)?;
        required("desc", &input.description)?;
        required("img", &input.image_url)?;
        required("nameseller", &input.seller_name)?;
        required("imgseller", &input.seller_image_url)?;
        required("category", &input.category)?;

        if input.stock < 0 {
            return Err(DomainError::validation("stock must be a non-negative number"));
        }
        if !input.rating.is_finite() || input.rating < 0.0 {
            return Err(DomainError::validation("rating must be a non-negative number"));
        }

        Ok(Self {
            id: input.id,
            title: input.title,
            description: input.description,
            image_url: input.image_url,
            price: input.price,
            rating: input.rating,
            stock: input.stock,
            seller_uid: input.seller_uid,
            seller_name: input.seller_name,
            seller_image_url: input.seller_image_url,
            category: input.category,
            created_at: now,
            updated_at: None,
        })
    }

    /// Rebuild a product from trusted storage without re-validating.
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: ProductId,
        title: String,
        description: String,
        image_url: String,
        price: u64,
        rating: f64,
        stock: i64,
        seller_uid: UserId,
        seller_name: String,
        seller_image_url: String,
        category: String,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            image_url,
            price,
            rating,
            stock,
            seller_uid,
            seller_name,
            seller_image_url,
            category,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn seller_uid(&self) -> &UserId {
        &self.seller_uid
    }

    pub fn seller_name(&self) -> &str {
        &self.seller_name
    }

    pub fn seller_image_url(&self) -> &str {
        &self.seller_image_url
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// The conditional-decrement rule: `new_stock = stock - qty`, rejected
    /// outright if the result would be negative. Stock never goes below zero.
    ///
    /// The check and the write must happen atomically; callers (the stores)
    /// are responsible for running this inside their per-product critical
    /// section or as a single conditional update.
    pub fn decremented(&self, qty: i64, now: DateTime<Utc>) -> DomainResult<Self> {
        if qty < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        let new_stock = self.stock - qty;
        if new_stock < 0 {
            return Err(DomainError::InsufficientStock {
                available: self.stock,
            });
        }
        let mut updated = self.clone();
        updated.stock = new_stock;
        updated.updated_at = Some(now);
        Ok(updated)
    }

    /// Reverse a decrement (the compensating action of an aborted checkout).
    pub fn restocked(&self, qty: i64, now: DateTime<Utc>) -> DomainResult<Self> {
        if qty < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        let new_stock = self
            .stock
            .checked_add(qty)
            .ok_or_else(|| DomainError::invariant("stock counter overflow"))?;
        let mut updated = self.clone();
        updated.stock = new_stock;
        updated.updated_at = Some(now);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_input(stock: i64) -> NewProduct {
        NewProduct {
            id: ProductId::new("p-1").unwrap(),
            title: "Walnut chess set".to_string(),
            description: "Hand carved".to_string(),
            image_url: "https://img.example/chess.png".to_string(),
            price: 4_999,
            rating: 4.5,
            stock,
            seller_uid: UserId::new("seller-1").unwrap(),
            seller_name: "Hana".to_string(),
            seller_image_url: "https://img.example/hana.png".to_string(),
            category: "games".to_string(),
        }
    }

    fn test_product(stock: i64) -> Product {
        Product::new(test_input(stock), Utc::now()).unwrap()
    }

    #[test]
    fn new_product_rejects_negative_stock() {
        let mut input = test_input(0);
        input.stock = -1;
        let err = Product::new(input, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn new_product_rejects_blank_required_fields() {
        let mut input = test_input(1);
        input.title = "  ".to_string();
        assert!(Product::new(input, Utc::now()).is_err());
    }

    #[test]
    fn decrement_within_stock_returns_new_stock_and_touches_updated_at() {
        let product = test_product(5);
        let now = Utc::now();
        let updated = product.decremented(2, now).unwrap();
        assert_eq!(updated.stock(), 3);
        assert_eq!(updated.updated_at(), Some(now));
        // original untouched
        assert_eq!(product.stock(), 5);
    }

    #[test]
    fn decrement_by_zero_is_allowed_and_changes_nothing_but_the_timestamp() {
        let product = test_product(5);
        let updated = product.decremented(0, Utc::now()).unwrap();
        assert_eq!(updated.stock(), 5);
    }

    #[test]
    fn decrement_past_available_stock_is_rejected_with_the_available_amount() {
        let product = test_product(1);
        let err = product.decremented(2, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::InsufficientStock { available: 1 });
        assert_eq!(product.stock(), 1);
    }

    #[test]
    fn decrement_rejects_negative_quantity() {
        let product = test_product(5);
        assert!(matches!(
            product.decremented(-1, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn restock_reverses_a_decrement() {
        let product = test_product(5);
        let now = Utc::now();
        let decremented = product.decremented(3, now).unwrap();
        let restored = decremented.restocked(3, now).unwrap();
        assert_eq!(restored.stock(), 5);
    }

    #[test]
    fn serializes_with_the_original_wire_names() {
        let product = test_product(2);
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["id"], "p-1");
        assert_eq!(json["desc"], "Hand carved");
        assert_eq!(json["img"], "https://img.example/chess.png");
        assert_eq!(json["uid"], "seller-1");
        assert_eq!(json["nameseller"], "Hana");
        assert_eq!(json["imgseller"], "https://img.example/hana.png");
        assert!(json.get("createdAt").is_some());
        // updatedAt only appears once the record has been touched
        assert!(json.get("updatedAt").is_none());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: the decrement rule never produces negative stock,
            /// succeeds exactly when qty <= stock, and fails with the
            /// available amount otherwise.
            #[test]
            fn decrement_never_goes_negative(stock in 0i64..10_000, qty in 0i64..10_000) {
                let product = test_product(stock);
                match product.decremented(qty, Utc::now()) {
                    Ok(updated) => {
                        prop_assert!(qty <= stock);
                        prop_assert_eq!(updated.stock(), stock - qty);
                        prop_assert!(updated.stock() >= 0);
                    }
                    Err(DomainError::InsufficientStock { available }) => {
                        prop_assert!(qty > stock);
                        prop_assert_eq!(available, stock);
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {other}"),
                }
            }

            /// Property: restocking after a successful decrement restores the
            /// original counter.
            #[test]
            fn restock_is_the_inverse_of_decrement(stock in 0i64..10_000, qty in 0i64..10_000) {
                let product = test_product(stock);
                if let Ok(decremented) = product.decremented(qty, Utc::now()) {
                    let restored = decremented.restocked(qty, Utc::now()).unwrap();
                    prop_assert_eq!(restored.stock(), stock);
                }
            }
        }
    }
}
