//! Catalog domain module (the stock ledger's records and rules).
//!
//! This crate contains business rules for products and their stock counters,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage). The atomicity of the conditional decrement is the stores'
//! obligation; the rule itself lives here.

pub mod product;

pub use product::{NewProduct, Product};
