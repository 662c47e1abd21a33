//! Per-user cart domain: the product-to-quantity map and the rules for
//! merging, overwriting, and removing its lines.

pub mod cart;

pub use cart::{Cart, CartItem};
