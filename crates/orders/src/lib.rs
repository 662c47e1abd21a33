//! Order ledger domain: the order record, its shipping address, and the
//! fulfilment status lifecycle.

pub mod order;

pub use order::{Address, NewOrder, Order, OrderStatus};
