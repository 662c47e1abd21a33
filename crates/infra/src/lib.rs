//! Infrastructure layer: storage adapters and checkout orchestration.

pub mod checkout;
pub mod stores;
