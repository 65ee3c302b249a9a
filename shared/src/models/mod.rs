//! Domain models for the Warehouse Stock Ledger

mod dashboard;
mod item;
mod stock;
mod transaction;

pub use dashboard::*;
pub use item::*;
pub use stock::*;
pub use transaction::*;
