//! Shared types and models for the Warehouse Stock Ledger
//!
//! This crate contains the domain and wire types shared between the backend
//! server and its clients, plus pure validation and pricing helpers.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
