//! Shared types and models for AgriQ
//!
//! This crate contains the domain models, enums, and the pure inventory
//! ledger core shared between the backend and other components of the
//! system. It has no I/O dependencies.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
