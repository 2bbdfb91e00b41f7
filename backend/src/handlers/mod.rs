//! HTTP request handlers

pub mod auth;
pub mod batch;
pub mod customer;
pub mod health;
pub mod movement;
pub mod order;
pub mod product;
pub mod reporting;
pub mod shipment;

pub use auth::*;
pub use batch::*;
pub use customer::*;
pub use health::*;
pub use movement::*;
pub use order::*;
pub use product::*;
pub use reporting::*;
pub use shipment::*;
