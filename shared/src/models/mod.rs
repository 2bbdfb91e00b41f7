//! Domain models for AgriQ

mod batch;
mod customer;
mod discard;
mod ledger;
mod movement;
mod order;
mod product;
mod shipment;
mod user;

pub use batch::*;
pub use customer::*;
pub use discard::*;
pub use ledger::*;
pub use movement::*;
pub use order::*;
pub use product::*;
pub use shipment::*;
pub use user::*;
