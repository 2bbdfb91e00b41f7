//! Business logic services for AgriQ

pub mod auth;
pub mod batch;
pub mod customer;
pub mod ledger;
pub mod movement;
pub mod order;
pub mod product;
pub mod reporting;
pub mod shipment;

pub use auth::AuthService;
pub use batch::BatchService;
pub use customer::CustomerService;
pub use movement::MovementService;
pub use order::OrderService;
pub use product::ProductService;
pub use reporting::ReportingService;
pub use shipment::ShipmentService;
