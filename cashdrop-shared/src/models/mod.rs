pub mod address;
pub mod amount;
pub mod events;
pub mod order;
pub mod pricing;
pub mod tracking;
