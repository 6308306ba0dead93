pub mod error;
pub mod manager;
pub mod tracking;
pub mod history;
pub mod service;

pub use error::OrderError;
pub use manager::{OrderManager, Transition};
pub use tracking::{format_distance, IgnoreReason, TrackingOutcome, TrackingSession};
pub use history::{OrderHistory, DEFAULT_RECENT_LIMIT};
pub use service::OrderService;
