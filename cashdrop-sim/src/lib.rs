pub mod simulator;
pub mod worker;

pub use simulator::RiderSimulator;
pub use worker::{run_tracking_worker, TrackingStats};
