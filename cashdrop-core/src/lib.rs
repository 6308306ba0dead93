//! Seams between the cash order engine and the collaborators it does not own:
//! address lookup, session gating, durable storage and the tracking feed.

pub mod address;
pub mod session;
pub mod repository;
pub mod feed;

pub use address::{AddressResolver, StaticAddressResolver};
pub use feed::{ChannelFeed, TrackingFeed};
pub use repository::OrderRepository;
pub use session::{ActiveSessionGate, SessionContext, SessionGate};

/// Boxed error returned by collaborator implementations
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Session rejected: {0}")]
    SessionError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
