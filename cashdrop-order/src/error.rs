use cashdrop_catalog::PricingError;
use cashdrop_shared::OrderStatus;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Validation failed: {0}")]
    Validation(#[from] PricingError),

    #[error("A resolved delivery address is required")]
    AddressRequired,

    #[error("Caller is not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: String,
    },

    #[error("Cancellation window closed: order is {0}")]
    CancellationWindowClosed(OrderStatus),

    #[error("Persistence failed: {0}")]
    PersistenceFailure(String),

    #[error("Order {0} changed concurrently; re-fetch its status")]
    Conflict(Uuid),
}

impl OrderError {
    /// Errors the customer can fix by editing their input
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, OrderError::Validation(_) | OrderError::AddressRequired)
    }
}
