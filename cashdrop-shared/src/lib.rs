pub mod models;
pub mod pii;

pub use models::address::AddressRef;
pub use models::amount::Amount;
pub use models::events::{
    OrderCancelledEvent, OrderCreatedEvent, OrderEvent, OrderRolledBackEvent, OrderTransitionedEvent,
};
pub use models::order::{Cancellation, CancelReason, CancelledBy, Order, OrderStatus, PaymentMode};
pub use models::pricing::{FeeLine, PriceBreakdown, TipSelection};
pub use models::tracking::{Position, StatusHint, TrackingUpdate};
pub use pii::Masked;
