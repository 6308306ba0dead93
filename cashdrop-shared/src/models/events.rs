use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use super::order::{Cancellation, Order, OrderStatus};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderTransitionedEvent {
    pub order_id: Uuid,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub version: u64,
    pub dispatch_signalled_at: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderCancelledEvent {
    pub order_id: Uuid,
    pub from: OrderStatus,
    pub cancellation: Cancellation,
    pub version: u64,
    pub cancelled_at: DateTime<Utc>,
}

/// A local change undone after the persistence collaborator refused it.
/// `restored: None` means the order itself was discarded (failed placement).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderRolledBackEvent {
    pub order_id: Uuid,
    pub restored: Option<Order>,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Everything the lifecycle engine emits; replaying these rebuilds its state.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEvent {
    Created(OrderCreatedEvent),
    Transitioned(OrderTransitionedEvent),
    Cancelled(OrderCancelledEvent),
    RolledBack(OrderRolledBackEvent),
}

impl OrderEvent {
    pub fn order_id(&self) -> Uuid {
        match self {
            OrderEvent::Created(e) => e.order.id,
            OrderEvent::Transitioned(e) => e.order_id,
            OrderEvent::Cancelled(e) => e.order_id,
            OrderEvent::RolledBack(e) => e.order_id,
        }
    }

    /// Topic-style name used as the log key
    pub fn name(&self) -> &'static str {
        match self {
            OrderEvent::Created(_) => "order.created",
            OrderEvent::Transitioned(_) => "order.transitioned",
            OrderEvent::Cancelled(_) => "order.cancelled",
            OrderEvent::RolledBack(_) => "order.rolled_back",
        }
    }

    /// Version the order carries after this event, when it has one
    pub fn version(&self) -> Option<u64> {
        match self {
            OrderEvent::Created(e) => Some(e.order.version),
            OrderEvent::Transitioned(e) => Some(e.version),
            OrderEvent::Cancelled(e) => Some(e.version),
            OrderEvent::RolledBack(e) => e.restored.as_ref().map(|o| o.version),
        }
    }
}
