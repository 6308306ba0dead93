use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;

use super::address::AddressRef;
use super::amount::Amount;
use super::events::OrderEvent;
use super::pricing::{PriceBreakdown, TipSelection};

/// Order status in the lifecycle
///
/// ```text
/// Placed -> Accepted -> Dispatched -> Delivered
///    \          \
///     +----------+--> Cancelled
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Placed,
    Accepted,
    Dispatched,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The single forward step, if any
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Placed => Some(OrderStatus::Accepted),
            OrderStatus::Accepted => Some(OrderStatus::Dispatched),
            OrderStatus::Dispatched => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn is_cancellable(self) -> bool {
        matches!(self, OrderStatus::Placed | OrderStatus::Accepted)
    }

    /// Placed..=Dispatched: the window in which tracking updates matter
    pub fn is_trackable(self) -> bool {
        matches!(self, OrderStatus::Placed | OrderStatus::Accepted | OrderStatus::Dispatched)
    }

    /// Position on the delivery path; `None` for the cancellation branch
    pub fn progress_rank(self) -> Option<u8> {
        match self {
            OrderStatus::Placed => Some(0),
            OrderStatus::Accepted => Some(1),
            OrderStatus::Dispatched => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Dispatched => "DISPATCHED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// How the held amount is settled on delivery
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    #[default]
    Wallet,
    Cash,
    Upi,
}

/// Reasons offered on the cancel sheet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    ChangedMind,
    WrongAddress,
    PaymentIssue,
    ExpectedQuickerDelivery,
    FoundBetterAlternative,
    Other(String),
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::ChangedMind => f.write_str("I changed my mind"),
            CancelReason::WrongAddress => f.write_str("Wrong address selected"),
            CancelReason::PaymentIssue => f.write_str("Payment issue"),
            CancelReason::ExpectedQuickerDelivery => f.write_str("Expected quicker delivery"),
            CancelReason::FoundBetterAlternative => f.write_str("Found a better alternative"),
            CancelReason::Other(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelledBy {
    User,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cancellation {
    pub reason: CancelReason,
    pub cancelled_by: CancelledBy,
}

/// A cash delivery order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub requested_amount: Amount,
    pub breakdown: PriceBreakdown,
    pub tip: TipSelection,
    pub delivery_address: AddressRef,
    pub payment_mode: PaymentMode,
    pub currency: String,
    pub status: OrderStatus,
    /// Bumped on every applied change, starting at 1
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation: Option<Cancellation>,
    /// First time the dispatch collaborator reported the rider as dispatched
    pub dispatch_signalled_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(
        breakdown: PriceBreakdown,
        tip: TipSelection,
        delivery_address: AddressRef,
        payment_mode: PaymentMode,
        currency: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            requested_amount: breakdown.base_amount(),
            breakdown,
            tip,
            delivery_address,
            payment_mode,
            currency: currency.into(),
            status: OrderStatus::Placed,
            version: 1,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            cancellation: None,
            dispatch_signalled_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn total(&self) -> Amount {
        self.breakdown.total()
    }

    /// Replay reducer. Returns false when the event is for another order or older than this state.
    pub fn apply(&mut self, event: &OrderEvent) -> bool {
        if event.order_id() != self.id {
            return false;
        }

        match event {
            OrderEvent::Created(_) => false,
            OrderEvent::Transitioned(e) => {
                if e.version <= self.version {
                    return false;
                }
                self.status = e.to;
                self.version = e.version;
                self.updated_at = e.at;
                if self.dispatch_signalled_at.is_none() {
                    self.dispatch_signalled_at = e.dispatch_signalled_at;
                }
                true
            }
            OrderEvent::Cancelled(e) => {
                if e.version <= self.version {
                    return false;
                }
                self.status = OrderStatus::Cancelled;
                self.version = e.version;
                self.updated_at = e.cancelled_at;
                self.cancelled_at = Some(e.cancelled_at);
                self.cancellation = Some(e.cancellation.clone());
                true
            }
            OrderEvent::RolledBack(e) => match &e.restored {
                Some(restored) if restored.version > self.version => {
                    *self = restored.clone();
                    true
                }
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::events::{OrderCancelledEvent, OrderTransitionedEvent};

    fn sample_order() -> Order {
        Order::new(
            PriceBreakdown::new(Amount::from_major(500), vec![], Amount::ZERO),
            TipSelection::None,
            AddressRef::new("addr-1"),
            PaymentMode::Wallet,
            "INR",
        )
    }

    #[test]
    fn test_status_chain_never_skips() {
        assert_eq!(OrderStatus::Placed.next(), Some(OrderStatus::Accepted));
        assert_eq!(OrderStatus::Accepted.next(), Some(OrderStatus::Dispatched));
        assert_eq!(OrderStatus::Dispatched.next(), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::Delivered.next(), None);
        assert_eq!(OrderStatus::Cancelled.next(), None);
    }

    #[test]
    fn test_apply_transition_and_cancel() {
        let mut order = sample_order();
        let at = Utc::now();

        let accepted = OrderEvent::Transitioned(OrderTransitionedEvent {
            order_id: order.id,
            from: OrderStatus::Placed,
            to: OrderStatus::Accepted,
            version: 2,
            dispatch_signalled_at: None,
            at,
        });
        assert!(order.apply(&accepted));
        assert_eq!(order.status, OrderStatus::Accepted);

        // Replaying the same event is a no-op
        assert!(!order.apply(&accepted));

        let cancelled = OrderEvent::Cancelled(OrderCancelledEvent {
            order_id: order.id,
            from: OrderStatus::Accepted,
            cancellation: Cancellation {
                reason: CancelReason::WrongAddress,
                cancelled_by: CancelledBy::User,
            },
            version: 3,
            cancelled_at: at,
        });
        assert!(order.apply(&cancelled));
        assert!(order.is_terminal());
        assert_eq!(order.cancelled_at, Some(at));
    }

    #[test]
    fn test_cancel_reason_wire_format() {
        let json = serde_json::to_value(CancelReason::Other("rider was rude".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "OTHER", "detail": "rider was rude" }));
        assert_eq!(CancelReason::PaymentIssue.to_string(), "Payment issue");
    }
}
