use cashdrop_catalog::{OrderDraft, PricingEngine};
use cashdrop_shared::{
    AddressRef, Amount, CancelReason, Cancellation, CancelledBy, Masked, Order, OrderCancelledEvent,
    OrderCreatedEvent, OrderEvent, OrderRolledBackEvent, OrderStatus, OrderTransitionedEvent, PaymentMode,
    StatusHint, TipSelection,
};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::OrderError;

const EVENT_BUFFER: usize = 256;

/// An applied change: state before, state after, and the event describing it
#[derive(Debug, Clone)]
pub struct Transition {
    /// `None` for a placement
    pub previous: Option<Order>,
    pub current: Order,
    pub event: OrderEvent,
}

/// Owns live orders and enforces the status state machine.
///
/// Each order sits behind its own mutex, so transitions on one order are serialized while
/// distinct orders proceed in parallel. Lock order is always map, then order.
pub struct OrderManager {
    pricing: Arc<PricingEngine>,
    orders: RwLock<HashMap<Uuid, Arc<Mutex<Order>>>>,
    events: broadcast::Sender<OrderEvent>,
}

impl OrderManager {
    pub fn new(pricing: Arc<PricingEngine>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            pricing,
            orders: RwLock::new(HashMap::new()),
            events,
        }
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    /// Observers (UI, persistence) receive every emitted event
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.events.subscribe()
    }

    /// Validate, price and open a new order in `Placed`
    pub fn place(
        &self,
        amount: Amount,
        tip: &TipSelection,
        address: Option<AddressRef>,
        payment_mode: PaymentMode,
    ) -> Result<Transition, OrderError> {
        let breakdown = self.pricing.compute_breakdown(amount, tip)?;
        let address = address.ok_or(OrderError::AddressRequired)?;

        let order = Order::new(
            breakdown,
            *tip,
            address,
            payment_mode,
            self.pricing.config().currency.clone(),
        );
        let event = OrderEvent::Created(OrderCreatedEvent { order: order.clone() });

        self.orders.write().insert(order.id, Arc::new(Mutex::new(order.clone())));
        info!(
            "Order {} placed: {} {} payable, deliver to {}",
            order.id,
            order.total(),
            order.currency,
            Masked(order.delivery_address.as_str())
        );
        self.emit(&event);

        Ok(Transition {
            previous: None,
            current: order,
            event,
        })
    }

    pub fn place_draft(&self, draft: &OrderDraft) -> Result<Transition, OrderError> {
        self.place(
            draft.amount(),
            &draft.tip(),
            draft.address().cloned(),
            draft.payment_mode(),
        )
    }

    pub fn get(&self, order_id: Uuid) -> Option<Order> {
        let entry = self.orders.read().get(&order_id).cloned()?;
        let order = entry.lock().clone();
        Some(order)
    }

    pub fn status(&self, order_id: Uuid) -> Option<OrderStatus> {
        self.get(order_id).map(|order| order.status)
    }

    /// Orders still moving through Placed..Dispatched, oldest first
    pub fn active_orders(&self) -> Vec<Order> {
        let entries: Vec<_> = self.orders.read().values().cloned().collect();
        let mut active: Vec<Order> = entries
            .iter()
            .map(|entry| entry.lock().clone())
            .filter(|order| !order.is_terminal())
            .collect();
        active.sort_by_key(|order| order.created_at);
        active
    }

    /// Move one step forward: Placed -> Accepted -> Dispatched -> Delivered
    pub fn advance(&self, order_id: Uuid) -> Result<Transition, OrderError> {
        let entry = self.entry(order_id)?;
        let mut order = entry.lock();

        let next = order.status.next().ok_or_else(|| OrderError::InvalidTransition {
            from: order.status,
            to: "NEXT".to_string(),
        })?;

        Ok(self.transition_locked(&mut order, next, false))
    }

    /// Allowed from Placed/Accepted, and only until a dispatch signal has been seen
    pub fn cancel(
        &self,
        order_id: Uuid,
        reason: CancelReason,
        cancelled_by: CancelledBy,
    ) -> Result<Transition, OrderError> {
        let entry = self.entry(order_id)?;
        let mut order = entry.lock();

        if order.status == OrderStatus::Cancelled {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled.to_string(),
            });
        }
        if !order.status.is_cancellable() || order.dispatch_signalled_at.is_some() {
            warn!("Cancel rejected for order {} in {}", order.id, order.status);
            return Err(OrderError::CancellationWindowClosed(order.status));
        }

        let previous = order.clone();
        let now = Utc::now();
        let cancellation = Cancellation { reason, cancelled_by };

        order.status = OrderStatus::Cancelled;
        order.version += 1;
        order.updated_at = now;
        order.cancelled_at = Some(now);
        order.cancellation = Some(cancellation.clone());

        let event = OrderEvent::Cancelled(OrderCancelledEvent {
            order_id: order.id,
            from: previous.status,
            cancellation,
            version: order.version,
            cancelled_at: now,
        });
        info!("Order {} cancelled from {} ({})", order.id, previous.status, order.version);
        self.emit(&event);

        Ok(Transition {
            previous: Some(previous),
            current: order.clone(),
            event,
        })
    }

    /// Consider a status proposed by the tracking feed.
    ///
    /// Advances at most one step, and only when the hint is ahead of the current status.
    /// Hints for finished orders are stale and ignored.
    pub fn apply_hint(&self, order_id: Uuid, hint: StatusHint) -> Result<Option<Transition>, OrderError> {
        let entry = self.entry(order_id)?;
        let mut order = entry.lock();

        if order.is_terminal() {
            debug!("Ignoring {:?} hint for finished order {}", hint, order.id);
            return Ok(None);
        }

        let ahead = match (order.status.progress_rank(), hint.target_status().progress_rank()) {
            (Some(current), Some(target)) => target > current,
            _ => false,
        };
        if !ahead {
            return Ok(None);
        }

        match order.status.next() {
            Some(next) => Ok(Some(self.transition_locked(&mut order, next, hint.implies_dispatch()))),
            None => Ok(None),
        }
    }

    /// Undo `transition` after the persistence collaborator refused it.
    ///
    /// Only succeeds if nothing else touched the order since; a placement is discarded outright.
    /// A dispatch signal seen by the failed transition survives the rollback.
    pub fn rollback(&self, transition: &Transition, reason: &str) -> Result<OrderEvent, OrderError> {
        let order_id = transition.current.id;
        let expected_version = transition.current.version;

        let event = match &transition.previous {
            None => {
                let mut orders = self.orders.write();
                let entry = orders.get(&order_id).cloned().ok_or(OrderError::NotFound(order_id))?;
                let version = entry.lock().version;
                if version != expected_version {
                    warn!("Rollback of order {} skipped: version {} != {}", order_id, version, expected_version);
                    return Err(OrderError::Conflict(order_id));
                }
                orders.remove(&order_id);

                OrderEvent::RolledBack(OrderRolledBackEvent {
                    order_id,
                    restored: None,
                    reason: reason.to_string(),
                    at: Utc::now(),
                })
            }
            Some(previous) => {
                let entry = self.entry(order_id)?;
                let mut order = entry.lock();
                if order.version != expected_version {
                    warn!("Rollback of order {} skipped: version {} != {}", order_id, order.version, expected_version);
                    return Err(OrderError::Conflict(order_id));
                }

                let now = Utc::now();
                let mut restored = previous.clone();
                restored.dispatch_signalled_at = order.dispatch_signalled_at.or(previous.dispatch_signalled_at);
                restored.version = order.version + 1;
                restored.updated_at = now;
                *order = restored.clone();

                OrderEvent::RolledBack(OrderRolledBackEvent {
                    order_id,
                    restored: Some(restored),
                    reason: reason.to_string(),
                    at: now,
                })
            }
        };

        warn!("Order {} rolled back: {}", order_id, reason);
        self.emit(&event);
        Ok(event)
    }

    /// Rebuild live state from an event log. Returns how many events changed something.
    pub fn restore<I>(&self, events: I) -> usize
    where
        I: IntoIterator<Item = OrderEvent>,
    {
        let mut orders = self.orders.write();
        let mut applied = 0;

        for event in events {
            match &event {
                OrderEvent::Created(e) => {
                    orders.insert(e.order.id, Arc::new(Mutex::new(e.order.clone())));
                    applied += 1;
                }
                OrderEvent::RolledBack(e) if e.restored.is_none() => {
                    if orders.remove(&e.order_id).is_some() {
                        applied += 1;
                    }
                }
                _ => {
                    if let Some(entry) = orders.get(&event.order_id()) {
                        if entry.lock().apply(&event) {
                            applied += 1;
                        }
                    }
                }
            }
        }

        info!("Restored {} orders from {} events", orders.len(), applied);
        applied
    }

    /// Drop finished orders from live tracking and hand them over for history
    pub fn take_finished(&self) -> Vec<Order> {
        let mut orders = self.orders.write();
        let finished: Vec<Order> = orders
            .values()
            .map(|entry| entry.lock().clone())
            .filter(|order| order.is_terminal())
            .collect();

        for order in &finished {
            orders.remove(&order.id);
        }
        finished
    }

    fn entry(&self, order_id: Uuid) -> Result<Arc<Mutex<Order>>, OrderError> {
        self.orders
            .read()
            .get(&order_id)
            .cloned()
            .ok_or(OrderError::NotFound(order_id))
    }

    fn transition_locked(&self, order: &mut Order, to: OrderStatus, dispatch_signal: bool) -> Transition {
        let previous = order.clone();
        let now = Utc::now();

        if (dispatch_signal || to == OrderStatus::Dispatched) && order.dispatch_signalled_at.is_none() {
            order.dispatch_signalled_at = Some(now);
        }
        order.status = to;
        order.version += 1;
        order.updated_at = now;

        let event = OrderEvent::Transitioned(OrderTransitionedEvent {
            order_id: order.id,
            from: previous.status,
            to,
            version: order.version,
            dispatch_signalled_at: order.dispatch_signalled_at,
            at: now,
        });
        info!("Order {} moved {} -> {}", order.id, previous.status, to);
        self.emit(&event);

        Transition {
            previous: Some(previous),
            current: order.clone(),
            event,
        }
    }

    fn emit(&self, event: &OrderEvent) {
        // Err only means nobody is subscribed right now
        if self.events.send(event.clone()).is_err() {
            debug!("No subscribers for {}", event.name());
        }
    }
}
