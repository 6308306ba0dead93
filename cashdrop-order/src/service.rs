use cashdrop_catalog::OrderDraft;
use cashdrop_core::{AddressResolver, BoxError, OrderRepository, SessionContext, SessionGate};
use cashdrop_shared::{
    AddressRef, CancelReason, CancelledBy, Order, OrderEvent, Position, StatusHint, TrackingUpdate,
};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::OrderError;
use crate::history::OrderHistory;
use crate::manager::{OrderManager, Transition};
use crate::tracking::{IgnoreReason, TrackingOutcome, TrackingSession};

const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_millis(2_000);
const DEFAULT_STALE_AFTER_SECS: i64 = 30;

/// Optimistic order operations backed by a persistence collaborator.
///
/// Local state changes first; if the repository then fails or times out the change is rolled
/// back and the caller gets `PersistenceFailure`. Commits on one order are serialized from the
/// local transition until the repository has answered, so writes land in version order.
pub struct OrderService {
    manager: Arc<OrderManager>,
    repository: Arc<dyn OrderRepository>,
    sessions: Arc<dyn SessionGate>,
    addresses: Arc<dyn AddressResolver>,
    tracking: Mutex<HashMap<Uuid, TrackingSession>>,
    commit_locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
    persist_timeout: Duration,
    stale_after: chrono::Duration,
}

impl OrderService {
    pub fn new(
        manager: Arc<OrderManager>,
        repository: Arc<dyn OrderRepository>,
        sessions: Arc<dyn SessionGate>,
        addresses: Arc<dyn AddressResolver>,
    ) -> Self {
        Self {
            manager,
            repository,
            sessions,
            addresses,
            tracking: Mutex::new(HashMap::new()),
            commit_locks: Mutex::new(HashMap::new()),
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
            stale_after: chrono::Duration::seconds(DEFAULT_STALE_AFTER_SECS),
        }
    }

    pub fn with_persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }

    pub fn with_stale_after(mut self, stale_after: chrono::Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn manager(&self) -> &OrderManager {
        &self.manager
    }

    pub async fn resolve_address(&self, input: &str) -> Result<AddressRef, OrderError> {
        match self.addresses.resolve(input).await {
            Ok(Some(address)) => Ok(address),
            Ok(None) => Err(OrderError::AddressRequired),
            Err(e) => {
                error!("Address lookup failed: {}", e);
                Err(OrderError::AddressRequired)
            }
        }
    }

    pub async fn attach_address(&self, draft: &mut OrderDraft, input: &str) -> Result<(), OrderError> {
        let address = self.resolve_address(input).await?;
        draft.set_address(address);
        Ok(())
    }

    /// Place the draft for an authenticated caller
    pub async fn place(&self, session: &SessionContext, draft: &OrderDraft) -> Result<Order, OrderError> {
        self.sessions
            .authorize(session)
            .map_err(|e| OrderError::Unauthenticated(e.to_string()))?;

        let transition = self.manager.place_draft(draft)?;
        let order = self.commit(transition).await?;
        info!("Order {} confirmed for user {}", order.id, session.user_id);
        Ok(order)
    }

    pub async fn advance(&self, order_id: Uuid) -> Result<Order, OrderError> {
        let lock = self.commit_lock(order_id);
        let _guard = lock.lock().await;
        let transition = self.manager.advance(order_id)?;
        self.commit(transition).await
    }

    pub async fn cancel(&self, order_id: Uuid, reason: CancelReason) -> Result<Order, OrderError> {
        let lock = self.commit_lock(order_id);
        let _guard = lock.lock().await;
        let transition = self.manager.cancel(order_id, reason, CancelledBy::User)?;
        let order = self.commit(transition).await?;
        self.tracking.lock().remove(&order_id);
        Ok(order)
    }

    /// `Ok(None)` when the hint did not move the order
    pub async fn apply_hint(&self, order_id: Uuid, hint: StatusHint) -> Result<Option<Order>, OrderError> {
        let lock = self.commit_lock(order_id);
        let _guard = lock.lock().await;
        match self.manager.apply_hint(order_id, hint)? {
            Some(transition) => self.commit(transition).await.map(Some),
            None => Ok(None),
        }
    }

    /// Begin tracking a live order toward `destination`
    pub fn start_tracking(&self, order_id: Uuid, destination: Position) -> Result<(), OrderError> {
        let status = self.manager.status(order_id).ok_or(OrderError::NotFound(order_id))?;
        if !status.is_trackable() {
            return Err(OrderError::InvalidTransition {
                from: status,
                to: "TRACKING".to_string(),
            });
        }
        self.tracking
            .lock()
            .entry(order_id)
            .or_insert_with(|| TrackingSession::new(order_id, destination));
        Ok(())
    }

    /// Feed one tracking update through its session, then let the state machine weigh any hint
    pub async fn ingest(&self, update: TrackingUpdate) -> Result<TrackingOutcome, OrderError> {
        let order_id = update.order_id;
        let outcome = {
            let mut tracking = self.tracking.lock();
            let Some(session) = tracking.get_mut(&order_id) else {
                warn!("No tracking session for order {}", order_id);
                return Ok(TrackingOutcome::Ignored(IgnoreReason::WrongOrder));
            };
            match self.manager.status(order_id) {
                Some(status) => session.on_update(update, status),
                None => TrackingOutcome::Ignored(IgnoreReason::OrderInactive),
            }
        };

        if let TrackingOutcome::Applied { proposed: Some(hint) } = outcome {
            match self.apply_hint(order_id, hint).await {
                Ok(_) => {}
                // Lost a race with another transition; the next update will propose again
                Err(OrderError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }

    pub fn eta(&self, order_id: Uuid) -> Option<u64> {
        self.tracking.lock().get(&order_id)?.current_eta()
    }

    pub fn progress(&self, order_id: Uuid) -> Option<f64> {
        self.tracking.lock().get(&order_id)?.current_progress()
    }

    pub fn distance_label(&self, order_id: Uuid) -> Option<String> {
        self.tracking.lock().get(&order_id)?.distance_label()
    }

    /// Tracked orders that have gone quiet for longer than the configured window
    pub fn stale_orders(&self) -> Vec<Uuid> {
        let now = Utc::now();
        self.tracking
            .lock()
            .values()
            .filter(|session| session.is_stale(now, self.stale_after))
            .map(|session| session.order_id())
            .collect()
    }

    /// Move finished orders out of live state; their records stay with the repository
    pub fn archive_finished(&self) -> Vec<Order> {
        let finished = self.manager.take_finished();
        let mut tracking = self.tracking.lock();
        let mut commit_locks = self.commit_locks.lock();
        for order in &finished {
            tracking.remove(&order.id);
            commit_locks.remove(&order.id);
        }
        finished
    }

    /// Rebuild live state from the repository's event log
    pub async fn recover(&self) -> Result<usize, OrderError> {
        let events = self
            .repository
            .load_events()
            .await
            .map_err(|e| OrderError::PersistenceFailure(e.to_string()))?;
        Ok(self.manager.restore(events))
    }

    pub async fn history(&self) -> Result<OrderHistory, OrderError> {
        let orders = self
            .repository
            .list_orders()
            .await
            .map_err(|e| OrderError::PersistenceFailure(e.to_string()))?;
        Ok(OrderHistory::new(orders))
    }

    fn commit_lock(&self, order_id: Uuid) -> Arc<AsyncMutex<()>> {
        self.commit_locks.lock().entry(order_id).or_default().clone()
    }

    async fn commit(&self, transition: Transition) -> Result<Order, OrderError> {
        let reason = match tokio::time::timeout(self.persist_timeout, self.write(&transition)).await {
            Ok(Ok(())) => return Ok(transition.current),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {:?}", self.persist_timeout),
        };

        error!(
            "Persisting {} for order {} failed: {}",
            transition.event.name(),
            transition.current.id,
            reason
        );
        match self.manager.rollback(&transition, &reason) {
            Ok(event) => self.record_rollback(&event).await,
            Err(e) => warn!("Rollback skipped: {}", e),
        }
        Err(OrderError::PersistenceFailure(reason))
    }

    async fn write(&self, transition: &Transition) -> Result<(), BoxError> {
        self.repository.append_event(&transition.event).await?;
        self.repository.save_order(&transition.current).await
    }

    /// Best effort: the store just failed, so it may well fail again
    async fn record_rollback(&self, event: &OrderEvent) {
        match tokio::time::timeout(self.persist_timeout, self.write_rollback(event)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Could not record rollback of order {}: {}", event.order_id(), e),
            Err(_) => warn!("Recording rollback of order {} timed out", event.order_id()),
        }
    }

    async fn write_rollback(&self, event: &OrderEvent) -> Result<(), BoxError> {
        self.repository.append_event(event).await?;
        match event {
            OrderEvent::RolledBack(e) => match &e.restored {
                Some(order) => self.repository.save_order(order).await,
                None => self.repository.delete_order(e.order_id).await,
            },
            _ => Ok(()),
        }
    }
}
