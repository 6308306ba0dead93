use async_trait::async_trait;
use cashdrop_core::{BoxError, OrderRepository};
use cashdrop_shared::{Order, OrderEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local repository. Can be told to fail or stall writes, to exercise rollback.
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
    events: RwLock<Vec<OrderEvent>>,
    fail_writes: AtomicBool,
    write_delay: Option<Duration>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            events: RwLock::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            write_delay: None,
        }
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    async fn before_write(&self) -> Result<(), BoxError> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err("simulated write failure".into());
        }
        Ok(())
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save_order(&self, order: &Order) -> Result<(), BoxError> {
        self.before_write().await?;
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, BoxError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn delete_order(&self, id: Uuid) -> Result<(), BoxError> {
        self.before_write().await?;
        self.orders.write().await.remove(&id);
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, BoxError> {
        Ok(self.orders.read().await.values().cloned().collect())
    }

    async fn append_event(&self, event: &OrderEvent) -> Result<(), BoxError> {
        self.before_write().await?;
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn load_events(&self) -> Result<Vec<OrderEvent>, BoxError> {
        Ok(self.events.read().await.clone())
    }
}
