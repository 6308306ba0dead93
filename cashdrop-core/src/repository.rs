use async_trait::async_trait;
use uuid::Uuid;
use cashdrop_shared::{Order, OrderEvent};

use crate::BoxError;

/// Persistence collaborator: durable order snapshots plus the append-only event log
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn save_order(
        &self,
        order: &Order,
    ) -> Result<(), BoxError>;

    async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<Option<Order>, BoxError>;

    async fn delete_order(
        &self,
        id: Uuid,
    ) -> Result<(), BoxError>;

    async fn list_orders(&self) -> Result<Vec<Order>, BoxError>;

    async fn append_event(
        &self,
        event: &OrderEvent,
    ) -> Result<(), BoxError>;

    /// Full event log in append order, for replay
    async fn load_events(&self) -> Result<Vec<OrderEvent>, BoxError>;
}
