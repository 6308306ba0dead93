use std::sync::Arc;
use cashdrop_core::TrackingFeed;
use cashdrop_order::{OrderService, TrackingOutcome};
use tracing::{info, warn, error};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TrackingStats {
    pub applied: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// Drain the feed into the service until it closes or the tracked order finishes
pub async fn run_tracking_worker<F: TrackingFeed>(service: Arc<OrderService>, mut feed: F) -> TrackingStats {
    let mut stats = TrackingStats::default();
    info!("Tracking worker started");

    while let Some(update) = feed.next_update().await {
        let order_id = update.order_id;

        match service.ingest(update).await {
            Ok(TrackingOutcome::Applied { proposed }) => {
                stats.applied += 1;
                info!(
                    "Order {}: eta {:?}s, progress {:.0}%, {}{}",
                    order_id,
                    service.eta(order_id),
                    service.progress(order_id).unwrap_or(0.0) * 100.0,
                    service.distance_label(order_id).unwrap_or_default(),
                    proposed.map(|hint| format!(" (feed says {:?})", hint)).unwrap_or_default()
                );
            }
            Ok(TrackingOutcome::Ignored(reason)) => {
                stats.ignored += 1;
                warn!("Ignored update for order {}: {:?}", order_id, reason);
            }
            Err(e) => {
                stats.failed += 1;
                error!("Failed to apply update for order {}: {}", order_id, e);
            }
        }

        if service.manager().status(order_id).is_some_and(|status| status.is_terminal()) {
            info!("Order {} finished; tracking worker stopping", order_id);
            break;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::RiderSimulator;
    use cashdrop_catalog::{OrderDraft, PricingConfig, PricingEngine};
    use cashdrop_core::{ActiveSessionGate, ChannelFeed, SessionContext, StaticAddressResolver};
    use cashdrop_order::OrderManager;
    use cashdrop_shared::{AddressRef, OrderStatus, Position};
    use cashdrop_store::InMemoryOrderRepository;
    use chrono::Utc;
    use tokio::time::Duration;

    #[tokio::test]
    async fn test_worker_drives_order_to_delivery() {
        let engine = Arc::new(PricingEngine::new(PricingConfig::default()).unwrap());
        let service = Arc::new(OrderService::new(
            Arc::new(OrderManager::new(engine.clone())),
            Arc::new(InMemoryOrderRepository::new()),
            Arc::new(ActiveSessionGate),
            Arc::new(StaticAddressResolver::new().with_address("home", AddressRef::new("addr-home"))),
        ));

        let mut draft = OrderDraft::new(&engine);
        draft.enter_amount("500").unwrap();
        service.attach_address(&mut draft, "home").await.unwrap();
        let session = SessionContext::new("user-1", "token", Utc::now() + chrono::Duration::minutes(5));
        let order = service.place(&session, &draft).await.unwrap();

        let destination = Position::new(12.9716, 77.5946);
        service.start_tracking(order.id, destination).unwrap();

        let (tx, feed) = ChannelFeed::channel(16);
        let rider = RiderSimulator::new(order.id, Position::new(12.985, 77.605), destination, 3, Duration::ZERO);
        let producer = tokio::spawn(rider.run(tx));

        let stats = run_tracking_worker(service.clone(), feed).await;
        producer.await.unwrap();

        assert_eq!(service.manager().status(order.id), Some(OrderStatus::Delivered));
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.failed, 0);
    }
}
