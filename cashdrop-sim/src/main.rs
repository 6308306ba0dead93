use std::sync::Arc;
use anyhow::Context;
use cashdrop_catalog::{OrderDraft, PricingEngine};
use cashdrop_core::{ActiveSessionGate, ChannelFeed, SessionContext, StaticAddressResolver};
use cashdrop_order::{OrderManager, OrderService, DEFAULT_RECENT_LIMIT};
use cashdrop_shared::{AddressRef, TipSelection};
use cashdrop_sim::{run_tracking_worker, RiderSimulator};
use cashdrop_store::{build_repository, Config};
use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cashdrop_sim=info,cashdrop_order=info,cashdrop_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    let engine = Arc::new(PricingEngine::new(config.pricing.clone())?);
    info!("Starting cash order simulation ({})", engine.config().currency);

    let repository = build_repository(&config.persistence)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open order store: {}", e))?;

    let manager = Arc::new(OrderManager::new(engine.clone()));

    // Stand-in for the UI: it only observes events
    let mut events = manager.subscribe();
    let observer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!("[event] {} v{:?} for order {}", event.name(), event.version(), event.order_id()),
                Err(RecvError::Lagged(missed)) => warn!("Observer missed {} events", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let sim = config.simulation.clone();
    let addresses = StaticAddressResolver::new()
        .with_address(&sim.address, AddressRef::new(format!("addr-{}", Uuid::new_v4().simple())));

    let service = Arc::new(
        OrderService::new(manager, repository, Arc::new(ActiveSessionGate), Arc::new(addresses))
            .with_persist_timeout(config.persistence.timeout())
            .with_stale_after(config.tracking.stale_after()),
    );

    let recovered = service.recover().await?;
    if recovered > 0 {
        info!("Recovered {} events from the order store", recovered);
    }

    let mut draft = OrderDraft::new(&engine);
    draft.enter_amount(&sim.amount_input)?;
    match sim.tip {
        TipSelection::None => draft.clear_tip(),
        TipSelection::Preset(value) => draft.select_preset_tip(value)?,
        TipSelection::Custom(value) => draft.select_custom_tip(value)?,
    }
    service.attach_address(&mut draft, &sim.address).await?;

    let quote = draft.quote(&engine)?;
    info!("Amount        {}", quote.base_amount());
    for line in quote.fee_lines() {
        info!("{:<13} {}", line.label, line.amount);
    }
    info!("Tip           {}", quote.tip());
    info!("Total payable {}", quote.total());

    let session = SessionContext::new("demo-user", Uuid::new_v4().to_string(), Utc::now() + chrono::Duration::minutes(30));
    let order = service.place(&session, &draft).await?;
    service.start_tracking(order.id, sim.destination)?;

    let (tx, feed) = ChannelFeed::channel(16);
    let rider = RiderSimulator::new(
        order.id,
        sim.rider_start,
        sim.destination,
        sim.route_steps,
        Duration::from_millis(sim.update_interval_ms),
    );
    let producer = tokio::spawn(rider.run(tx));

    let stats = run_tracking_worker(service.clone(), feed).await;
    producer.await?;
    info!(
        "Tracking done: {} applied, {} ignored, {} failed",
        stats.applied, stats.ignored, stats.failed
    );

    let stale = service.stale_orders();
    if !stale.is_empty() {
        warn!("{} tracked orders went quiet", stale.len());
    }

    let archived = service.archive_finished();
    info!("Archived {} finished orders", archived.len());

    let history = service.history().await?;
    for past in history.recent(DEFAULT_RECENT_LIMIT) {
        info!("{} {} {} {}", past.created_at.format("%d %b %H:%M"), past.id, past.status, past.total());
    }

    observer.abort();
    Ok(())
}
