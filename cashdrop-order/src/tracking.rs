use cashdrop_shared::{OrderStatus, Position, StatusHint, TrackingUpdate};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    WrongOrder,
    /// Order is outside Placed..=Dispatched
    OrderInactive,
    StaleSequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingOutcome {
    /// The update is now the latest. `proposed` is a hint ahead of the current status, for
    /// the state machine to consider.
    Applied { proposed: Option<StatusHint> },
    Ignored(IgnoreReason),
}

/// Live position and ETA for one order.
///
/// Holds only the most recent accepted update. It never changes the order's status itself.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    order_id: Uuid,
    destination: Position,
    origin: Option<Position>,
    latest: Option<TrackingUpdate>,
    last_sequence: Option<u64>,
    started_at: DateTime<Utc>,
}

impl TrackingSession {
    pub fn new(order_id: Uuid, destination: Position) -> Self {
        Self {
            order_id,
            destination,
            origin: None,
            latest: None,
            last_sequence: None,
            started_at: Utc::now(),
        }
    }

    pub fn order_id(&self) -> Uuid {
        self.order_id
    }

    pub fn latest(&self) -> Option<&TrackingUpdate> {
        self.latest.as_ref()
    }

    /// Consume a pushed update given the order's current status.
    ///
    /// Sequenced updates must beat the last applied sequence; unsequenced ones win on arrival.
    pub fn on_update(&mut self, update: TrackingUpdate, status: OrderStatus) -> TrackingOutcome {
        if update.order_id != self.order_id {
            warn!("Tracking update for {} delivered to session {}", update.order_id, self.order_id);
            return TrackingOutcome::Ignored(IgnoreReason::WrongOrder);
        }
        if !status.is_trackable() {
            debug!("Ignoring tracking update for order {} in {}", self.order_id, status);
            return TrackingOutcome::Ignored(IgnoreReason::OrderInactive);
        }
        if let (Some(sequence), Some(last)) = (update.sequence, self.last_sequence) {
            if sequence <= last {
                warn!(
                    "Stale tracking update for order {}: sequence {} <= {}",
                    self.order_id, sequence, last
                );
                return TrackingOutcome::Ignored(IgnoreReason::StaleSequence);
            }
        }

        if update.sequence.is_some() {
            self.last_sequence = update.sequence;
        }
        if self.origin.is_none() && update.position.is_finite() {
            self.origin = Some(update.position);
        }

        let proposed = update.status_hint.filter(|hint| is_ahead(*hint, status));
        self.latest = Some(update);
        TrackingOutcome::Applied { proposed }
    }

    pub fn current_eta(&self) -> Option<u64> {
        self.latest.as_ref().map(|update| update.eta_seconds)
    }

    pub fn remaining_distance_m(&self) -> Option<f64> {
        self.latest
            .as_ref()
            .map(|update| update.position.distance_m(&self.destination))
            .filter(|distance| distance.is_finite())
    }

    /// Share of the route covered since the first observed position, in [0, 1]
    pub fn current_progress(&self) -> Option<f64> {
        let origin = self.origin?;
        let remaining = self.remaining_distance_m()?;
        let total = origin.distance_m(&self.destination);
        if !total.is_finite() {
            return None;
        }
        if total <= f64::EPSILON {
            return Some(1.0);
        }
        Some((1.0 - remaining / total).clamp(0.0, 1.0))
    }

    pub fn distance_label(&self) -> Option<String> {
        self.remaining_distance_m().map(format_distance)
    }

    /// True once nothing has been heard for longer than `stale_after`
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        let last_heard = self
            .latest
            .as_ref()
            .map(|update| update.received_at)
            .unwrap_or(self.started_at);
        now - last_heard > stale_after
    }
}

/// "850 m away" under a kilometre, "1.2 km away" beyond
pub fn format_distance(meters: f64) -> String {
    if meters < 1_000.0 {
        format!("{} m away", meters.round() as u64)
    } else {
        format!("{:.1} km away", meters / 1_000.0)
    }
}

fn is_ahead(hint: StatusHint, status: OrderStatus) -> bool {
    match (hint.target_status().progress_rank(), status.progress_rank()) {
        (Some(target), Some(current)) => target > current,
        _ => false,
    }
}
