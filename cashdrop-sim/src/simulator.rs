use cashdrop_shared::{Position, StatusHint, TrackingUpdate};
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::debug;
use uuid::Uuid;

/// Two-wheeler in city traffic, roughly 20 km/h
const RIDER_SPEED_MPS: f64 = 5.5;

/// Scripted rider standing in for the tracking collaborator
pub struct RiderSimulator {
    order_id: Uuid,
    start: Position,
    destination: Position,
    steps: u32,
    interval: Duration,
}

impl RiderSimulator {
    pub fn new(order_id: Uuid, start: Position, destination: Position, steps: u32, interval: Duration) -> Self {
        Self {
            order_id,
            start,
            destination,
            steps,
            interval,
        }
    }

    /// Accept, dispatch, ride toward the destination, arrive, deliver.
    ///
    /// One position is sent twice, as a flaky network would.
    pub fn route(&self) -> Vec<TrackingUpdate> {
        let total_eta = (self.start.distance_m(&self.destination) / RIDER_SPEED_MPS).round() as u64;
        let mut sequence = 0;
        let mut next = |position: Position, eta: u64| {
            sequence += 1;
            TrackingUpdate::new(self.order_id, position, eta).with_sequence(sequence)
        };

        let mut updates = vec![
            next(self.start, total_eta).with_hint(StatusHint::Accepted),
            next(self.start, total_eta).with_hint(StatusHint::Dispatched),
        ];

        for step in 1..=self.steps {
            let fraction = f64::from(step) / f64::from(self.steps + 1);
            let eta = (total_eta as f64 * (1.0 - fraction)).round() as u64;
            updates.push(next(lerp(self.start, self.destination, fraction), eta));
            if step == 2 {
                let replay = updates[updates.len() - 1].clone();
                updates.push(replay);
            }
        }

        updates.push(next(self.destination, 0).with_hint(StatusHint::Arrived));
        updates.push(next(self.destination, 0).with_hint(StatusHint::Delivered));
        updates
    }

    pub async fn run(self, tx: mpsc::Sender<TrackingUpdate>) {
        for mut update in self.route() {
            sleep(self.interval).await;
            update.received_at = Utc::now();
            debug!("Rider update #{:?} for order {}", update.sequence, update.order_id);
            if tx.send(update).await.is_err() {
                break;
            }
        }
    }
}

fn lerp(from: Position, to: Position, fraction: f64) -> Position {
    Position::new(
        from.latitude + (to.latitude - from.latitude) * fraction,
        from.longitude + (to.longitude - from.longitude) * fraction,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_script() {
        let rider = RiderSimulator::new(
            Uuid::new_v4(),
            Position::new(12.985, 77.605),
            Position::new(12.9716, 77.5946),
            4,
            Duration::ZERO,
        );
        let route = rider.route();

        // 2 opening hints + 4 steps + 1 replay + arrive + deliver
        assert_eq!(route.len(), 9);
        assert_eq!(route[0].status_hint, Some(StatusHint::Accepted));
        assert_eq!(route[3].sequence, route[4].sequence);
        assert_eq!(route.last().and_then(|u| u.status_hint), Some(StatusHint::Delivered));
        assert!(route.windows(2).all(|w| w[0].eta_seconds >= w[1].eta_seconds));
    }
}
