use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use super::order::OrderStatus;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Great-circle (haversine) distance in metres
    pub fn distance_m(&self, other: &Position) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

/// Status the tracking collaborator believes the delivery is in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusHint {
    Accepted,
    Dispatched,
    /// Rider is at the door; still dispatched from the order's point of view
    Arrived,
    Delivered,
}

impl StatusHint {
    pub fn target_status(self) -> OrderStatus {
        match self {
            StatusHint::Accepted => OrderStatus::Accepted,
            StatusHint::Dispatched | StatusHint::Arrived => OrderStatus::Dispatched,
            StatusHint::Delivered => OrderStatus::Delivered,
        }
    }

    /// Any hint at or past dispatch closes the cancellation window
    pub fn implies_dispatch(self) -> bool {
        !matches!(self, StatusHint::Accepted)
    }
}

/// Latest rider position pushed by the tracking feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingUpdate {
    pub order_id: Uuid,
    pub position: Position,
    pub eta_seconds: u64,
    pub status_hint: Option<StatusHint>,
    /// Monotonic per-order sequence, when the feed provides one
    pub sequence: Option<u64>,
    pub received_at: DateTime<Utc>,
}

impl TrackingUpdate {
    pub fn new(order_id: Uuid, position: Position, eta_seconds: u64) -> Self {
        Self {
            order_id,
            position,
            eta_seconds,
            status_hint: None,
            sequence: None,
            received_at: Utc::now(),
        }
    }

    pub fn with_hint(mut self, hint: StatusHint) -> Self {
        self.status_hint = Some(hint);
        self
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }
}
