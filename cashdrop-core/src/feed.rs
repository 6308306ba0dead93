use async_trait::async_trait;
use cashdrop_shared::TrackingUpdate;
use tokio::sync::mpsc;

/// Tracking collaborator. Transport (push, poll, socket) is the implementor's business.
#[async_trait]
pub trait TrackingFeed: Send {
    /// Next update, or `None` once the feed has closed
    async fn next_update(&mut self) -> Option<TrackingUpdate>;
}

/// Feed backed by an in-process channel
pub struct ChannelFeed {
    rx: mpsc::Receiver<TrackingUpdate>,
}

impl ChannelFeed {
    pub fn new(rx: mpsc::Receiver<TrackingUpdate>) -> Self {
        Self { rx }
    }

    pub fn channel(buffer: usize) -> (mpsc::Sender<TrackingUpdate>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl TrackingFeed for ChannelFeed {
    async fn next_update(&mut self) -> Option<TrackingUpdate> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashdrop_shared::Position;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_channel_feed_closes_with_sender() {
        let (tx, mut feed) = ChannelFeed::channel(4);
        let update = TrackingUpdate::new(Uuid::new_v4(), Position::new(12.97, 77.59), 300);

        tx.send(update.clone()).await.unwrap();
        drop(tx);

        assert_eq!(feed.next_update().await, Some(update));
        assert_eq!(feed.next_update().await, None);
    }
}
