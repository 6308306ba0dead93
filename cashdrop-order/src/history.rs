use cashdrop_shared::Order;

pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Read-only view over placed orders, newest first
#[derive(Debug, Clone, Default)]
pub struct OrderHistory {
    orders: Vec<Order>,
}

impl OrderHistory {
    pub fn new(orders: impl IntoIterator<Item = Order>) -> Self {
        let mut history = Self::default();
        history.extend(orders);
        history
    }

    /// Add or replace orders by id, keeping newest-first order
    pub fn extend(&mut self, orders: impl IntoIterator<Item = Order>) {
        for order in orders {
            match self.orders.iter_mut().find(|existing| existing.id == order.id) {
                Some(existing) if existing.version <= order.version => *existing = order,
                Some(_) => {}
                None => self.orders.push(order),
            }
        }
        self.orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn active(&self) -> Vec<&Order> {
        self.orders.iter().filter(|order| !order.is_terminal()).collect()
    }

    pub fn past(&self) -> Vec<&Order> {
        self.orders.iter().filter(|order| order.is_terminal()).collect()
    }

    pub fn recent(&self, limit: usize) -> &[Order] {
        &self.orders[..limit.min(self.orders.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashdrop_shared::{AddressRef, Amount, OrderStatus, PaymentMode, PriceBreakdown, TipSelection};
    use chrono::{Duration, Utc};

    fn order(minutes_ago: i64, status: OrderStatus) -> Order {
        let mut order = Order::new(
            PriceBreakdown::new(Amount::from_major(500), vec![], Amount::ZERO),
            TipSelection::None,
            AddressRef::new("addr-1"),
            PaymentMode::Cash,
            "INR",
        );
        order.created_at = Utc::now() - Duration::minutes(minutes_ago);
        order.status = status;
        order
    }

    #[test]
    fn test_partitions_newest_first() {
        let history = OrderHistory::new(vec![
            order(30, OrderStatus::Delivered),
            order(5, OrderStatus::Dispatched),
            order(10, OrderStatus::Cancelled),
            order(1, OrderStatus::Placed),
        ]);

        let active: Vec<_> = history.active().iter().map(|o| o.status).collect();
        assert_eq!(active, vec![OrderStatus::Placed, OrderStatus::Dispatched]);

        let past: Vec<_> = history.past().iter().map(|o| o.status).collect();
        assert_eq!(past, vec![OrderStatus::Cancelled, OrderStatus::Delivered]);
    }

    #[test]
    fn test_recent_limit() {
        let history = OrderHistory::new((0..8).map(|i| order(i, OrderStatus::Delivered)));
        let recent = history.recent(DEFAULT_RECENT_LIMIT);
        assert_eq!(recent.len(), 5);
        assert!(recent.windows(2).all(|pair| pair[0].created_at >= pair[1].created_at));
        assert_eq!(history.recent(20).len(), 8);
    }

    #[test]
    fn test_extend_keeps_latest_version() {
        let placed = order(3, OrderStatus::Placed);
        let mut delivered = placed.clone();
        delivered.status = OrderStatus::Delivered;
        delivered.version = 4;

        let mut history = OrderHistory::new(vec![delivered.clone()]);
        history.extend(vec![placed]);

        assert_eq!(history.len(), 1);
        assert_eq!(history.past()[0].status, OrderStatus::Delivered);
    }
}
