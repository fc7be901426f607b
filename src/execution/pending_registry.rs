//! Pending-request registry: a concurrent map the trade-engine thread
//! writes on every outbound request and the OE-read thread reads to
//! synthesize a reject report if the transport drops a request before
//! the venue ever sees it. The critical section on either side is a
//! single hash-slot write or erase, so a [`DashMap`] sharded lock is
//! enough — no channel, no broadcast.

use crate::core::types::{OrderId, PositionSide, Side, TickerId};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct PendingRequest {
    pub ticker: TickerId,
    pub side: Side,
    pub position_side: PositionSide,
    pub submitted_ns: u64,
}

/// Cheap to clone: an `Arc` around the shared map.
#[derive(Clone, Default)]
pub struct PendingRequestRegistry {
    inner: Arc<DashMap<OrderId, PendingRequest>>,
}

impl PendingRequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        cl_order_id: OrderId,
        ticker: TickerId,
        side: Side,
        position_side: PositionSide,
        submitted_ns: u64,
    ) {
        self.inner.insert(
            cl_order_id,
            PendingRequest {
                ticker,
                side,
                position_side,
                submitted_ns,
            },
        );
    }

    /// Called by the trade-engine thread once an execution report
    /// resolves the request (accepted or rejected by the venue).
    pub fn remove(&self, cl_order_id: OrderId) -> Option<PendingRequest> {
        self.inner.remove(&cl_order_id).map(|(_, v)| v)
    }

    /// Called by the OE-read thread: if the transport fails to deliver
    /// a request, it looks the id up here to synthesize a reject report
    /// carrying the right ticker/side instead of dropping it silently.
    pub fn get(&self, cl_order_id: OrderId) -> Option<PendingRequest> {
        self.inner.get(&cl_order_id).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_remove_round_trips() {
        let registry = PendingRequestRegistry::new();
        let id = OrderId::from_nanos(1);
        registry.insert(id, TickerId::new("BTCUSDT"), Side::Buy, PositionSide::Both, 100);
        assert_eq!(registry.len(), 1);
        let entry = registry.get(id).unwrap();
        assert_eq!(entry.ticker, TickerId::new("BTCUSDT"));

        let removed = registry.remove(id).unwrap();
        assert_eq!(removed.side, Side::Buy);
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_of_unknown_id_is_none() {
        let registry = PendingRequestRegistry::new();
        assert!(registry.remove(OrderId::from_nanos(99)).is_none());
    }
}
