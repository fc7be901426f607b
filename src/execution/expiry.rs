//! Expiry manager: one min-heap, keyed by absolute deadline, shared
//! across every (symbol, side, position_side, layer). A cancel is
//! emitted for anything still Reserved or Live when its deadline
//! passes; stale entries (slot already moved on) are silently
//! discarded.

use crate::core::types::{OrderId, PositionSide, Side, TickerId};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryKey {
    pub ticker: TickerId,
    pub side: Side,
    pub position_side: PositionSide,
    pub layer: usize,
    pub cl_order_id: OrderId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExpiryEntry {
    deadline_ns: u64,
    key: ExpiryKey,
}

impl PartialOrd for ExpiryEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExpiryEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.deadline_ns.cmp(&other.deadline_ns)
    }
}

/// A cancel to emit as a result of [`ExpiryManager::sweep_expired`].
#[derive(Debug, Clone, Copy)]
pub struct ExpiredCancel {
    pub key: ExpiryKey,
}

pub struct ExpiryManager {
    heap: BinaryHeap<Reverse<ExpiryEntry>>,
}

impl ExpiryManager {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, key: ExpiryKey, deadline_ns: u64) {
        self.heap.push(Reverse(ExpiryEntry { deadline_ns, key }));
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pop every entry whose deadline has passed. The caller (trade
    /// engine) is responsible for checking each returned key against the
    /// live slot state and skipping stale/Dead/CancelReserved ones — this
    /// manager only knows deadlines, not slot state.
    pub fn sweep_expired(&mut self, now_ns: u64) -> Vec<ExpiredCancel> {
        let mut out = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.deadline_ns > now_ns {
                break;
            }
            let Reverse(entry) = self.heap.pop().unwrap();
            out.push(ExpiredCancel { key: entry.key });
        }
        out
    }
}

impl Default for ExpiryManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PositionSide;

    fn key(layer: usize) -> ExpiryKey {
        ExpiryKey {
            ticker: TickerId::new("BTCUSDT"),
            side: Side::Buy,
            position_side: PositionSide::Both,
            layer,
            cl_order_id: OrderId::from_nanos(layer as u64),
        }
    }

    #[test]
    fn expiry_fires_cancel_after_deadline() {
        let mut mgr = ExpiryManager::new();
        mgr.push(key(0), 1_000_000);
        assert!(mgr.sweep_expired(500_000).is_empty());
        let fired = mgr.sweep_expired(2_000_000);
        assert_eq!(fired.len(), 1);
        assert!(mgr.is_empty());
    }

    #[test]
    fn heap_size_bounded_by_pushes_minus_pops() {
        let mut mgr = ExpiryManager::new();
        for i in 0..10 {
            mgr.push(key(i % 8), i as u64 * 10);
        }
        assert_eq!(mgr.len(), 10);
        let fired = mgr.sweep_expired(1_000);
        assert_eq!(fired.len(), 10);
        assert!(mgr.is_empty());
    }

    #[test]
    fn pops_in_deadline_order() {
        let mut mgr = ExpiryManager::new();
        mgr.push(key(1), 300);
        mgr.push(key(2), 100);
        mgr.push(key(3), 200);
        let fired = mgr.sweep_expired(1_000);
        let deadlines: Vec<usize> = fired.iter().map(|c| c.key.layer).collect();
        assert_eq!(deadlines, vec![2, 3, 1]);
    }
}
