//! Slot book and order manager.
//!
//! One [`SideBook`] per (ticker, side, position_side) holds up to
//! [`SLOTS_PER_SIDE`] resting-order slots. The reconciler only reads it
//! (via [`SideBook::plan_layer`]); the order manager is the sole writer,
//! applying the reconciler/policy/risk-filtered action set in the fixed
//! order new → replace → cancel.

use crate::core::types::{OrderId, Price, Qty, Side, TickerId};
use std::collections::HashMap;

pub const SLOTS_PER_SIDE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Invalid,
    Reserved,
    Live,
    CancelReserved,
    Dead,
}

/// Snapshot of a slot's pre-replace price/qty, so a `Rejected` report can
/// roll the slot back to its prior resting state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingReplace {
    pub old_price: Price,
    pub old_qty: Qty,
    pub old_tick: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Slot {
    pub state: SlotState,
    pub price: Price,
    pub qty: Qty,
    pub last_used_ns: u64,
    pub cl_order_id: OrderId,
}

/// Result of planning which layer an intent at `tick` should occupy.
#[derive(Debug, Clone, Copy)]
pub struct LayerPlan {
    pub layer: usize,
    /// True when `layer` holds a live order that must be replaced to
    /// make room (no free/matching slot was available).
    pub is_victim: bool,
}

/// The per-(side, position_side) slot array plus its lookup indices.
#[derive(Debug, Default)]
pub struct SideBook {
    pub slots: [Slot; SLOTS_PER_SIDE],
    pub layer_ticks: [i64; SLOTS_PER_SIDE],
    pub orig_id_to_layer: HashMap<OrderId, usize>,
    pub new_id_to_layer: HashMap<OrderId, usize>,
    pub pending_replace: [Option<PendingReplace>; SLOTS_PER_SIDE],
    pub last_send_ns: u64,
}

impl SideBook {
    /// Plan which layer an intent at `tick` should occupy.
    pub fn plan_layer(&self, tick: i64) -> LayerPlan {
        for (layer, slot) in self.slots.iter().enumerate() {
            if !matches!(slot.state, SlotState::Invalid | SlotState::Dead)
                && self.layer_ticks[layer] == tick
            {
                return LayerPlan {
                    layer,
                    is_victim: false,
                };
            }
        }
        for (layer, slot) in self.slots.iter().enumerate() {
            if matches!(slot.state, SlotState::Invalid | SlotState::Dead) {
                return LayerPlan {
                    layer,
                    is_victim: false,
                };
            }
        }
        let victim = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.state == SlotState::Live)
            .min_by_key(|(_, s)| s.last_used_ns)
            .map(|(layer, _)| layer)
            .unwrap_or(0);
        LayerPlan {
            layer: victim,
            is_victim: true,
        }
    }
}

/// Keyed collection of [`SideBook`]s, one per (ticker, side, position_side).
#[derive(Default)]
pub struct SlotBook {
    books: HashMap<(TickerId, Side, crate::core::types::PositionSide), SideBook>,
}

impl SlotBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn side_book(
        &mut self,
        ticker: TickerId,
        side: Side,
        position_side: crate::core::types::PositionSide,
    ) -> &mut SideBook {
        self.books.entry((ticker, side, position_side)).or_default()
    }

    pub fn side_book_ref(
        &self,
        ticker: TickerId,
        side: Side,
        position_side: crate::core::types::PositionSide,
    ) -> Option<&SideBook> {
        self.books.get(&(ticker, side, position_side))
    }
}

/// One outbound request emitted by the order manager; the encoder turns
/// this into a wire message.
#[derive(Debug, Clone, Copy)]
pub enum OrderRequest {
    New {
        ticker: TickerId,
        side: Side,
        position_side: crate::core::types::PositionSide,
        price: Price,
        qty: Qty,
        cl_order_id: OrderId,
    },
    Replace {
        ticker: TickerId,
        side: Side,
        position_side: crate::core::types::PositionSide,
        old_id: OrderId,
        new_id: OrderId,
        price: Price,
        qty: Qty,
        last_qty: Qty,
    },
    Cancel {
        ticker: TickerId,
        side: Side,
        position_side: crate::core::types::PositionSide,
        cl_order_id: OrderId,
    },
}

/// Reserved-inventory tracker: outstanding qty committed to open orders
/// but not yet confirmed filled or canceled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReservedTracker {
    pub long_reserved: Qty,
    pub short_reserved: Qty,
}

impl ReservedTracker {
    pub fn apply(&mut self, side: Side, delta: Qty) {
        match side {
            Side::Buy => {
                self.long_reserved = Qty::from_raw(self.long_reserved.raw() + delta.raw())
            }
            Side::Sell => {
                self.short_reserved = Qty::from_raw(self.short_reserved.raw() + delta.raw())
            }
            _ => {}
        }
    }
}

use crate::engine::reconciler::{CancelAction, NewAction, ReplaceAction};
use crate::execution::expiry::{ExpiryKey, ExpiryManager};

pub struct OrderManager {
    pub slots: SlotBook,
    pub reserved: ReservedTracker,
    pub ttl_reserved_ns: u64,
    pub ttl_live_ns: u64,
}

impl OrderManager {
    pub fn new(ttl_reserved_ns: u64, ttl_live_ns: u64) -> Self {
        Self {
            slots: SlotBook::new(),
            reserved: ReservedTracker::default(),
            ttl_reserved_ns,
            ttl_live_ns,
        }
    }

    /// Apply one New action. Drops the action (no request emitted) if
    /// another layer already holds the tick.
    pub fn apply_new(
        &mut self,
        action: &NewAction,
        now_ns: u64,
        expiry: &mut ExpiryManager,
    ) -> Option<OrderRequest> {
        let side_book = self
            .slots
            .side_book(action.ticker, action.side, action.position_side);
        let tick = action.price.raw();
        if side_book
            .layer_ticks
            .iter()
            .enumerate()
            .any(|(l, &t)| l != action.layer && t == tick && side_book.slots[l].state != SlotState::Dead && side_book.slots[l].state != SlotState::Invalid)
        {
            return None;
        }
        side_book.slots[action.layer] = Slot {
            state: SlotState::Reserved,
            price: action.price,
            qty: action.qty,
            last_used_ns: now_ns,
            cl_order_id: action.cl_order_id,
        };
        side_book.layer_ticks[action.layer] = tick;
        side_book
            .orig_id_to_layer
            .insert(action.cl_order_id, action.layer);

        self.reserved.apply(action.side, Qty::from_raw(action.side.sign() * action.qty.raw()));
        expiry.push(
            ExpiryKey {
                ticker: action.ticker,
                side: action.side,
                position_side: action.position_side,
                layer: action.layer,
                cl_order_id: action.cl_order_id,
            },
            now_ns + self.ttl_reserved_ns,
        );

        Some(OrderRequest::New {
            ticker: action.ticker,
            side: action.side,
            position_side: action.position_side,
            price: action.price,
            qty: action.qty,
            cl_order_id: action.cl_order_id,
        })
    }

    /// Apply one Replace action.
    pub fn apply_replace(
        &mut self,
        action: &ReplaceAction,
        now_ns: u64,
        expiry: &mut ExpiryManager,
    ) -> Option<OrderRequest> {
        let side_book = self
            .slots
            .side_book(action.ticker, action.side, action.position_side);
        let new_tick = action.price.raw();
        if side_book.layer_ticks.iter().enumerate().any(|(l, &t)| {
            l != action.layer
                && t == new_tick
                && !matches!(side_book.slots[l].state, SlotState::Dead | SlotState::Invalid)
        }) {
            return None;
        }

        let old_slot = side_book.slots[action.layer];
        side_book.pending_replace[action.layer] = Some(PendingReplace {
            old_price: old_slot.price,
            old_qty: old_slot.qty,
            old_tick: side_book.layer_ticks[action.layer],
        });

        side_book.slots[action.layer] = Slot {
            state: SlotState::CancelReserved,
            price: action.price,
            qty: action.qty,
            last_used_ns: now_ns,
            cl_order_id: action.new_id,
        };
        side_book.layer_ticks[action.layer] = new_tick;
        side_book.new_id_to_layer.insert(action.new_id, action.layer);

        let delta = Qty::from_raw(action.qty.raw() - action.last_qty.raw());
        self.reserved
            .apply(action.side, Qty::from_raw(action.side.sign() * delta.raw()));
        expiry.push(
            ExpiryKey {
                ticker: action.ticker,
                side: action.side,
                position_side: action.position_side,
                layer: action.layer,
                cl_order_id: action.new_id,
            },
            now_ns + self.ttl_reserved_ns,
        );

        Some(OrderRequest::Replace {
            ticker: action.ticker,
            side: action.side,
            position_side: action.position_side,
            old_id: action.old_id,
            new_id: action.new_id,
            price: action.price,
            qty: action.qty,
            last_qty: action.last_qty,
        })
    }

    /// Apply one Cancel action. Reserved tracker is untouched until the
    /// state machine confirms the cancel.
    pub fn apply_cancel(&mut self, action: &CancelAction, now_ns: u64) -> Option<OrderRequest> {
        let side_book = self
            .slots
            .side_book(action.ticker, action.side, action.position_side);
        let slot = &mut side_book.slots[action.layer];
        slot.state = SlotState::CancelReserved;
        slot.last_used_ns = now_ns;
        Some(OrderRequest::Cancel {
            ticker: action.ticker,
            side: action.side,
            position_side: action.position_side,
            cl_order_id: action.cl_order_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PositionSide;

    #[test]
    fn plan_layer_reuses_matching_tick() {
        let mut side_book = SideBook::default();
        side_book.slots[2].state = SlotState::Live;
        side_book.layer_ticks[2] = 100;
        let plan = side_book.plan_layer(100);
        assert_eq!(plan.layer, 2);
        assert!(!plan.is_victim);
    }

    #[test]
    fn plan_layer_picks_free_slot_before_victim() {
        let mut side_book = SideBook::default();
        side_book.slots[0].state = SlotState::Live;
        side_book.layer_ticks[0] = 50;
        let plan = side_book.plan_layer(999);
        assert_eq!(plan.layer, 1);
        assert!(!plan.is_victim);
    }

    #[test]
    fn plan_layer_picks_oldest_live_as_victim_when_full() {
        let mut side_book = SideBook::default();
        for i in 0..SLOTS_PER_SIDE {
            side_book.slots[i].state = SlotState::Live;
            side_book.slots[i].last_used_ns = (i as u64 + 1) * 100;
            side_book.layer_ticks[i] = i as i64;
        }
        let plan = side_book.plan_layer(9999);
        assert_eq!(plan.layer, 0);
        assert!(plan.is_victim);
    }

    #[test]
    fn apply_new_reserves_slot_and_updates_tracker() {
        let mut om = OrderManager::new(1_000_000, 5_000_000);
        let mut expiry = ExpiryManager::new();
        let action = NewAction {
            layer: 0,
            ticker: TickerId::new("BTCUSDT"),
            side: Side::Buy,
            position_side: PositionSide::Both,
            price: Price::from_raw(100),
            qty: Qty::from_raw(5),
            cl_order_id: OrderId::from_nanos(42),
        };
        let req = om.apply_new(&action, 0, &mut expiry);
        assert!(req.is_some());
        assert_eq!(om.reserved.long_reserved, Qty::from_raw(5));
        let side_book = om
            .slots
            .side_book_ref(action.ticker, Side::Buy, PositionSide::Both)
            .unwrap();
        assert_eq!(side_book.slots[0].state, SlotState::Reserved);
    }
}
