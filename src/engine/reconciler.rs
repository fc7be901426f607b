//! Quote reconciler: turns the strategy's desired resting-order set
//! into a minimal new/replace/cancel action set against the current
//! slot book. Read-only with respect to the slot book — the order
//! manager is the one that actually mutates it when applying the
//! returned actions.

use crate::core::types::{OrderId, Price, PositionSide, Qty, Side, TickerId};
use crate::execution::order_manager::SlotBook;
use crate::execution::venue::VenueRules;

/// One desired resting order for the current strategy tick.
#[derive(Debug, Clone, Copy)]
pub struct QuoteIntent {
    pub ticker: TickerId,
    pub side: Side,
    pub position_side: PositionSide,
    pub price: Price,
    pub qty: Qty,
}

#[derive(Debug, Clone, Copy)]
pub struct NewAction {
    pub layer: usize,
    pub ticker: TickerId,
    pub side: Side,
    pub position_side: PositionSide,
    pub price: Price,
    pub qty: Qty,
    pub cl_order_id: OrderId,
}

#[derive(Debug, Clone, Copy)]
pub struct ReplaceAction {
    pub layer: usize,
    pub ticker: TickerId,
    pub side: Side,
    pub position_side: PositionSide,
    pub old_id: OrderId,
    pub new_id: OrderId,
    pub price: Price,
    pub qty: Qty,
    pub last_qty: Qty,
}

#[derive(Debug, Clone, Copy)]
pub struct CancelAction {
    pub layer: usize,
    pub ticker: TickerId,
    pub side: Side,
    pub position_side: PositionSide,
    pub cl_order_id: OrderId,
}

#[derive(Debug, Default)]
pub struct Actions {
    pub news: Vec<NewAction>,
    pub replaces: Vec<ReplaceAction>,
    pub cancels: Vec<CancelAction>,
}

/// Issues client-order ids as fast-clock nanosecond timestamps,
/// nudging forward by one on each call within a tick so concurrent
/// actions in the same reconcile pass never collide.
pub struct IdIssuer {
    last_issued: u64,
}

impl IdIssuer {
    pub fn new() -> Self {
        Self { last_issued: 0 }
    }

    pub fn issue(&mut self, now_ns: u64) -> OrderId {
        let candidate = now_ns.max(self.last_issued + 1);
        self.last_issued = candidate;
        OrderId::from_nanos(candidate)
    }
}

impl Default for IdIssuer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Reconciler {
    ids: IdIssuer,
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            ids: IdIssuer::new(),
        }
    }

    /// Run the per-(side × position_side) diff algorithm over every
    /// active intent for one tick.
    pub fn reconcile(
        &mut self,
        intents: &[QuoteIntent],
        slot_book: &SlotBook,
        now_ns: u64,
        venue: &VenueRules,
    ) -> Actions {
        let mut actions = Actions::default();

        for intent in intents {
            let tick = intent.price.raw();
            let Some(side_book) =
                slot_book.side_book_ref(intent.ticker, intent.side, intent.position_side)
            else {
                actions.news.push(NewAction {
                    layer: 0,
                    ticker: intent.ticker,
                    side: intent.side,
                    position_side: intent.position_side,
                    price: intent.price,
                    qty: intent.qty,
                    cl_order_id: self.ids.issue(now_ns),
                });
                continue;
            };

            let plan = side_book.plan_layer(tick);
            let slot = &side_book.slots[plan.layer];

            use crate::execution::order_manager::SlotState;
            match slot.state {
                SlotState::Invalid | SlotState::Dead => {
                    actions.news.push(NewAction {
                        layer: plan.layer,
                        ticker: intent.ticker,
                        side: intent.side,
                        position_side: intent.position_side,
                        price: intent.price,
                        qty: intent.qty,
                        cl_order_id: self.ids.issue(now_ns),
                    });
                }
                SlotState::Live if plan.is_victim => {
                    actions.replaces.push(ReplaceAction {
                        layer: plan.layer,
                        ticker: intent.ticker,
                        side: intent.side,
                        position_side: intent.position_side,
                        old_id: slot.cl_order_id,
                        new_id: self.ids.issue(now_ns),
                        price: intent.price,
                        qty: intent.qty,
                        last_qty: slot.qty,
                    });
                }
                SlotState::Live => {
                    let price_delta = (intent.price.raw() - slot.price.raw()).abs();
                    let qty_delta = (intent.qty.raw() - slot.qty.raw()).abs();
                    if price_delta >= venue.min_replace_tick_delta
                        || qty_delta >= venue.min_replace_qty_delta
                    {
                        actions.replaces.push(ReplaceAction {
                            layer: plan.layer,
                            ticker: intent.ticker,
                            side: intent.side,
                            position_side: intent.position_side,
                            old_id: slot.cl_order_id,
                            new_id: self.ids.issue(now_ns),
                            price: intent.price,
                            qty: intent.qty,
                            last_qty: slot.qty,
                        });
                    }
                }
                // Reserved/CancelReserved: an action is already in flight
                // for this layer; leave it alone until it resolves.
                SlotState::Reserved | SlotState::CancelReserved => {}
            }
        }

        // Soft-pull of unwanted resting orders is deliberately not
        // implemented: it defaults to a no-op hook.
        actions
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::order_manager::{Slot, SlotState};

    fn venue() -> VenueRules {
        use crate::execution::venue::CancelIdScheme;
        VenueRules {
            continuity_rule: crate::data::sequencer::ContinuityRule::Perpetual,
            cancel_id_scheme: CancelIdScheme::OriginalId,
            min_order_notional_raw: 0,
            min_qty: Qty::from_raw(0),
            max_qty: Qty::from_raw(i64::MAX),
            qty_increment: Qty::from_raw(1),
            min_order_time_gap_ns: 0,
            min_replace_tick_delta: 1,
            min_replace_qty_delta: 1,
        }
    }

    #[test]
    fn empty_slot_book_produces_new_action() {
        let mut reconciler = Reconciler::new();
        let slot_book = SlotBook::new();
        let intent = QuoteIntent {
            ticker: TickerId::new("BTCUSDT"),
            side: Side::Buy,
            position_side: PositionSide::Both,
            price: Price::from_raw(100),
            qty: Qty::from_raw(5),
        };
        let actions = reconciler.reconcile(&[intent], &slot_book, 1, &venue());
        assert_eq!(actions.news.len(), 1);
        assert!(actions.replaces.is_empty());
    }

    #[test]
    fn price_change_on_live_slot_is_replace() {
        let mut reconciler = Reconciler::new();
        let mut slot_book = SlotBook::new();
        {
            let side_book = slot_book.side_book(
                TickerId::new("BTCUSDT"),
                Side::Buy,
                PositionSide::Both,
            );
            side_book.slots[0] = Slot {
                state: SlotState::Live,
                price: Price::from_raw(100),
                qty: Qty::from_raw(1),
                last_used_ns: 0,
                cl_order_id: OrderId::from_nanos(42),
            };
            side_book.layer_ticks[0] = 100;
        }
        let intent = QuoteIntent {
            ticker: TickerId::new("BTCUSDT"),
            side: Side::Buy,
            position_side: PositionSide::Both,
            price: Price::from_raw(101),
            qty: Qty::from_raw(1),
        };
        let actions = reconciler.reconcile(&[intent], &slot_book, 1_000, &venue());
        assert_eq!(actions.replaces.len(), 1);
        let r = &actions.replaces[0];
        assert_eq!(r.old_id, OrderId::from_nanos(42));
        assert_eq!(r.last_qty, Qty::from_raw(1));
    }

    #[test]
    fn l3_reconciling_same_intent_twice_is_idempotent_when_nothing_changed() {
        let mut reconciler = Reconciler::new();
        let mut slot_book = SlotBook::new();
        {
            let side_book = slot_book.side_book(
                TickerId::new("BTCUSDT"),
                Side::Buy,
                PositionSide::Both,
            );
            side_book.slots[0] = Slot {
                state: SlotState::Live,
                price: Price::from_raw(100),
                qty: Qty::from_raw(1),
                last_used_ns: 0,
                cl_order_id: OrderId::from_nanos(42),
            };
            side_book.layer_ticks[0] = 100;
        }
        let intent = QuoteIntent {
            ticker: TickerId::new("BTCUSDT"),
            side: Side::Buy,
            position_side: PositionSide::Both,
            price: Price::from_raw(100),
            qty: Qty::from_raw(1),
        };
        let actions = reconciler.reconcile(&[intent], &slot_book, 1_000, &venue());
        assert!(actions.news.is_empty());
        assert!(actions.replaces.is_empty());
        assert!(actions.cancels.is_empty());
    }
}
