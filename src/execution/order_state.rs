//! Order state manager: dispatches execution reports by `ord_status`
//! onto the slot book, rolling back on reject and forwarding fills to
//! the position keeper.

use crate::core::types::{OrdStatus, Qty, Side};
use crate::data::types::ExecutionReport;
use crate::execution::order_manager::{OrderManager, SlotState};
use crate::execution::venue::{CancelIdScheme, VenueRules};
use tracing::{info, warn};

/// A fill forwarded to the position keeper; produced on `Filled` and
/// `PartiallyFilled` transitions.
#[derive(Debug, Clone, Copy)]
pub struct FillEvent {
    pub ticker: crate::core::types::TickerId,
    pub side: Side,
    pub price: crate::core::types::Price,
    pub qty: Qty,
}

pub struct OrderStateManager;

impl OrderStateManager {
    /// Resolve `report` against the slot book, returning a fill event
    /// when one should be forwarded to the position keeper.
    pub fn on_execution_report(
        om: &mut OrderManager,
        report: &ExecutionReport,
        now_ns: u64,
        venue: &VenueRules,
        expiry: &mut crate::execution::expiry::ExpiryManager,
    ) -> Option<FillEvent> {
        let layer = Self::resolve_layer(om, report, venue)?;
        let side_book = om
            .slots
            .side_book(report.ticker, report.side, report.position_side);
        let slot = &mut side_book.slots[layer];
        if slot.cl_order_id != report.client_order_id
            && !Self::matches_new_leg(slot.cl_order_id, report.client_order_id, venue)
        {
            return None;
        }

        match report.status {
            OrdStatus::New => {
                slot.state = SlotState::Live;
                slot.last_used_ns = now_ns;
                expiry.push(
                    crate::execution::expiry::ExpiryKey {
                        ticker: report.ticker,
                        side: report.side,
                        position_side: report.position_side,
                        layer,
                        cl_order_id: slot.cl_order_id,
                    },
                    now_ns + om.ttl_live_ns,
                );
                None
            }
            OrdStatus::PartiallyFilled => {
                slot.last_used_ns = now_ns;
                expiry.push(
                    crate::execution::expiry::ExpiryKey {
                        ticker: report.ticker,
                        side: report.side,
                        position_side: report.position_side,
                        layer,
                        cl_order_id: slot.cl_order_id,
                    },
                    now_ns + om.ttl_live_ns,
                );
                Some(FillEvent {
                    ticker: report.ticker,
                    side: report.side,
                    price: report.price,
                    qty: report.last_qty,
                })
            }
            OrdStatus::Filled => {
                slot.state = SlotState::Dead;
                om.reserved
                    .apply(report.side, Qty::from_raw(-report.side.sign() * report.leaves_qty.raw()));
                Some(FillEvent {
                    ticker: report.ticker,
                    side: report.side,
                    price: report.price,
                    qty: report.last_qty,
                })
            }
            OrdStatus::Canceled | OrdStatus::Expired => {
                if let Some(pending) = side_book.pending_replace[layer].take() {
                    // This was the cancel half of a replace: keep the
                    // layer, move the pre-replace fields back in.
                    let slot = &mut side_book.slots[layer];
                    slot.state = SlotState::Live;
                    slot.price = pending.old_price;
                    slot.last_used_ns = now_ns;
                } else {
                    let slot = &mut side_book.slots[layer];
                    slot.state = SlotState::Dead;
                    om.reserved.apply(
                        report.side,
                        Qty::from_raw(-report.side.sign() * report.leaves_qty.raw()),
                    );
                }
                None
            }
            OrdStatus::Rejected => {
                if let Some(pending) = side_book.pending_replace[layer].take() {
                    let delta = report.leaves_qty.raw();
                    let slot = &mut side_book.slots[layer];
                    slot.state = SlotState::Live;
                    slot.price = pending.old_price;
                    slot.qty = pending.old_qty;
                    om.reserved
                        .apply(report.side, Qty::from_raw(-report.side.sign() * delta));
                } else {
                    let slot = &mut side_book.slots[layer];
                    slot.state = SlotState::Dead;
                    om.reserved
                        .apply(report.side, Qty::from_raw(-report.side.sign() * slot.qty.raw()));
                }
                warn!(ticker = %report.ticker, layer, "order rejected, rolled back slot");
                None
            }
            OrdStatus::PendingNew | OrdStatus::PendingCancel => {
                info!(ticker = %report.ticker, ?report.status, "no-op status, logged only");
                None
            }
        }
    }

    fn matches_new_leg(slot_id: crate::core::types::OrderId, report_id: crate::core::types::OrderId, venue: &VenueRules) -> bool {
        matches!(venue.cancel_id_scheme, CancelIdScheme::PredecessorOfNew) && slot_id == report_id.predecessor()
    }

    fn resolve_layer(
        om: &OrderManager,
        report: &ExecutionReport,
        _venue: &VenueRules,
    ) -> Option<usize> {
        let side_book =
            om.slots
                .side_book_ref(report.ticker, report.side, report.position_side)?;
        side_book
            .orig_id_to_layer
            .get(&report.client_order_id)
            .or_else(|| side_book.new_id_to_layer.get(&report.client_order_id))
            .copied()
    }
}
