//! Venue policy filter: applied after reconciliation, before risk and
//! emission. Enforces minimum order-send gap, notional floor, qty
//! bounds, and qty step — all venue-provided instrument rules rather
//! than strategy decisions.

use crate::core::types::Side;
use crate::engine::reconciler::Actions;
use crate::execution::order_manager::SlotBook;
use crate::execution::venue::VenueRules;

/// Apply the venue filter in place, dropping/adjusting actions that
/// violate the venue's rules.
pub fn apply_venue_policy(
    actions: &mut Actions,
    slot_book: &SlotBook,
    now_ns: u64,
    venue: &VenueRules,
) {
    actions.news.retain_mut(|a| {
        if time_gap_blocks(slot_book, a.ticker, a.side, a.position_side, now_ns, venue) {
            return false;
        }
        snap_and_floor(&mut a.price, &mut a.qty, a.side, venue)
    });

    actions.replaces.retain_mut(|a| {
        if time_gap_blocks(slot_book, a.ticker, a.side, a.position_side, now_ns, venue) {
            return false;
        }
        let mut last_qty = a.last_qty;
        let kept = snap_and_floor(&mut a.price, &mut a.qty, a.side, venue);
        last_qty = venue.snap_qty_up(last_qty);
        a.last_qty = last_qty;
        kept
    });

    actions.cancels.retain(|a| {
        !time_gap_blocks(slot_book, a.ticker, a.side, a.position_side, now_ns, venue)
    });
}

fn time_gap_blocks(
    slot_book: &SlotBook,
    ticker: crate::core::types::TickerId,
    side: Side,
    position_side: crate::core::types::PositionSide,
    now_ns: u64,
    venue: &VenueRules,
) -> bool {
    match slot_book.side_book_ref(ticker, side, position_side) {
        Some(side_book) => now_ns.saturating_sub(side_book.last_send_ns) < venue.min_order_time_gap_ns,
        None => false,
    }
}

/// Notional floor + qty bounds/step, applied together since raising qty
/// to clear the floor must itself respect the bounds/step.
fn snap_and_floor(
    price: &mut crate::core::types::Price,
    qty: &mut crate::core::types::Qty,
    _side: Side,
    venue: &VenueRules,
) -> bool {
    let notional = VenueRules::notional_raw(*price, *qty);
    if notional < venue.min_order_notional_raw && price.raw() > 0 {
        let needed = (venue.min_order_notional_raw + price.raw() as i128 - 1) / price.raw() as i128;
        *qty = crate::core::types::Qty::from_raw(needed.max(qty.raw() as i128) as i64);
    }
    *qty = venue.clamp_qty(*qty);
    *qty = venue.snap_qty_up(*qty);
    qty.raw() > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{OrderId, Price, PositionSide, Qty, TickerId, QTY_SCALE};
    use crate::engine::reconciler::NewAction;
    use crate::execution::venue::CancelIdScheme;

    fn venue() -> VenueRules {
        VenueRules {
            continuity_rule: crate::data::sequencer::ContinuityRule::Perpetual,
            cancel_id_scheme: CancelIdScheme::OriginalId,
            min_order_notional_raw: VenueRules::notional_from_usd(5.0),
            min_qty: Qty::from_raw(0),
            max_qty: Qty::from_raw(1_000 * QTY_SCALE),
            qty_increment: Qty::from_raw(1_000),
            min_order_time_gap_ns: 100,
            min_replace_tick_delta: 1,
            min_replace_qty_delta: 1,
        }
    }

    #[test]
    fn raises_qty_to_clear_notional_floor() {
        let mut actions = Actions::default();
        actions.news.push(NewAction {
            layer: 0,
            ticker: TickerId::new("BTCUSDT"),
            side: Side::Buy,
            position_side: PositionSide::Both,
            price: Price::from_raw(1 * crate::core::types::PRICE_SCALE),
            qty: Qty::from_raw(1),
            cl_order_id: OrderId::from_nanos(1),
        });
        let slot_book = SlotBook::new();
        apply_venue_policy(&mut actions, &slot_book, 0, &venue());
        let notional = VenueRules::notional_raw(actions.news[0].price, actions.news[0].qty);
        assert!(notional >= venue().min_order_notional_raw);
    }

    #[test]
    fn time_gap_drops_actions_in_recently_sent_bucket() {
        let mut actions = Actions::default();
        actions.news.push(NewAction {
            layer: 0,
            ticker: TickerId::new("BTCUSDT"),
            side: Side::Buy,
            position_side: PositionSide::Both,
            price: Price::from_raw(100 * crate::core::types::PRICE_SCALE),
            qty: Qty::from_raw(QTY_SCALE),
            cl_order_id: OrderId::from_nanos(1),
        });
        let mut slot_book = SlotBook::new();
        slot_book
            .side_book(TickerId::new("BTCUSDT"), Side::Buy, PositionSide::Both)
            .last_send_ns = 1_000;
        apply_venue_policy(&mut actions, &slot_book, 1_050, &venue());
        assert!(actions.news.is_empty());
    }
}
