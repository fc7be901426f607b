//! Venue rules: a plain struct of values/enums carrying the handful of
//! venue-specific behaviors the reconciler,
//! policy filter, and sequencer need — never a generic parameter or a
//! trait object on the hot path. One `VenueRules` value is built once at
//! startup from config and passed by value/reference into the pieces
//! that need it.

use crate::core::types::{Price, Qty, PRICE_SCALE, QTY_SCALE};
use crate::data::sequencer::ContinuityRule;

/// Whether the venue supports a combined cancel/replace message that
/// addresses the cancelled order as `new_id - 1`, or requires the
/// original id to be used for the cancel half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelIdScheme {
    /// Cancel half addresses the order by its original id.
    OriginalId,
    /// Cancel half addresses the order as `new_id.predecessor()`.
    PredecessorOfNew,
}

#[derive(Debug, Clone, Copy)]
pub struct VenueRules {
    /// Which first-after-snapshot continuity rule this venue's sequencer
    /// instances should use.
    pub continuity_rule: ContinuityRule,
    pub cancel_id_scheme: CancelIdScheme,
    pub min_order_notional_raw: i128,
    pub min_qty: Qty,
    pub max_qty: Qty,
    pub qty_increment: Qty,
    pub min_order_time_gap_ns: u64,
    pub min_replace_tick_delta: i64,
    pub min_replace_qty_delta: i64,
}

impl VenueRules {
    /// Build a `min_order_notional_raw` threshold from a plain-dollar
    /// minimum (e.g. Binance's 5 USDT floor).
    pub fn notional_from_usd(usd: f64) -> i128 {
        (usd * PRICE_SCALE as f64 * QTY_SCALE as f64).round() as i128
    }

    pub fn notional_raw(price: Price, qty: Qty) -> i128 {
        price.raw() as i128 * qty.raw() as i128
    }

    /// Round a quantity up to the nearest multiple of `qty_increment`.
    pub fn snap_qty_up(&self, qty: Qty) -> Qty {
        if self.qty_increment.raw() <= 0 {
            return qty;
        }
        let step = self.qty_increment.raw();
        let rem = qty.raw() % step;
        if rem == 0 {
            qty
        } else {
            Qty::from_raw(qty.raw() + (step - rem))
        }
    }

    pub fn clamp_qty(&self, qty: Qty) -> Qty {
        Qty::from_raw(qty.raw().clamp(self.min_qty.raw(), self.max_qty.raw()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> VenueRules {
        VenueRules {
            continuity_rule: ContinuityRule::Perpetual,
            cancel_id_scheme: CancelIdScheme::OriginalId,
            min_order_notional_raw: VenueRules::notional_from_usd(5.0),
            min_qty: Qty::from_raw(1),
            max_qty: Qty::from_raw(1_000_000 * QTY_SCALE),
            qty_increment: Qty::from_raw(1000),
            min_order_time_gap_ns: 50_000_000,
            min_replace_tick_delta: 1,
            min_replace_qty_delta: 1,
        }
    }

    #[test]
    fn snap_qty_up_rounds_to_next_increment() {
        let r = rules();
        assert_eq!(r.snap_qty_up(Qty::from_raw(1500)), Qty::from_raw(2000));
        assert_eq!(r.snap_qty_up(Qty::from_raw(2000)), Qty::from_raw(2000));
    }

    #[test]
    fn clamp_qty_respects_bounds() {
        let r = rules();
        assert_eq!(r.clamp_qty(Qty::from_raw(0)), r.min_qty);
        assert_eq!(r.clamp_qty(r.max_qty.checked_add(Qty::from_raw(1)).unwrap()), r.max_qty);
    }
}
