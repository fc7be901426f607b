//! Feature engine: rolling VWAP over trades plus per-update book
//! features. Stateless with respect to the ladder itself — it only
//! tracks the trailing trade window and the most recent BBO-derived
//! numbers, all exposed as `f64` to the strategy layer.

use crate::orderbook::book::Bbo;
use crate::orderbook::depth::{mkt_price, spread_bps_from_prices};

/// One entry in the rolling-VWAP trade window.
#[derive(Debug, Clone, Copy, Default)]
struct TradeEntry {
    price: i64,
    qty: i64,
}

/// Rolling VWAP plus the latest book-derived features. `window_pow2`
/// must be a power of two so the ring index is a cheap mask instead of
/// a modulo.
pub struct FeatureEngine {
    window: Box<[TradeEntry]>,
    mask: usize,
    next: usize,
    filled: usize,
    acc_notional: i128,
    acc_qty: i128,
    mkt_price: Option<i64>,
    spread_bps: Option<f64>,
}

impl FeatureEngine {
    /// `window_pow2` is rounded up to the next power of two if it isn't
    /// one already.
    pub fn new(window_pow2: usize) -> Self {
        let size = window_pow2.next_power_of_two().max(1);
        Self {
            window: vec![TradeEntry::default(); size].into_boxed_slice(),
            mask: size - 1,
            next: 0,
            filled: 0,
            acc_notional: 0,
            acc_qty: 0,
            mkt_price: None,
            spread_bps: None,
        }
    }

    /// Feed one trade into the rolling window, evicting the outgoing
    /// entry's contribution before writing the new one.
    pub fn on_trade(&mut self, price_raw: i64, qty_raw: i64) {
        let slot = self.next & self.mask;
        if self.filled > self.mask {
            let outgoing = self.window[slot];
            self.acc_notional -= outgoing.price as i128 * outgoing.qty as i128;
            self.acc_qty -= outgoing.qty as i128;
        } else {
            self.filled += 1;
        }
        self.window[slot] = TradeEntry {
            price: price_raw,
            qty: qty_raw,
        };
        self.acc_notional += price_raw as i128 * qty_raw as i128;
        self.acc_qty += qty_raw as i128;
        self.next = self.next.wrapping_add(1);
    }

    /// VWAP over the trailing window, in `Price`'s raw scale. `None`
    /// when the window has seen no trades yet.
    pub fn vwap(&self) -> Option<f64> {
        if self.acc_qty <= 0 {
            return None;
        }
        Some((self.acc_notional / self.acc_qty) as f64 / crate::core::types::PRICE_SCALE as f64)
    }

    /// Recompute microprice and spread from the current BBO; called on
    /// every book update.
    pub fn on_book_update(&mut self, bbo: &Bbo) {
        self.mkt_price = mkt_price(
            bbo.bid_price.raw(),
            bbo.bid_qty.raw(),
            bbo.ask_price.raw(),
            bbo.ask_qty.raw(),
        );
        self.spread_bps = spread_bps_from_prices(bbo.bid_price.raw(), bbo.ask_price.raw());
    }

    pub fn mkt_price(&self) -> Option<f64> {
        self.mkt_price
            .map(|raw| raw as f64 / crate::core::types::PRICE_SCALE as f64)
    }

    pub fn spread_bps(&self) -> Option<f64> {
        self.spread_bps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Price, Qty};

    #[test]
    fn vwap_is_none_before_any_trade() {
        let fe = FeatureEngine::new(4);
        assert_eq!(fe.vwap(), None);
    }

    #[test]
    fn vwap_evicts_outgoing_entry_once_window_fills() {
        use crate::core::types::PRICE_SCALE;
        let mut fe = FeatureEngine::new(2);
        fe.on_trade(100 * PRICE_SCALE, 1);
        fe.on_trade(200 * PRICE_SCALE, 1);
        assert_eq!(fe.vwap(), Some(150.0));
        fe.on_trade(300 * PRICE_SCALE, 1);
        // window size 2: entries are now {200, 300}; 100 evicted.
        assert_eq!(fe.vwap(), Some(250.0));
    }

    #[test]
    fn book_update_blends_microprice_and_spread() {
        let mut fe = FeatureEngine::new(4);
        let bbo = Bbo {
            bid_price: Price::from_raw(100 * crate::core::types::PRICE_SCALE),
            ask_price: Price::from_raw(102 * crate::core::types::PRICE_SCALE),
            bid_qty: Qty::from_raw(1 * crate::core::types::QTY_SCALE),
            ask_qty: Qty::from_raw(1 * crate::core::types::QTY_SCALE),
        };
        fe.on_book_update(&bbo);
        assert!((fe.mkt_price().unwrap() - 101.0).abs() < 1e-6);
        assert!(fe.spread_bps().unwrap() > 0.0);
    }
}
