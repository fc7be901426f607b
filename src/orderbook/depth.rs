//! Pure depth-math helpers: VWAP over raw level arrays and order-book
//! imbalance. These take plain `(price, qty)` slices rather than
//! borrowing the ladder directly, so the feature engine can run them
//! against either the live book or a test fixture with no allocation
//! on the hot path.

use crate::core::types::{PRICE_SCALE, QTY_SCALE};

/// VWAP over up to `levels.len()` `(price_raw, qty_raw)` pairs. Returns
/// `None` when total quantity is zero (no liquidity on that side).
/// Result is expressed in `Price`'s raw scale.
pub fn calculate_vwap_from_levels(levels: &[(i64, i64)]) -> Option<i64> {
    let mut notional: i128 = 0;
    let mut total_qty: i128 = 0;
    for &(price, qty) in levels {
        notional += price as i128 * qty as i128;
        total_qty += qty as i128;
    }
    if total_qty == 0 {
        return None;
    }
    Some((notional / total_qty) as i64)
}

/// Order-book imbalance: `clamp((Σbid − Σask) / (Σbid + Σask), −1, +1)`.
/// Undefined total (`Σbid + Σask == 0`) returns 0, expressed as a
/// fraction of [`QTY_SCALE`] (so callers get an `i64` in `[-QTY_SCALE,
/// QTY_SCALE]` rather than an `f64`).
pub fn orderbook_imbalance_from_levels(bid_qtys: &[i64], ask_qtys: &[i64]) -> i64 {
    let bid_total: i128 = bid_qtys.iter().map(|&q| q as i128).sum();
    let ask_total: i128 = ask_qtys.iter().map(|&q| q as i128).sum();
    let total = bid_total + ask_total;
    if total == 0 {
        return 0;
    }
    let obi = (bid_total - ask_total) * QTY_SCALE as i128 / total;
    obi.clamp(-(QTY_SCALE as i128), QTY_SCALE as i128) as i64
}

/// Microprice: `(bid_price·ask_qty + ask_price·bid_qty) / (bid_qty +
/// ask_qty)`, the size-weighted blend of BBO used as `mkt_price` in the
/// feature engine. `None` when both sides are empty.
pub fn mkt_price(bid_price: i64, bid_qty: i64, ask_price: i64, ask_qty: i64) -> Option<i64> {
    let denom = bid_qty as i128 + ask_qty as i128;
    if denom == 0 {
        return None;
    }
    let numer = bid_price as i128 * ask_qty as i128 + ask_price as i128 * bid_qty as i128;
    Some((numer / denom) as i64)
}

/// Spread in basis points between two raw prices.
pub fn spread_bps_from_prices(bid_price: i64, ask_price: i64) -> Option<f64> {
    if bid_price <= 0 {
        return None;
    }
    Some((ask_price - bid_price) as f64 / bid_price as f64 * 10_000.0)
}

/// Convert a raw price/qty pair to `f64` display units, for
/// strategy-facing outputs.
pub fn to_display(price_raw: i64, qty_raw: i64) -> (f64, f64) {
    (
        price_raw as f64 / PRICE_SCALE as f64,
        qty_raw as f64 / QTY_SCALE as f64,
    )
}
