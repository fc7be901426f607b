//! Position keeper: per-symbol position, cost basis, and PnL, all
//! scaled int64. Single-writer — only the trade engine thread ever
//! calls into this.

use crate::core::types::{Qty, Side, TickerId};
use std::collections::HashMap;

/// Per-symbol position and PnL state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolPosition {
    pub net_position: i64,
    pub long_position: i64,
    pub short_position: i64,
    /// VWAP cost of the open long lot, scaled as a `Price` raw value.
    pub long_cost: i64,
    /// VWAP cost of the open short lot, scaled as a `Price` raw value.
    pub short_cost: i64,
    pub realized_pnl_long: i64,
    pub realized_pnl_short: i64,
    pub unrealized_pnl: i64,
    pub volume: i64,
}

impl SymbolPosition {
    fn realized_pnl(&self) -> i64 {
        self.realized_pnl_long + self.realized_pnl_short
    }
}

pub struct PositionKeeper {
    positions: HashMap<TickerId, SymbolPosition>,
}

impl PositionKeeper {
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    pub fn position(&self, ticker: TickerId) -> SymbolPosition {
        self.positions.get(&ticker).copied().unwrap_or_default()
    }

    pub fn realized_pnl(&self, ticker: TickerId) -> i64 {
        self.position(ticker).realized_pnl()
    }

    /// Apply one fill: extends the opening side's VWAP cost, or
    /// realizes PnL against the closing side's cost basis, crossing over
    /// to the opposite side if the fill flips net position. Returns the
    /// change in realized PnL so callers can forward it to the risk
    /// filter's running loss total.
    pub fn on_fill(&mut self, ticker: TickerId, side: Side, price_raw: i64, qty: Qty) -> i64 {
        let pos = self.positions.entry(ticker).or_default();
        let pnl_before = pos.realized_pnl();
        let mut remaining = qty.raw();
        pos.volume += remaining;

        match side {
            Side::Buy => {
                // Close short first, then open/extend long with any leftover.
                if pos.short_position > 0 {
                    let closed = remaining.min(pos.short_position);
                    pos.realized_pnl_short += closed * (pos.short_cost - price_raw);
                    pos.short_position -= closed;
                    remaining -= closed;
                    if pos.short_position == 0 {
                        pos.short_cost = 0;
                    }
                }
                if remaining > 0 {
                    let new_total = pos.long_position + remaining;
                    pos.long_cost = if new_total > 0 {
                        (pos.long_cost * pos.long_position + price_raw * remaining) / new_total
                    } else {
                        0
                    };
                    pos.long_position = new_total;
                }
            }
            Side::Sell => {
                if pos.long_position > 0 {
                    let closed = remaining.min(pos.long_position);
                    pos.realized_pnl_long += closed * (price_raw - pos.long_cost);
                    pos.long_position -= closed;
                    remaining -= closed;
                    if pos.long_position == 0 {
                        pos.long_cost = 0;
                    }
                }
                if remaining > 0 {
                    let new_total = pos.short_position + remaining;
                    pos.short_cost = if new_total > 0 {
                        (pos.short_cost * pos.short_position + price_raw * remaining) / new_total
                    } else {
                        0
                    };
                    pos.short_position = new_total;
                }
            }
            Side::Trade | Side::Invalid => {}
        }

        pos.net_position = pos.long_position - pos.short_position;
        pos.realized_pnl() - pnl_before
    }

    /// Mark-to-market unrealized PnL against the current mid, called on
    /// every BBO update.
    pub fn mark_to_market(&mut self, ticker: TickerId, mark_price_raw: i64) {
        let pos = self.positions.entry(ticker).or_default();
        let long_unrealized = pos.long_position * (mark_price_raw - pos.long_cost);
        let short_unrealized = pos.short_position * (pos.short_cost - mark_price_raw);
        pos.unrealized_pnl = long_unrealized + short_unrealized;
    }
}

impl Default for PositionKeeper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker() -> TickerId {
        TickerId::new("BTCUSDT")
    }

    #[test]
    fn opening_fill_sets_vwap_cost() {
        let mut pk = PositionKeeper::new();
        pk.on_fill(ticker(), Side::Buy, 100, Qty::from_raw(10));
        let pos = pk.position(ticker());
        assert_eq!(pos.long_position, 10);
        assert_eq!(pos.long_cost, 100);
        assert_eq!(pos.net_position, 10);
    }

    #[test]
    fn averaging_fill_updates_vwap() {
        let mut pk = PositionKeeper::new();
        pk.on_fill(ticker(), Side::Buy, 100, Qty::from_raw(10));
        pk.on_fill(ticker(), Side::Buy, 200, Qty::from_raw(10));
        let pos = pk.position(ticker());
        assert_eq!(pos.long_position, 20);
        assert_eq!(pos.long_cost, 150);
    }

    #[test]
    fn closing_fill_realizes_pnl_and_flips_to_short() {
        let mut pk = PositionKeeper::new();
        pk.on_fill(ticker(), Side::Buy, 100, Qty::from_raw(10));
        pk.on_fill(ticker(), Side::Sell, 120, Qty::from_raw(15));
        let pos = pk.position(ticker());
        assert_eq!(pos.long_position, 0);
        assert_eq!(pos.short_position, 5);
        assert_eq!(pos.short_cost, 120);
        assert_eq!(pos.realized_pnl_long, 10 * (120 - 100));
        assert_eq!(pos.net_position, -5);
    }

    #[test]
    fn mark_to_market_updates_unrealized_pnl_for_long() {
        let mut pk = PositionKeeper::new();
        pk.on_fill(ticker(), Side::Buy, 100, Qty::from_raw(10));
        pk.mark_to_market(ticker(), 110);
        assert_eq!(pk.position(ticker()).unrealized_pnl, 10 * (110 - 100));
    }
}
