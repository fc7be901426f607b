//! Decoded market-data and execution-report payload types.

use crate::core::types::{OrdStatus, OrderId, PositionSide, Price, Qty, Side, TickerId};

/// Which ladder mutation (if any) a [`MarketData`] entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MdType {
    Clear,
    Add,
    Modify,
    Cancel,
    Trade,
    BookTicker,
}

/// One level-update event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketData {
    pub kind: MdType,
    pub order_id: OrderId,
    pub ticker: TickerId,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
}

impl MarketData {
    pub fn clear(ticker: TickerId) -> Self {
        Self {
            kind: MdType::Clear,
            order_id: OrderId::default(),
            ticker,
            side: Side::Invalid,
            price: Price::default(),
            qty: Qty::default(),
        }
    }
}

/// Distinguishes the payload a [`MarketUpdateData`] carries. Sequence
/// numbers (`start_seq`/`end_seq`/`prev_end_seq`) only apply to
/// `DepthDiff`/`Snapshot`; other kinds carry the sentinel [`NO_SEQ`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MdKind {
    DepthDiff,
    Snapshot,
    Trade,
    BookTicker,
    ExchangeInfo,
}

/// Sentinel sequence value for update kinds that carry no sequence
/// numbers (trade, book-ticker, exchange-info).
pub const NO_SEQ: u64 = u64::MAX;

/// One decoded wire message: an ordered batch of [`MarketData`] entries
/// plus the sequencing envelope the sequencer needs.
#[derive(Debug, Clone)]
pub struct MarketUpdateData {
    pub kind: MdKind,
    pub start_seq: u64,
    pub end_seq: u64,
    pub prev_end_seq: u64,
    pub entries: Vec<MarketData>,
}

impl MarketUpdateData {
    pub fn depth_diff(
        start_seq: u64,
        end_seq: u64,
        prev_end_seq: u64,
        entries: Vec<MarketData>,
    ) -> Self {
        Self {
            kind: MdKind::DepthDiff,
            start_seq,
            end_seq,
            prev_end_seq,
            entries,
        }
    }

    pub fn snapshot(end_seq: u64, entries: Vec<MarketData>) -> Self {
        Self {
            kind: MdKind::Snapshot,
            start_seq: NO_SEQ,
            end_seq,
            prev_end_seq: NO_SEQ,
            entries,
        }
    }

    pub fn immediate(kind: MdKind, entries: Vec<MarketData>) -> Self {
        debug_assert!(matches!(
            kind,
            MdKind::Trade | MdKind::BookTicker | MdKind::ExchangeInfo
        ));
        Self {
            kind,
            start_seq: NO_SEQ,
            end_seq: NO_SEQ,
            prev_end_seq: NO_SEQ,
            entries,
        }
    }

    /// Depth-kind payloads participate in the continuity check; trade,
    /// book-ticker, and exchange-info are forwarded unconditionally.
    pub fn is_sequenced(&self) -> bool {
        matches!(self.kind, MdKind::DepthDiff | MdKind::Snapshot)
    }
}

/// Normalized execution report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionReport {
    pub client_order_id: OrderId,
    pub ticker: TickerId,
    pub side: Side,
    /// Spot venues report no position side; normalized to `Both`.
    pub position_side: PositionSide,
    pub status: OrdStatus,
    pub cum_qty: Qty,
    pub last_qty: Qty,
    pub leaves_qty: Qty,
    pub price: Price,
    pub is_maker: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_update_data_sequenced_flag_matches_kind() {
        let diff = MarketUpdateData::depth_diff(1, 5, 0, vec![]);
        assert!(diff.is_sequenced());

        let trade = MarketUpdateData::immediate(MdKind::Trade, vec![]);
        assert!(!trade.is_sequenced());
        assert_eq!(trade.end_seq, NO_SEQ);
    }

    #[test]
    fn clear_entry_carries_no_price_or_qty() {
        let clear = MarketData::clear(TickerId::new("BTCUSDT"));
        assert_eq!(clear.kind, MdType::Clear);
        assert_eq!(clear.price, Price::default());
    }
}
