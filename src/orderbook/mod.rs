//! Order book state.
//!
//! [`book`] holds the bucketed, bitmap-indexed price ladder that the
//! sequencer's decoded events are applied to. [`depth`] is a set of pure
//! functions over raw `(price, qty)` level arrays — VWAP, imbalance,
//! microprice, spread — kept free of the ladder's internal layout so the
//! feature engine can run them against a live book or a test fixture
//! with no extra allocation.

pub mod book;
pub mod depth;

pub use book::{Bbo, OrderBook, BUCKET_SIZE};
pub use depth::{
    calculate_vwap_from_levels, mkt_price, orderbook_imbalance_from_levels,
    spread_bps_from_prices, to_display,
};
