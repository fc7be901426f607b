//! An HFT market-making trading core: decodes exchange market data and
//! execution reports, maintains a bucketed order book and slot-based
//! resting-order book per symbol, and reconciles a strategy's desired
//! quotes against live orders through a venue policy filter, a pre-trade
//! risk filter, and an order/expiry manager — all on a single
//! allocation-free trade-engine thread.
//!
//! ## Core Modules
//! - `core`: fixed-point scalar types, the fast monotonic clock, domain
//!   error types.
//! - `data`: decoders, the per-symbol market-data sequencer, and the
//!   wire payload types they produce.
//! - `orderbook`: the bucketed bitmap price ladder and depth-math
//!   helpers.
//! - `engine`: feature engine, quote reconciler, venue policy filter,
//!   and the trade-engine event loop that ties everything together.
//! - `execution`: slot book, order/expiry/order-state managers,
//!   position keeper, venue rules, and the outbound encoder.
//! - `risk`: the pre-trade risk filter.
//! - `config`: runtime configuration loaded from TOML.
//! - `perf`: the SPSC queue used to hand work off the hot path.

pub mod config;
pub mod core;
pub mod data;
pub mod engine;
pub mod execution;
pub mod orderbook;
pub mod perf;
pub mod risk;
pub mod utils;

pub use core::{
    OrdStatus, OrdType, OrderId, Price, PrecisionConfig, PositionSide, Qty, Side, Stp, TickerId,
    TimeInForce, PRICE_SCALE, QTY_SCALE,
};
pub use data::{ContinuityRule, MarketDataSequencer, MarketUpdateData, ExecutionReport};
pub use engine::{Reconciler, Strategy, TradeEngine};
pub use execution::{OrderManager, OrderRequest, PositionKeeper, VenueRules};
pub use orderbook::{Bbo, OrderBook};
pub use risk::{PreTradeFilter, RiskLimits};

/// Convenience re-exports for binaries wiring up a trade engine.
pub mod prelude {
    pub use crate::core::{
        OrderId, Price, PositionSide, Qty, Side, TickerId, PRICE_SCALE, QTY_SCALE,
    };
    pub use crate::engine::{QuoteIntent, Reconciler, Strategy, TradeEngine};
    pub use crate::execution::{OrderManager, OrderRequest, PositionKeeper, VenueRules};
    pub use crate::orderbook::{Bbo, OrderBook};
    pub use crate::risk::{PreTradeFilter, RiskLimits};
}
