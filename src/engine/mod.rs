//! Trading Engine
//!
//! [`feature_engine`] derives per-symbol microstructure features from
//! the order book on every update. [`venue_policy`] and [`reconciler`]
//! turn a strategy's desired quotes into concrete new/cancel/replace
//! actions against the slot book. [`trade_engine`] is the event loop
//! that drains the market-data and execution-report queues, drives a
//! pluggable [`trade_engine::Strategy`], and dispatches the resulting
//! actions through the venue policy filter, the pre-trade risk filter,
//! and the order/expiry managers.

pub mod feature_engine;
pub mod reconciler;
pub mod trade_engine;
pub mod venue_policy;

pub use feature_engine::FeatureEngine;
pub use reconciler::{
    Actions, CancelAction, IdIssuer, NewAction, QuoteIntent, ReplaceAction, Reconciler,
};
pub use trade_engine::{Strategy, TradeEngine, BATCH_LIMIT_MD, BATCH_LIMIT_RESP};
pub use venue_policy::apply_venue_policy;
