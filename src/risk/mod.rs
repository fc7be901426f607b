//! Pre-trade risk filter.
//!
//! Applied after the venue policy filter, before an action reaches the
//! order manager. Maintains a running per-symbol reserved-qty total
//! seeded from the reserved-position tracker; each new/replace action's
//! delta is checked against [`types::RiskLimits`] before it is allowed
//! to proceed. Rejected actions are dropped individually — the rest of
//! the batch is unaffected.

pub mod pre_trade;
pub mod types;

pub use pre_trade::{check_pre_trade_risk, PreTradeFilter};
pub use types::{RiskLimits, RiskOutcome, RiskState, SymbolRiskState};
