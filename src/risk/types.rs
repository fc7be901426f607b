//! Risk-filter limits and outcomes.
//!
//! All thresholds are scaled int64s in the same units as [`crate::core::types::Price`]
//! and [`crate::core::types::Qty`] — no `Decimal` on the risk hot path.

use crate::core::types::{Qty, TickerId};

/// Per-venue/per-strategy risk thresholds, loaded once from config.
#[derive(Debug, Clone, Copy)]
pub struct RiskLimits {
    /// Largest single new/replace delta allowed.
    pub max_order_qty: Qty,
    /// Upper bound on running reserved qty (long side).
    pub max_position_qty: Qty,
    /// Lower bound on running reserved qty (most-negative/short side).
    pub min_position_qty: Qty,
    /// Realized-loss threshold, scaled like [`crate::core::types::Price`]
    /// notional; exceeding it (more negative) halts new risk-increasing
    /// actions for the symbol.
    pub max_loss: i64,
}

/// Outcome of [`crate::risk::pre_trade::check_pre_trade_risk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskOutcome {
    Allowed,
    OrderTooLarge,
    PositionTooLarge,
    PositionTooSmall,
    LossTooLarge,
}

impl RiskOutcome {
    pub fn is_allowed(self) -> bool {
        matches!(self, RiskOutcome::Allowed)
    }
}

impl std::fmt::Display for RiskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskOutcome::Allowed => write!(f, "allowed"),
            RiskOutcome::OrderTooLarge => write!(f, "order exceeds max order qty"),
            RiskOutcome::PositionTooLarge => write!(f, "projected position exceeds max"),
            RiskOutcome::PositionTooSmall => write!(f, "projected position below min"),
            RiskOutcome::LossTooLarge => write!(f, "realized loss exceeds max"),
        }
    }
}

/// Running per-symbol risk state; only the trade-engine thread writes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolRiskState {
    pub reserved_qty: Qty,
    pub realized_loss: i64,
}

/// Keyed state for every symbol the risk filter has seen.
#[derive(Debug, Default)]
pub struct RiskState {
    pub symbols: std::collections::HashMap<TickerId, SymbolRiskState>,
}

impl RiskState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&mut self, ticker: TickerId) -> &mut SymbolRiskState {
        self.symbols.entry(ticker).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_outcome_allowed_predicate() {
        assert!(RiskOutcome::Allowed.is_allowed());
        assert!(!RiskOutcome::OrderTooLarge.is_allowed());
    }

    #[test]
    fn risk_state_defaults_symbol_on_first_touch() {
        let mut state = RiskState::new();
        let s = state.entry(TickerId::new("BTCUSDT"));
        assert_eq!(s.reserved_qty, Qty::default());
        assert_eq!(s.realized_loss, 0);
    }
}
