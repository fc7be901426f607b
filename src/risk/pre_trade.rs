//! Pre-Trade Risk Filter
//!
//! The last gate between the venue policy filter and the order
//! manager, applied per new/replace action after the reconciler and
//! venue filter have already run.
//!
//! ## Checks Performed
//!
//! 1. **Order size** — delta within `max_order_qty`
//! 2. **Position bounds** — projected reserved qty within
//!    `min_position_qty..=max_position_qty`
//! 3. **Realized loss** — symbol's running loss within `max_loss`

use crate::core::types::{Qty, Side, TickerId};
use crate::risk::types::{RiskLimits, RiskOutcome, RiskState};
use tracing::warn;

/// Check one action's risk delta against `limits`, given the symbol's
/// running reserved qty. Does not mutate state — callers apply the delta
/// via [`PreTradeFilter::record`] only once the action is accepted
/// downstream.
pub fn check_pre_trade_risk(
    side: Side,
    delta: Qty,
    running_reserved: Qty,
    realized_loss: i64,
    limits: &RiskLimits,
) -> RiskOutcome {
    if delta.raw().abs() > limits.max_order_qty.raw() {
        return RiskOutcome::OrderTooLarge;
    }

    let projected = running_reserved.raw() + side.sign() * delta.raw();
    if projected > limits.max_position_qty.raw() {
        return RiskOutcome::PositionTooLarge;
    }
    if projected < limits.min_position_qty.raw() {
        return RiskOutcome::PositionTooSmall;
    }

    if realized_loss < limits.max_loss {
        return RiskOutcome::LossTooLarge;
    }

    RiskOutcome::Allowed
}

/// Stateful wrapper around [`check_pre_trade_risk`]: owns the per-symbol
/// reserved/loss state the risk filter needs across the batch of actions
/// in one reconciler tick.
pub struct PreTradeFilter {
    limits: RiskLimits,
    state: RiskState,
}

impl PreTradeFilter {
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            state: RiskState::new(),
        }
    }

    /// Evaluate one action; on `Allowed`, commits the delta to the
    /// running total immediately so subsequent actions in the same batch
    /// see it.
    pub fn check_and_record(&mut self, ticker: TickerId, side: Side, delta: Qty) -> RiskOutcome {
        let symbol = self.state.entry(ticker);
        let outcome = check_pre_trade_risk(
            side,
            delta,
            symbol.reserved_qty,
            symbol.realized_loss,
            &self.limits,
        );
        if outcome.is_allowed() {
            symbol.reserved_qty = Qty::from_raw(symbol.reserved_qty.raw() + side.sign() * delta.raw());
        } else {
            warn!(ticker = %ticker, ?side, delta = delta.raw(), %outcome, "pre-trade risk rejected action");
        }
        outcome
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Record a realized loss (or gain, as a positive delta) against a
    /// symbol's running total; called by the position keeper on fills.
    pub fn apply_realized_pnl(&mut self, ticker: TickerId, pnl_delta: i64) {
        let symbol = self.state.entry(ticker);
        symbol.realized_loss += pnl_delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::QTY_SCALE;

    fn test_limits() -> RiskLimits {
        RiskLimits {
            max_order_qty: Qty::from_raw(500 * QTY_SCALE),
            max_position_qty: Qty::from_raw(1_000 * QTY_SCALE),
            min_position_qty: Qty::from_raw(-1_000 * QTY_SCALE),
            max_loss: -1_000_000_000,
        }
    }

    #[test]
    fn order_too_large_leaves_other_actions_alone() {
        let limits = test_limits();
        let mut filter = PreTradeFilter::new(limits);
        let ticker = TickerId::new("BTCUSDT");

        let first = filter.check_and_record(ticker, Side::Buy, Qty::from_raw(100 * QTY_SCALE));
        assert_eq!(first, RiskOutcome::Allowed);

        let second = filter.check_and_record(ticker, Side::Buy, Qty::from_raw(10_000 * QTY_SCALE));
        assert_eq!(second, RiskOutcome::OrderTooLarge);

        let symbol = filter.state.entry(ticker);
        assert_eq!(symbol.reserved_qty, Qty::from_raw(100 * QTY_SCALE));
    }

    #[test]
    fn position_too_large_rejects_when_projected_exceeds_max() {
        let limits = test_limits();
        let outcome = check_pre_trade_risk(
            Side::Buy,
            Qty::from_raw(400 * QTY_SCALE),
            Qty::from_raw(900 * QTY_SCALE),
            0,
            &limits,
        );
        assert_eq!(outcome, RiskOutcome::PositionTooLarge);
    }

    #[test]
    fn position_too_small_rejects_when_projected_below_min() {
        let limits = test_limits();
        let outcome = check_pre_trade_risk(
            Side::Sell,
            Qty::from_raw(400 * QTY_SCALE),
            Qty::from_raw(-900 * QTY_SCALE),
            0,
            &limits,
        );
        assert_eq!(outcome, RiskOutcome::PositionTooSmall);
    }

    #[test]
    fn loss_too_large_rejects_when_realized_loss_exceeds_max() {
        let limits = test_limits();
        let outcome = check_pre_trade_risk(
            Side::Buy,
            Qty::from_raw(10 * QTY_SCALE),
            Qty::default(),
            -2_000_000_000,
            &limits,
        );
        assert_eq!(outcome, RiskOutcome::LossTooLarge);
    }

    #[test]
    fn allowed_action_updates_sign_adjusted_running_total() {
        let limits = test_limits();
        let mut filter = PreTradeFilter::new(limits);
        let ticker = TickerId::new("BTCUSDT");
        filter.check_and_record(ticker, Side::Sell, Qty::from_raw(100 * QTY_SCALE));
        let symbol = filter.state.entry(ticker);
        assert_eq!(symbol.reserved_qty, Qty::from_raw(-100 * QTY_SCALE));
    }
}
