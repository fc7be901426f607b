//! Zero-overhead scalar types for the trading core.
//!
//! All types here are `Copy`, fit in one or two registers, and carry no
//! heap allocation. Price and quantity are kept in separate scaled-int64
//! spaces rather than a single shared scale: price ticks and quantity
//! lots move at different resolutions on every venue this core has been
//! pointed at, and collapsing them into one scale invites silent
//! precision loss in one direction or the other.

use crate::core::errors::OverflowError;
use std::fmt;

/// Scale factor for [`Price`]: one unit of raw `Price` is `1 / PRICE_SCALE`.
pub const PRICE_SCALE: i64 = 1_000_000;
/// Scale factor for [`Qty`]: one unit of raw `Qty` is `1 / QTY_SCALE`.
pub const QTY_SCALE: i64 = 100_000_000;

/// A price, scaled by [`PRICE_SCALE`]. No generic multiply is exposed:
/// price × qty crosses scales and callers must say which scale the
/// result lands in explicitly (see `orderbook::depth`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Price(pub i64);

impl Price {
    #[inline(always)]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline(always)]
    pub fn to_double(self) -> f64 {
        self.0 as f64 / PRICE_SCALE as f64
    }

    #[inline]
    pub fn from_double(value: f64) -> Self {
        Self((value * PRICE_SCALE as f64).round() as i64)
    }

    #[inline(always)]
    pub fn checked_add(self, rhs: Self) -> Result<Self, OverflowError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(OverflowError::PriceOverflow { old: self.0, delta: rhs.0 })
    }

    #[inline(always)]
    pub fn checked_sub(self, rhs: Self) -> Result<Self, OverflowError> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(OverflowError::PriceOverflow { old: self.0, delta: -rhs.0 })
    }

    #[inline(always)]
    pub const fn negate(self) -> Self {
        Self(-self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.to_double())
    }
}

/// A quantity, scaled by [`QTY_SCALE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Qty(pub i64);

impl Qty {
    #[inline(always)]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline(always)]
    pub fn to_double(self) -> f64 {
        self.0 as f64 / QTY_SCALE as f64
    }

    #[inline]
    pub fn from_double(value: f64) -> Self {
        Self((value * QTY_SCALE as f64).round() as i64)
    }

    #[inline(always)]
    pub fn checked_add(self, rhs: Self) -> Result<Self, OverflowError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(OverflowError::QuantityOverflow { old: self.0, delta: rhs.0 })
    }

    #[inline(always)]
    pub fn checked_sub(self, rhs: Self) -> Result<Self, OverflowError> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(OverflowError::QuantityOverflow { old: self.0, delta: -rhs.0 })
    }

    #[inline(always)]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[inline(always)]
    pub const fn negate(self) -> Self {
        Self(-self.0)
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.8}", self.to_double())
    }
}

/// A client/exchange order identifier. Unlike the random-scheme ids used
/// elsewhere in this codebase's history, these are always derived from a
/// fast-clock nanosecond timestamp: monotonic within a single strategy
/// tick, so the reconciler can hand one out per action without a shared
/// counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    #[inline(always)]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Derive a new id from a nanosecond timestamp.
    #[inline(always)]
    pub const fn from_nanos(now_ns: u64) -> Self {
        Self(now_ns)
    }

    #[inline(always)]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// The cancel-half id used by venues whose combined cancel/replace
    /// message addresses the cancelled order as `new_id - 1`. Gated
    /// behind the venue trait, never assumed globally (see
    /// [`crate::execution::venue::VenueRules`]).
    #[inline(always)]
    pub const fn predecessor(self) -> Self {
        Self(self.0.wrapping_sub(1))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maximum characters a [`TickerId`] can hold inline.
pub const TICKER_ID_CAP: usize = 20;

/// A short symbol identifier stored inline (no heap allocation, `Copy`).
/// Venue ticker symbols (`BTCUSDT`, `ETH-PERP`, …) fit comfortably within
/// [`TICKER_ID_CAP`] bytes; longer names are truncated rather than
/// spilling to the heap, since this type rides the hot path.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickerId {
    buf: [u8; TICKER_ID_CAP],
    len: u8,
}

impl TickerId {
    pub fn new(s: &str) -> Self {
        let bytes = s.as_bytes();
        let len = bytes.len().min(TICKER_ID_CAP);
        let mut buf = [0u8; TICKER_ID_CAP];
        buf[..len].copy_from_slice(&bytes[..len]);
        Self {
            buf,
            len: len as u8,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buf[..self.len as usize]).unwrap_or("")
    }
}

impl Default for TickerId {
    fn default() -> Self {
        Self {
            buf: [0u8; TICKER_ID_CAP],
            len: 0,
        }
    }
}

impl fmt::Debug for TickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TickerId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for TickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TickerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Side of a market-data level or order. `Trade` and `Invalid` are level
/// tags, not order directions — a `MarketData` entry of `type == Trade`
/// reports the taker's side; `Invalid` marks a malformed record that
/// should be dropped rather than applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    Buy,
    Sell,
    Trade,
    #[default]
    Invalid,
}

impl Side {
    /// Sign used by reserved-inventory and risk-delta accounting:
    /// `+1` for Buy, `-1` for Sell, `0` otherwise.
    #[inline]
    pub const fn sign(self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
            Side::Trade | Side::Invalid => 0,
        }
    }
}

/// Which book a fill or resting order applies to on a venue that may
/// track long and short exposure separately (`Both` is used by
/// single-position / spot venues that don't distinguish).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PositionSide {
    Long,
    Short,
    #[default]
    Both,
}

/// Order type accepted by the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrdType {
    Limit,
    Market,
    StopLoss,
    StopLimit,
}

/// Time-in-force instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
}

/// Normalized execution-report status, dispatch key for the order state
/// manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrdStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    PendingNew,
    PendingCancel,
    Expired,
}

/// Self-trade-prevention mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stp {
    None,
    ExpireTaker,
    ExpireMaker,
    ExpireBoth,
    Decrement,
}

/// Runtime display precision for formatting outbound order strings.
/// Kept separate from the compile-time `*_SCALE` constants because it
/// varies per venue/instrument while the internal fixed-point scale does
/// not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionConfig {
    pub price_decimals: u8,
    pub qty_decimals: u8,
}

impl PrecisionConfig {
    pub const fn new(price_decimals: u8, qty_decimals: u8) -> Self {
        Self {
            price_decimals,
            qty_decimals,
        }
    }

    pub fn format_price(self, price: Price) -> String {
        format!(
            "{:.*}",
            self.price_decimals as usize,
            price.to_double()
        )
    }

    pub fn format_qty(self, qty: Qty) -> String {
        format!("{:.*}", self.qty_decimals as usize, qty.to_double())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_round_trips_through_double() {
        let p = Price::from_double(50123.456789);
        assert_eq!(p.raw(), 50_123_456_789);
        assert!((p.to_double() - 50123.456789).abs() < 1e-6);
    }

    #[test]
    fn qty_round_trips_through_double() {
        let q = Qty::from_double(1.23456789);
        assert_eq!(q.raw(), 123_456_789);
    }

    #[test]
    fn price_checked_arithmetic_detects_overflow() {
        let max = Price::from_raw(i64::MAX);
        assert!(max.checked_add(Price::from_raw(1)).is_err());
        assert_eq!(
            Price::from_raw(5).checked_sub(Price::from_raw(2)),
            Ok(Price::from_raw(3))
        );
    }

    #[test]
    fn order_id_predecessor_matches_cancel_scheme() {
        let id = OrderId::from_nanos(1_000);
        assert_eq!(id.predecessor(), OrderId::new(999));
    }

    #[test]
    fn ticker_id_truncates_rather_than_allocates() {
        let t = TickerId::new("BTCUSDT");
        assert_eq!(t.as_str(), "BTCUSDT");
        let long = TickerId::new(&"X".repeat(64));
        assert_eq!(long.as_str().len(), TICKER_ID_CAP);
    }

    #[test]
    fn side_sign_matches_buy_sell_convention() {
        assert_eq!(Side::Buy.sign(), 1);
        assert_eq!(Side::Sell.sign(), -1);
        assert_eq!(Side::Invalid.sign(), 0);
    }

    #[test]
    fn precision_config_formats_to_venue_decimals() {
        let cfg = PrecisionConfig::new(2, 4);
        assert_eq!(cfg.format_price(Price::from_double(50123.456)), "50123.46");
        assert_eq!(cfg.format_qty(Qty::from_double(1.23456)), "1.2346");
    }
}

#[cfg(test)]
mod fixed_point_proptests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    proptest! {
        /// Round-trip through `Price`'s raw i64 representation loses at
        /// most half a tick.
        #[test]
        fn price_roundtrip_within_half_tick(value in -1_000_000_000.0..1_000_000_000.0_f64) {
            let back = Price::from_double(value).to_double();
            prop_assert!((value - back).abs() < 1.0 / PRICE_SCALE as f64 + 1e-9);
        }

        #[test]
        fn qty_roundtrip_within_half_step(value in -1_000_000.0..1_000_000.0_f64) {
            let back = Qty::from_double(value).to_double();
            prop_assert!((value - back).abs() < 1.0 / QTY_SCALE as f64 + 1e-9);
        }

        /// Conversion preserves ordering: it's a monotonic rounding, not
        /// a hash.
        #[test]
        fn price_conversion_preserves_ordering(a in -1_000_000.0..1_000_000.0_f64, b in -1_000_000.0..1_000_000.0_f64) {
            let (pa, pb) = (Price::from_double(a), Price::from_double(b));
            if a < b - 1.0 / PRICE_SCALE as f64 {
                prop_assert!(pa <= pb);
            }
        }

        #[test]
        fn price_conversion_preserves_sign(value in -1_000_000.0..1_000_000.0_f64) {
            let raw = Price::from_double(value).raw();
            if value > 1.0 / PRICE_SCALE as f64 {
                prop_assert!(raw > 0);
            } else if value < -1.0 / PRICE_SCALE as f64 {
                prop_assert!(raw < 0);
            }
        }
    }

    #[test]
    fn zero_converts_to_zero() {
        assert_relative_eq!(Price::from_double(0.0).to_double(), 0.0);
        assert_relative_eq!(Qty::from_double(0.0).to_double(), 0.0);
    }
}
