//! Core scalar types for the trading pipeline: fixed-point price/qty,
//! order identifiers, the fast clock, and the domain error types every
//! other module returns through `Result`.

pub mod clock;
pub mod errors;
pub mod types;

pub use clock::{Clock, FastClock, ManualClock};
pub use errors::{DecodeError, OverflowError, SequencerError};
pub use types::{
    OrdStatus, OrdType, OrderId, Price, PrecisionConfig, PositionSide, Qty, Side, Stp, TickerId,
    TimeInForce, PRICE_SCALE, QTY_SCALE, TICKER_ID_CAP,
};
