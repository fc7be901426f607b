//! Order Execution
//!
//! The slot book ([`order_manager`]) tracks one resting order per
//! price layer per side; [`order_state`] dispatches execution reports
//! onto it and forwards fills to [`position_keeper`]; [`expiry`] sweeps
//! timed-out slots; [`venue`] holds the per-venue quirks (cancel-id
//! scheme, min notional, tick/lot rounding) that [`order_state`] and
//! the engine's venue-policy filter consult; [`encoder`] renders an
//! [`order_manager::OrderRequest`] into the wire frame a venue expects.

pub mod encoder;
pub mod expiry;
pub mod order_manager;
pub mod order_state;
pub mod pending_registry;
pub mod position_keeper;
pub mod venue;

pub use encoder::encode_json;
pub use expiry::{ExpiredCancel, ExpiryKey, ExpiryManager};
pub use order_manager::{
    OrderManager, OrderRequest, ReservedTracker, SideBook, Slot, SlotBook, SlotState,
};
pub use order_state::{FillEvent, OrderStateManager};
pub use pending_registry::{PendingRequest, PendingRequestRegistry};
pub use position_keeper::{PositionKeeper, SymbolPosition};
pub use venue::{CancelIdScheme, VenueRules};
