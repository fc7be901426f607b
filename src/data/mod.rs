//! Market-data ingestion: decoders, the per-symbol sequencer, and the
//! payload types they produce.

pub mod decoder;
pub mod sequencer;
pub mod types;

pub use decoder::{BinaryDecoderPolicy, DecodedMessage, JsonDecoderPolicy};
pub use sequencer::{ContinuityRule, MarketDataSequencer, SequencerOutput, SequencerState};
pub use types::{ExecutionReport, MarketData, MarketUpdateData, MdKind, MdType, NO_SEQ};
