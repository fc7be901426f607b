//! Domain-specific error types.
//!
//! Each error kind below maps to one row of the error-handling table:
//! decode, sequencer, pool, and risk errors are all local-recovery
//! signals, not panics — every thread that can hit one returns an
//! explicit `Result` rather than unwinding.

use std::fmt;

/// Errors from checked arithmetic on [`crate::core::types::Price`] and
/// [`crate::core::types::Qty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowError {
    /// `Price::checked_add`/`checked_sub` would exceed `i64` limits.
    PriceOverflow { old: i64, delta: i64 },
    /// `Qty::checked_add`/`checked_sub` would exceed `i64` limits.
    QuantityOverflow { old: i64, delta: i64 },
}

impl fmt::Display for OverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowError::PriceOverflow { old, delta } => write!(
                f,
                "price overflow: {} + {} would exceed i64 limits",
                old, delta
            ),
            OverflowError::QuantityOverflow { old, delta } => write!(
                f,
                "quantity overflow: {} + {} would exceed i64 limits",
                old, delta
            ),
        }
    }
}

impl std::error::Error for OverflowError {}

/// Decode error: malformed JSON or a truncated/oversized binary frame.
/// Policy: log and drop the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    MalformedJson { reason: String },
    TruncatedFrame { needed: usize, available: usize },
    GroupOverrun { field: &'static str },
    UnknownTemplateId { template_id: u16 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MalformedJson { reason } => write!(f, "malformed json: {}", reason),
            DecodeError::TruncatedFrame { needed, available } => write!(
                f,
                "truncated frame: needed {} bytes, had {}",
                needed, available
            ),
            DecodeError::GroupOverrun { field } => {
                write!(f, "repeating group overruns buffer at {}", field)
            }
            DecodeError::UnknownTemplateId { template_id } => {
                write!(f, "unknown template id {}", template_id)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Sequencer error: a gap, a stale snapshot, or retry exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerError {
    /// A diff failed the venue's continuity check against `update_index`.
    SequenceGap { update_index: u64, event_start: u64 },
    /// The arriving snapshot is older than the first buffered event.
    SnapshotTooOld { snapshot_end: u64, first_buffered: u64 },
    /// `MAX_RETRIES` gap-recoveries or snapshot-refetches were exhausted.
    RetriesExhausted,
}

impl fmt::Display for SequencerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencerError::SequenceGap {
                update_index,
                event_start,
            } => write!(
                f,
                "sequence gap: update_index={} event_start={}",
                update_index, event_start
            ),
            SequencerError::SnapshotTooOld {
                snapshot_end,
                first_buffered,
            } => write!(
                f,
                "snapshot end_seq={} older than first buffered seq={}",
                snapshot_end, first_buffered
            ),
            SequencerError::RetriesExhausted => write!(f, "retries exhausted, failing session"),
        }
    }
}

impl std::error::Error for SequencerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_error_display_names_fields() {
        let err = OverflowError::QuantityOverflow {
            old: i64::MAX - 100,
            delta: 200,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("overflow"));
    }

    #[test]
    fn decode_error_display_is_actionable() {
        let err = DecodeError::TruncatedFrame {
            needed: 10,
            available: 4,
        };
        assert!(format!("{}", err).contains("truncated"));
    }

    #[test]
    fn sequencer_error_display_carries_indices() {
        let err = SequencerError::SequenceGap {
            update_index: 100,
            event_start: 107,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("100"));
        assert!(msg.contains("107"));
    }
}
