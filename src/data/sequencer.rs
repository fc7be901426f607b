//! Market-data sequencer: snapshot/diff recovery state machine.
//!
//! One instance per symbol. The continuity rule used to validate the
//! first diff after a snapshot differs between spot and perpetual
//! venues, so these are kept as two distinct methods on
//! [`ContinuityRule`] rather than unified behind one parameterised
//! check.

use crate::core::errors::SequencerError;
use crate::data::types::MarketUpdateData;
use std::collections::VecDeque;

pub const MAX_BUFFERED_EVENTS: usize = 1000;
pub const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    AwaitingSnapshot,
    Buffering,
    ApplyingSnapshot,
    Running,
}

/// Which venue's first-after-snapshot rule applies. Spot and perpetual
/// differ in how the first post-snapshot diff is validated; every other
/// diff uses the same "previous end matches current index" shape for
/// perpetual or "start follows index" shape for spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuityRule {
    Spot,
    Perpetual,
}

impl ContinuityRule {
    fn first_after_snapshot_ok(self, update_index: u64, start_seq: u64, end_seq: u64, prev_end_seq: u64) -> bool {
        match self {
            ContinuityRule::Spot => start_seq <= update_index + 1 && update_index + 1 <= end_seq,
            ContinuityRule::Perpetual => prev_end_seq <= update_index && end_seq >= update_index,
        }
    }

    fn subsequent_ok(self, update_index: u64, start_seq: u64, prev_end_seq: u64) -> bool {
        match self {
            ContinuityRule::Spot => start_seq == update_index + 1,
            ContinuityRule::Perpetual => prev_end_seq == update_index,
        }
    }
}

/// Outcome of feeding one message to the sequencer.
pub enum SequencerOutput {
    /// Nothing to forward yet (buffered, or awaiting snapshot).
    Pending,
    /// Forward these events downstream, in order.
    Forward(Vec<MarketUpdateData>),
    /// A gap or stale snapshot was detected; caller should request a
    /// fresh snapshot (the sequencer has already reset its own state).
    RequestSnapshot,
    /// Retries exhausted; caller must fail the session.
    Fatal(SequencerError),
}

pub struct MarketDataSequencer {
    state: SequencerState,
    rule: ContinuityRule,
    update_index: u64,
    buffer: VecDeque<MarketUpdateData>,
    first_buffered_seq: Option<u64>,
    retries: u32,
}

impl MarketDataSequencer {
    pub fn new(rule: ContinuityRule) -> Self {
        Self {
            state: SequencerState::AwaitingSnapshot,
            rule,
            update_index: 0,
            buffer: VecDeque::new(),
            first_buffered_seq: None,
            retries: 0,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn update_index(&self) -> u64 {
        self.update_index
    }

    /// Step 1: login/subscription-start.
    pub fn start(&mut self) {
        self.state = SequencerState::Buffering;
        self.buffer.clear();
        self.first_buffered_seq = None;
    }

    fn enter_gap_recovery(&mut self) -> SequencerOutput {
        self.retries += 1;
        if self.retries > MAX_RETRIES {
            self.state = SequencerState::AwaitingSnapshot;
            return SequencerOutput::Fatal(SequencerError::RetriesExhausted);
        }
        self.state = SequencerState::Buffering;
        self.buffer.clear();
        self.first_buffered_seq = None;
        SequencerOutput::RequestSnapshot
    }

    /// Feed one depth diff or snapshot message.
    pub fn on_depth_message(&mut self, msg: MarketUpdateData) -> SequencerOutput {
        debug_assert!(msg.is_sequenced());
        match self.state {
            SequencerState::AwaitingSnapshot => SequencerOutput::Pending,
            SequencerState::Buffering => {
                if msg.kind == crate::data::types::MdKind::Snapshot {
                    self.apply_snapshot(msg)
                } else {
                    self.buffer_diff(msg);
                    SequencerOutput::Pending
                }
            }
            SequencerState::ApplyingSnapshot => SequencerOutput::Pending,
            SequencerState::Running => self.on_running_diff(msg),
        }
    }

    /// Step 2: buffer a diff while awaiting the snapshot, dropping the
    /// oldest on overflow.
    fn buffer_diff(&mut self, msg: MarketUpdateData) {
        if self.first_buffered_seq.is_none() {
            self.first_buffered_seq = Some(msg.start_seq);
        }
        self.buffer.push_back(msg);
        if self.buffer.len() > MAX_BUFFERED_EVENTS {
            self.buffer.pop_front();
            if let Some(next) = self.buffer.front() {
                self.first_buffered_seq = Some(next.start_seq);
            }
        }
    }

    /// Step 3 + 4: snapshot arrival and buffer drain.
    fn apply_snapshot(&mut self, snapshot: MarketUpdateData) -> SequencerOutput {
        if let Some(first_buffered) = self.first_buffered_seq {
            if snapshot.end_seq < first_buffered {
                self.retries += 1;
                if self.retries > MAX_RETRIES {
                    return SequencerOutput::Fatal(SequencerError::RetriesExhausted);
                }
                return SequencerOutput::RequestSnapshot;
            }
        }

        self.state = SequencerState::ApplyingSnapshot;
        self.update_index = snapshot.end_seq;
        self.retries = 0;
        let mut forwarded = vec![snapshot];

        let mut first = true;
        while let Some(event) = self.buffer.pop_front() {
            let ok = if first {
                self.rule.first_after_snapshot_ok(
                    self.update_index,
                    event.start_seq,
                    event.end_seq,
                    event.prev_end_seq,
                )
            } else {
                self.rule
                    .subsequent_ok(self.update_index, event.start_seq, event.prev_end_seq)
            };
            first = false;

            if !ok {
                self.buffer.clear();
                return self.enter_gap_recovery();
            }
            self.update_index = event.end_seq;
            forwarded.push(event);
        }

        self.state = SequencerState::Running;
        self.first_buffered_seq = None;
        SequencerOutput::Forward(forwarded)
    }

    /// Step 5: steady-state continuity check.
    fn on_running_diff(&mut self, msg: MarketUpdateData) -> SequencerOutput {
        let ok = self
            .rule
            .subsequent_ok(self.update_index, msg.start_seq, msg.prev_end_seq);
        if !ok {
            return self.enter_gap_recovery();
        }
        self.update_index = msg.end_seq;
        SequencerOutput::Forward(vec![msg])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::MarketUpdateData;

    fn diff(prev_end: u64, start: u64, end: u64) -> MarketUpdateData {
        MarketUpdateData::depth_diff(start, end, prev_end, vec![])
    }

    fn snap(end: u64) -> MarketUpdateData {
        MarketUpdateData::snapshot(end, vec![])
    }

    #[test]
    fn snapshot_then_clean_diff_perpetual() {
        let mut seq = MarketDataSequencer::new(ContinuityRule::Perpetual);
        seq.start();
        let out = seq.on_depth_message(snap(100));
        assert!(matches!(out, SequencerOutput::Forward(_)));
        assert_eq!(seq.state(), SequencerState::Running);
        assert_eq!(seq.update_index(), 100);

        let out = seq.on_depth_message(diff(100, 101, 105));
        match out {
            SequencerOutput::Forward(events) => assert_eq!(events.len(), 1),
            _ => panic!("expected forward"),
        }
        assert_eq!(seq.update_index(), 105);
    }

    #[test]
    fn gap_triggers_recovery() {
        let mut seq = MarketDataSequencer::new(ContinuityRule::Perpetual);
        seq.start();
        seq.on_depth_message(snap(100));
        seq.on_depth_message(diff(100, 101, 105));
        assert_eq!(seq.state(), SequencerState::Running);

        let out = seq.on_depth_message(diff(107, 108, 110));
        assert!(matches!(out, SequencerOutput::RequestSnapshot));
        assert_eq!(seq.state(), SequencerState::Buffering);
    }

    #[test]
    fn buffering_drops_oldest_on_overflow() {
        let mut seq = MarketDataSequencer::new(ContinuityRule::Perpetual);
        seq.start();
        for i in 0..(MAX_BUFFERED_EVENTS + 10) as u64 {
            seq.on_depth_message(diff(i, i + 1, i + 2));
        }
        assert_eq!(seq.buffer.len(), MAX_BUFFERED_EVENTS);
    }

    #[test]
    fn retries_exhausted_returns_fatal() {
        let mut seq = MarketDataSequencer::new(ContinuityRule::Perpetual);
        seq.start();
        seq.on_depth_message(snap(100));
        seq.on_depth_message(diff(100, 101, 105));
        for _ in 0..MAX_RETRIES {
            let out = seq.on_depth_message(diff(999, 1000, 1001));
            if matches!(out, SequencerOutput::RequestSnapshot) {
                seq.on_depth_message(snap(1000));
                seq.on_depth_message(diff(999, 1000, 1001));
            }
        }
    }

    #[test]
    fn spot_rule_uses_start_seq_continuity() {
        let mut seq = MarketDataSequencer::new(ContinuityRule::Spot);
        seq.start();
        seq.on_depth_message(snap(100));
        let out = seq.on_depth_message(diff(0, 101, 105));
        assert!(matches!(out, SequencerOutput::Forward(_)));
        assert_eq!(seq.update_index(), 105);
    }
}
