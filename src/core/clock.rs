//! Fast monotonic clock: TSC-derived nanosecond timestamps with periodic
//! rebase onto system time.
//!
//! Rebase-under-mutex, interpolate-lock-free split: hot-path reads take
//! a cached `(last_cycle, last_epoch, inv_f)` triple and interpolate,
//! never touching the mutex; a background rebase swaps that triple
//! every `recal_cycles` wall-clock ticks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over "what time is it", so tests can substitute a
/// deterministic source instead of the TSC.
pub trait Clock: Send + Sync {
    fn now_ns(&self) -> u64;
}

fn system_now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn read_tsc() -> u64 {
    unsafe { core::arch::x86_64::_rdtsc() }
}

#[cfg(not(target_arch = "x86_64"))]
#[inline(always)]
fn read_tsc() -> u64 {
    // Non-x86 hosts have no rdtsc; fall back to the rebase anchor alone,
    // which still produces monotonic nanosecond timestamps, just without
    // sub-rebase-interval interpolation precision.
    0
}

struct Anchor {
    /// TSC cycle count at the last rebase.
    last_cycle: u64,
    /// Wall-clock nanoseconds at the last rebase.
    last_epoch_ns: u64,
    /// Nanoseconds per TSC cycle, estimated at the last rebase.
    inv_f: f64,
}

/// TSC-backed [`Clock`]. Rebases onto [`SystemTime`] every `recal_cycles`
/// hot-path reads (approximated via a read counter rather than wall time,
/// to keep the hot path free of any `SystemTime` call).
pub struct FastClock {
    anchor: Mutex<Anchor>,
    // Cached copies of the anchor fields for lock-free reads. Updated
    // under `anchor`'s lock immediately after a rebase.
    cached_last_cycle: AtomicU64,
    cached_last_epoch_ns: AtomicU64,
    cached_inv_f_bits: AtomicU64,
    reads_since_rebase: AtomicU64,
    recal_reads: u64,
}

impl FastClock {
    /// `recal_reads` mirrors the source's `recal_cycles` knob (there
    /// measured in TSC cycles; here in hot-path read count, since this
    /// core has no portable cycle-accurate deadline primitive).
    pub fn new(recal_reads: u64) -> Self {
        let now = system_now_ns();
        let cycle = read_tsc();
        let clock = Self {
            anchor: Mutex::new(Anchor {
                last_cycle: cycle,
                last_epoch_ns: now,
                inv_f: 1.0,
            }),
            cached_last_cycle: AtomicU64::new(cycle),
            cached_last_epoch_ns: AtomicU64::new(now),
            cached_inv_f_bits: AtomicU64::new(1.0f64.to_bits()),
            reads_since_rebase: AtomicU64::new(0),
            recal_reads: recal_reads.max(1),
        };
        clock.rebase();
        clock
    }

    /// Force a rebase now: re-anchors the TSC-to-wall-clock mapping.
    pub fn rebase(&self) {
        let mut anchor = self.anchor.lock().unwrap();
        let now = system_now_ns();
        let cycle = read_tsc();
        let elapsed_ns = now.saturating_sub(anchor.last_epoch_ns);
        let elapsed_cycles = cycle.saturating_sub(anchor.last_cycle);
        if elapsed_cycles > 0 && elapsed_ns > 0 {
            anchor.inv_f = elapsed_ns as f64 / elapsed_cycles as f64;
        }
        anchor.last_cycle = cycle;
        anchor.last_epoch_ns = now;
        self.cached_last_cycle.store(cycle, Ordering::Release);
        self.cached_last_epoch_ns.store(now, Ordering::Release);
        self.cached_inv_f_bits
            .store(anchor.inv_f.to_bits(), Ordering::Release);
        self.reads_since_rebase.store(0, Ordering::Relaxed);
    }
}

impl Clock for FastClock {
    #[inline]
    fn now_ns(&self) -> u64 {
        let last_cycle = self.cached_last_cycle.load(Ordering::Acquire);
        let last_epoch_ns = self.cached_last_epoch_ns.load(Ordering::Acquire);
        let inv_f = f64::from_bits(self.cached_inv_f_bits.load(Ordering::Acquire));

        let cycle = read_tsc();
        let elapsed_cycles = cycle.saturating_sub(last_cycle);
        let estimate = last_epoch_ns + (elapsed_cycles as f64 * inv_f) as u64;

        if self.reads_since_rebase.fetch_add(1, Ordering::Relaxed) >= self.recal_reads {
            self.rebase();
        }
        estimate.max(last_epoch_ns)
    }
}

/// A deterministic clock for tests: starts at a fixed value, advances
/// only when told to.
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ns: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ns),
        }
    }

    pub fn advance(&self, delta_ns: u64) {
        self.now.fetch_add(delta_ns, Ordering::SeqCst);
    }

    pub fn set(&self, ns: u64) {
        self.now.store(ns, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_on_demand() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_ns(), 1_000);
        clock.advance(500);
        assert_eq!(clock.now_ns(), 1_500);
        clock.set(9_999);
        assert_eq!(clock.now_ns(), 9_999);
    }

    #[test]
    fn fast_clock_now_is_monotone_non_decreasing() {
        let clock = FastClock::new(1_000_000);
        let a = clock.now_ns();
        let b = clock.now_ns();
        assert!(b >= a);
    }

    #[test]
    fn fast_clock_rebase_does_not_move_time_backwards() {
        let clock = FastClock::new(4);
        let mut last = clock.now_ns();
        for _ in 0..16 {
            let now = clock.now_ns();
            assert!(now >= last);
            last = now;
        }
    }
}
