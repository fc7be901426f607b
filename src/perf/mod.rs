//! Performance-oriented primitives for the hot path.
//!
//! [`spsc`] is the single-producer/single-consumer queue that hands work
//! between the MD/OE transport threads and the trade engine; its fixed
//! backing array is already the bounded slab this crate needs, so there
//! is no separate object-pool layer in front of it.

pub mod spsc;

pub use spsc::SpscQueue;
