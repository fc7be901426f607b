//! Bucketed, bitmap-indexed price ladder.
//!
//! Each side is a contiguous index space of `NUM_LEVELS` price slots,
//! grouped into fixed-size buckets of [`BUCKET_SIZE`] slots. A bucket
//! carries its own 64-bit-word bitmap of active offsets; a per-side
//! summary bitmap marks which buckets are non-empty, so `best_bid_idx`/
//! `best_ask_idx` can skip straight to the first word with a set bit
//! instead of scanning every level.

use crate::core::types::{Price, Qty, Side};
use crate::data::types::{MarketData, MdType};

pub const BUCKET_SIZE: usize = 4096;
const WORDS_PER_BUCKET: usize = BUCKET_SIZE / 64;

struct Bucket {
    qty: Box<[i64; BUCKET_SIZE]>,
    bitmap: [u64; WORDS_PER_BUCKET],
    active_count: u32,
}

impl Bucket {
    fn new() -> Box<Self> {
        Box::new(Self {
            qty: Box::new([0i64; BUCKET_SIZE]),
            bitmap: [0u64; WORDS_PER_BUCKET],
            active_count: 0,
        })
    }

    #[inline]
    fn set(&mut self, offset: usize, qty: i64) {
        let was_active = self.is_active(offset);
        self.qty[offset] = qty;
        let word = offset / 64;
        let bit = offset % 64;
        self.bitmap[word] |= 1u64 << bit;
        if !was_active {
            self.active_count += 1;
        }
    }

    #[inline]
    fn clear(&mut self, offset: usize) {
        if self.is_active(offset) {
            self.active_count -= 1;
        }
        self.qty[offset] = 0;
        let word = offset / 64;
        let bit = offset % 64;
        self.bitmap[word] &= !(1u64 << bit);
    }

    #[inline]
    fn is_active(&self, offset: usize) -> bool {
        let word = offset / 64;
        let bit = offset % 64;
        (self.bitmap[word] >> bit) & 1 == 1
    }

    fn is_empty(&self) -> bool {
        self.active_count == 0
    }
}

/// Cached best bid/offer, kept in sync with every book mutation (I2).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bbo {
    pub bid_price: Price,
    pub ask_price: Price,
    pub bid_qty: Qty,
    pub ask_qty: Qty,
}

struct SideLadder {
    buckets: Vec<Option<Box<Bucket>>>,
    summary: Vec<u64>,
}

impl SideLadder {
    fn new(bucket_count: usize) -> Self {
        let summary_words = bucket_count.div_ceil(64);
        Self {
            buckets: (0..bucket_count).map(|_| None).collect(),
            summary: vec![0u64; summary_words],
        }
    }

    fn set_summary_bit(&mut self, bucket_idx: usize) {
        self.summary[bucket_idx / 64] |= 1u64 << (bucket_idx % 64);
    }

    fn clear_summary_bit(&mut self, bucket_idx: usize) {
        self.summary[bucket_idx / 64] &= !(1u64 << (bucket_idx % 64));
    }

    fn write(&mut self, index: usize, qty: i64) {
        let bucket_idx = index / BUCKET_SIZE;
        let offset = index % BUCKET_SIZE;
        if self.buckets[bucket_idx].is_none() {
            self.buckets[bucket_idx] = Some(Bucket::new());
        }
        let bucket = self.buckets[bucket_idx].as_mut().unwrap();
        bucket.set(offset, qty);
        self.set_summary_bit(bucket_idx);
    }

    fn cancel(&mut self, index: usize) {
        let bucket_idx = index / BUCKET_SIZE;
        let offset = index % BUCKET_SIZE;
        let Some(bucket) = self.buckets[bucket_idx].as_mut() else {
            return;
        };
        bucket.clear(offset);
        if bucket.is_empty() {
            self.buckets[bucket_idx] = None;
            self.clear_summary_bit(bucket_idx);
        }
    }

    fn qty_at(&self, index: usize) -> i64 {
        let bucket_idx = index / BUCKET_SIZE;
        let offset = index % BUCKET_SIZE;
        self.buckets[bucket_idx]
            .as_ref()
            .map(|b| if b.is_active(offset) { b.qty[offset] } else { 0 })
            .unwrap_or(0)
    }

    fn is_active(&self, index: usize) -> bool {
        let bucket_idx = index / BUCKET_SIZE;
        let offset = index % BUCKET_SIZE;
        self.buckets[bucket_idx]
            .as_ref()
            .map(|b| b.is_active(offset))
            .unwrap_or(false)
    }

    fn clear_all(&mut self) {
        for b in self.buckets.iter_mut() {
            *b = None;
        }
        for w in self.summary.iter_mut() {
            *w = 0;
        }
    }

    /// Lowest active index ≥ the ladder's start (ask side "best").
    fn lowest_active(&self) -> Option<usize> {
        for (word_idx, word) in self.summary.iter().enumerate() {
            if *word == 0 {
                continue;
            }
            let bucket_idx = word_idx * 64 + word.trailing_zeros() as usize;
            if let Some(idx) = self.lowest_active_in_bucket(bucket_idx) {
                return Some(idx);
            }
        }
        None
    }

    /// Highest active index (bid side "best").
    fn highest_active(&self) -> Option<usize> {
        for (word_idx, word) in self.summary.iter().enumerate().rev() {
            if *word == 0 {
                continue;
            }
            let bucket_idx = word_idx * 64 + (63 - word.leading_zeros() as usize);
            if let Some(idx) = self.highest_active_in_bucket(bucket_idx) {
                return Some(idx);
            }
        }
        None
    }

    fn lowest_active_in_bucket(&self, bucket_idx: usize) -> Option<usize> {
        let bucket = self.buckets[bucket_idx].as_ref()?;
        for (w, word) in bucket.bitmap.iter().enumerate() {
            if *word != 0 {
                let bit = word.trailing_zeros() as usize;
                return Some(bucket_idx * BUCKET_SIZE + w * 64 + bit);
            }
        }
        None
    }

    fn highest_active_in_bucket(&self, bucket_idx: usize) -> Option<usize> {
        let bucket = self.buckets[bucket_idx].as_ref()?;
        for (w, word) in bucket.bitmap.iter().enumerate().rev() {
            if *word != 0 {
                let bit = 63 - word.leading_zeros() as usize;
                return Some(bucket_idx * BUCKET_SIZE + w * 64 + bit);
            }
        }
        None
    }
}

/// Per-(ticker, side-pair) price ladder.
pub struct OrderBook {
    min_price_int: i64,
    max_price_int: i64,
    bids: SideLadder,
    asks: SideLadder,
    bbo: Bbo,
}

impl OrderBook {
    pub fn new(min_price_int: i64, max_price_int: i64) -> Self {
        let num_levels = (max_price_int - min_price_int + 1).max(1) as usize;
        let bucket_count = num_levels.div_ceil(BUCKET_SIZE);
        Self {
            min_price_int,
            max_price_int,
            bids: SideLadder::new(bucket_count),
            asks: SideLadder::new(bucket_count),
            bbo: Bbo::default(),
        }
    }

    pub fn bbo(&self) -> Bbo {
        self.bbo
    }

    fn price_to_index(&self, price: Price) -> Option<usize> {
        let ticks = price.raw();
        if ticks < self.min_price_int || ticks > self.max_price_int {
            return None;
        }
        Some((ticks - self.min_price_int) as usize)
    }

    fn index_to_price(&self, index: usize) -> Price {
        Price::from_raw(self.min_price_int + index as i64)
    }

    fn ladder_mut(&mut self, side: Side) -> &mut SideLadder {
        match side {
            Side::Buy => &mut self.bids,
            _ => &mut self.asks,
        }
    }

    fn ladder(&self, side: Side) -> &SideLadder {
        match side {
            Side::Buy => &self.bids,
            _ => &self.asks,
        }
    }

    /// Apply one event and keep the BBO current.
    pub fn on_update(&mut self, event: &MarketData) {
        match event.kind {
            MdType::Clear => self.clear(),
            MdType::Add | MdType::Modify => self.add_or_modify(event),
            MdType::Cancel => self.cancel(event),
            MdType::Trade => self.apply_trade(event),
            MdType::BookTicker => self.apply_book_ticker(event),
        }
    }

    fn clear(&mut self) {
        self.bids.clear_all();
        self.asks.clear_all();
        self.bbo = Bbo::default();
    }

    fn add_or_modify(&mut self, event: &MarketData) {
        let Some(index) = self.price_to_index(event.price) else {
            tracing::error!(price = event.price.raw(), "orderbook: price out of range, dropping");
            return;
        };
        if event.qty.raw() <= 0 {
            self.cancel_at(event.side, index);
            return;
        }
        self.ladder_mut(event.side).write(index, event.qty.raw());
        self.refresh_best(event.side);
    }

    fn cancel(&mut self, event: &MarketData) {
        let Some(index) = self.price_to_index(event.price) else {
            return;
        };
        self.cancel_at(event.side, index);
    }

    fn cancel_at(&mut self, side: Side, index: usize) {
        self.ladder_mut(side).cancel(index);
        self.refresh_best(side);
    }

    fn apply_trade(&mut self, event: &MarketData) {
        let Some(index) = self.price_to_index(event.price) else {
            return;
        };
        let ladder = self.ladder_mut(event.side);
        let remaining = ladder.qty_at(index) - event.qty.raw();
        if remaining <= 0 {
            self.cancel_at(event.side, index);
        } else {
            self.ladder_mut(event.side).write(index, remaining);
            self.refresh_best(event.side);
        }
    }

    fn apply_book_ticker(&mut self, event: &MarketData) {
        match event.side {
            Side::Buy => {
                self.bbo.bid_price = event.price;
                self.bbo.bid_qty = event.qty;
            }
            Side::Sell => {
                self.bbo.ask_price = event.price;
                self.bbo.ask_qty = event.qty;
            }
            _ => {}
        }
    }

    fn refresh_best(&mut self, side: Side) {
        match side {
            Side::Buy => {
                if let Some(idx) = self.bids.highest_active() {
                    self.bbo.bid_price = self.index_to_price(idx);
                    self.bbo.bid_qty = Qty::from_raw(self.bids.qty_at(idx));
                } else {
                    self.bbo.bid_price = Price::default();
                    self.bbo.bid_qty = Qty::default();
                }
            }
            _ => {
                if let Some(idx) = self.asks.lowest_active() {
                    self.bbo.ask_price = self.index_to_price(idx);
                    self.bbo.ask_qty = Qty::from_raw(self.asks.qty_at(idx));
                } else {
                    self.bbo.ask_price = Price::default();
                    self.bbo.ask_qty = Qty::default();
                }
            }
        }
    }

    pub fn best_bid_idx(&self) -> Option<usize> {
        self.bids.highest_active()
    }

    pub fn best_ask_idx(&self) -> Option<usize> {
        self.asks.lowest_active()
    }

    /// Next active index starting from `from`, walking away from best
    /// (downward for bids, upward for asks).
    pub fn next_active_idx(&self, side: Side, from: usize) -> Option<usize> {
        let ladder = self.ladder(side);
        match side {
            Side::Buy => (0..from).rev().find(|&i| ladder.is_active(i)),
            _ => {
                let num_levels = (self.max_price_int - self.min_price_int + 1) as usize;
                (from + 1..num_levels).find(|&i| ladder.is_active(i))
            }
        }
    }

    /// Fill `out` with up to N `(index, qty_raw, price_raw)` tuples
    /// walking outward from best.
    pub fn peek_levels_with_qty(&self, side: Side, n: usize, out: &mut Vec<(usize, i64, i64)>) {
        out.clear();
        let ladder = self.ladder(side);
        let mut cur = match side {
            Side::Buy => ladder.highest_active(),
            _ => ladder.lowest_active(),
        };
        while let Some(idx) = cur {
            if out.len() >= n {
                break;
            }
            out.push((idx, ladder.qty_at(idx), self.index_to_price(idx).raw()));
            cur = self.next_active_idx(side, idx);
        }
    }

    /// Zero-allocation quantity-only variant used by OBI calculations.
    pub fn peek_qty(&self, side: Side, n: usize, qty_out: &mut [i64], idx_out: &mut [usize]) -> usize {
        let ladder = self.ladder(side);
        let mut cur = match side {
            Side::Buy => ladder.highest_active(),
            _ => ladder.lowest_active(),
        };
        let mut count = 0;
        while let Some(idx) = cur {
            if count >= n || count >= qty_out.len() || count >= idx_out.len() {
                break;
            }
            qty_out[count] = ladder.qty_at(idx);
            idx_out[count] = idx;
            count += 1;
            cur = self.next_active_idx(side, idx);
        }
        count
    }
}
