//! Single-producer/single-consumer ring queue.
//!
//! Power-of-two capacity so index wraparound is a mask instead of a
//! modulo; head and tail live on separate cache lines so producer and
//! consumer don't false-share; `enqueue`/`dequeue` synchronize with
//! release/acquire rather than a full fence, since there is exactly one
//! writer per index.

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// SPSC ring buffer of `T`. `capacity` must be a power of two; it is
/// rounded up if not. One producer calls [`SpscQueue::enqueue`], one
/// consumer calls [`SpscQueue::dequeue`] — mixing callers across threads
/// is undefined per the single-producer/single-consumer contract, not
/// checked at runtime (the cost of checking would defeat the point).
pub struct SpscQueue<T> {
    buf: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
}

unsafe impl<T: Send> Send for SpscQueue<T> {}
unsafe impl<T: Send> Sync for SpscQueue<T> {}

impl<T> SpscQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.next_power_of_two().max(2);
        let mut buf = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            buf.push(UnsafeCell::new(MaybeUninit::uninit()));
        }
        Self {
            buf: buf.into_boxed_slice(),
            mask: capacity - 1,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Push `value`. Returns `Err(value)` if the queue is full.
    pub fn enqueue(&self, value: T) -> Result<(), T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) >= self.buf.len() {
            return Err(value);
        }
        let idx = tail & self.mask;
        unsafe {
            (*self.buf[idx].get()).write(value);
        }
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Pop the oldest value. Returns `None` if the queue is empty.
    pub fn dequeue(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let idx = head & self.mask;
        let value = unsafe { (*self.buf[idx].get()).assume_init_read() };
        self.head.store(head.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }
}

impl<T> Drop for SpscQueue<T> {
    fn drop(&mut self) {
        while self.dequeue().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        let q: SpscQueue<u32> = SpscQueue::new(5);
        assert_eq!(q.capacity(), 8);
    }

    #[test]
    fn enqueue_dequeue_preserves_order() {
        let q: SpscQueue<u32> = SpscQueue::new(4);
        q.enqueue(1).unwrap();
        q.enqueue(2).unwrap();
        assert_eq!(q.dequeue(), Some(1));
        assert_eq!(q.dequeue(), Some(2));
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn enqueue_fails_when_full() {
        let q: SpscQueue<u32> = SpscQueue::new(2);
        q.enqueue(1).unwrap();
        q.enqueue(2).unwrap();
        assert_eq!(q.enqueue(3), Err(3));
    }

    #[test]
    fn dequeue_fails_when_empty() {
        let q: SpscQueue<u32> = SpscQueue::new(2);
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn concurrent_single_producer_single_consumer_delivers_all_items() {
        let q = Arc::new(SpscQueue::<u64>::new(64));
        let producer_q = Arc::clone(&q);
        const N: u64 = 10_000;

        let producer = thread::spawn(move || {
            let mut i = 0;
            while i < N {
                if producer_q.enqueue(i).is_ok() {
                    i += 1;
                }
            }
        });

        let mut received = Vec::with_capacity(N as usize);
        while received.len() < N as usize {
            if let Some(v) = q.dequeue() {
                received.push(v);
            }
        }
        producer.join().unwrap();
        assert_eq!(received, (0..N).collect::<Vec<_>>());
    }
}
