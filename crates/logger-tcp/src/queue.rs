//! Bounded FIFO queue with drop-oldest overflow

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// A FIFO queue shared between any number of producers and one consumer.
///
/// When a push finds the queue full the oldest element is evicted, so the
/// newest record always survives. The consumer peeks at the head and removes
/// it only once it is done with it.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: Option<usize>,
    dropped: AtomicU64,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` elements. A capacity of zero
    /// holds one.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        Self::new(Some(capacity.max(1)))
    }

    /// Create a queue that never drops.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Create a queue, `None` meaning unbounded.
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        let capacity = capacity.map(|c| c.max(1));
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity.unwrap_or(16).min(1024))),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Append `item`, returning the element evicted to make room, if any.
    pub fn push(&self, item: T) -> Option<T> {
        let mut items = self.items.lock();
        let evicted = match self.capacity {
            Some(capacity) if items.len() >= capacity => items.pop_front(),
            _ => None,
        };
        items.push_back(item);
        drop(items);

        if evicted.is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        evicted
    }

    /// Remove the head if `matches` accepts it.
    pub fn pop_front_if(&self, matches: impl FnOnce(&T) -> bool) -> Option<T> {
        let mut items = self.items.lock();
        if items.front().is_some_and(matches) {
            items.pop_front()
        } else {
            None
        }
    }

    /// Remove the head unconditionally.
    pub fn pop_front(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Number of queued elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Maximum length, `None` when unbounded
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Elements evicted by overflow so far
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T: Clone> BoundedQueue<T> {
    /// Clone of the head, leaving it queued.
    #[must_use]
    pub fn front(&self) -> Option<T> {
        self.items.lock().front().cloned()
    }

    /// Clone of every queued element, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.items.lock().iter().cloned().collect()
    }
}
