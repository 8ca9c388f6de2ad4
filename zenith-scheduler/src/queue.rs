//! A bounded, thread-safe FIFO queue: `push` blocks until there is room,
//! `pop` blocks until an element is available, `try_peek` never blocks.
//!
//! A single lock guards the backing deque, with one condition variable
//! signaling "not full" and another signaling "not empty", so waiters
//! block instead of busy-spinning.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// A fixed-capacity thread-safe queue.
pub struct BoundedQueue<T> {
    capacity: usize,
    state: Mutex<VecDeque<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue of the given capacity. Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "BoundedQueue capacity must be greater than 0");
        Self {
            capacity,
            state: Mutex::new(VecDeque::with_capacity(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Number of elements currently queued.
    pub fn element_count(&self) -> usize {
        self.state.lock().len()
    }

    /// The queue's fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Blocks until there is room, then appends `value`.
    pub fn push(&self, value: T) {
        let mut guard = self.state.lock();
        while guard.len() == self.capacity {
            self.not_full.wait(&mut guard);
        }
        guard.push_back(value);
        self.not_empty.notify_one();
    }

    /// Blocks until an element is available, then removes and returns it.
    pub fn pop(&self) -> T {
        let mut guard = self.state.lock();
        loop {
            if let Some(value) = guard.pop_front() {
                self.not_full.notify_one();
                return value;
            }
            self.not_empty.wait(&mut guard);
        }
    }

    /// Returns a clone of the head element without removing it, or `None`
    /// if the queue is empty. Never blocks.
    pub fn try_peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.state.lock().front().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        BoundedQueue::<i32>::new(0);
    }

    #[test]
    fn push_pop_roundtrip() {
        let q = BoundedQueue::new(2);
        q.push(1);
        q.push(2);
        assert_eq!(q.element_count(), 2);
        assert_eq!(q.pop(), 1);
        assert_eq!(q.pop(), 2);
    }

    #[test]
    fn try_peek_does_not_remove() {
        let q = BoundedQueue::new(2);
        q.push(7);
        assert_eq!(q.try_peek(), Some(7));
        assert_eq!(q.element_count(), 1);
    }

    #[test]
    fn push_blocks_until_space() {
        let q = Arc::new(BoundedQueue::new(1));
        q.push(1);
        let q2 = Arc::clone(&q);
        let handle = thread::spawn(move || {
            q2.push(2);
        });
        thread::sleep(Duration::from_millis(20));
        assert_eq!(q.pop(), 1);
        handle.join().unwrap();
        assert_eq!(q.pop(), 2);
    }
}
