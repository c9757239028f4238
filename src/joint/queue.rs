//! Fixed-capacity FIFO backing the sliding window

use crate::error::QueueError;

/// Array-backed circular buffer with an explicit closed state
///
/// Once [`close`](Self::close)d every put and get fails with
/// [`QueueError::Closed`] until the queue is [`reset`](Self::reset).
#[derive(Clone, Debug)]
pub struct RingQueue<T> {
    slots: Vec<Option<T>>,
    /// Index of the oldest item
    head: usize,
    len: usize,
    closed: bool,
}

impl<T> RingQueue<T> {
    /// Create an empty queue holding at most `capacity` items
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
            closed: false,
        }
    }

    /// Maximum number of items held
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of items held
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no items are held
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when a push would fail with `Full`
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// True after [`close`](Self::close) until the next reset
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Append an item at the tail
    pub fn push(&mut self, item: T) -> Result<(), QueueError> {
        if self.closed {
            return Err(QueueError::Closed);
        }
        if self.is_full() {
            return Err(QueueError::Full {
                capacity: self.capacity(),
            });
        }
        let tail = (self.head + self.len) % self.slots.len();
        self.slots[tail] = Some(item);
        self.len += 1;
        Ok(())
    }

    /// Remove and return the oldest item
    pub fn pop(&mut self) -> Result<T, QueueError> {
        if self.closed {
            return Err(QueueError::Closed);
        }
        let item = self.slots.get_mut(self.head).and_then(Option::take);
        match item {
            Some(item) if self.len > 0 => {
                self.head = (self.head + 1) % self.slots.len();
                self.len -= 1;
                Ok(item)
            }
            _ => Err(QueueError::Empty),
        }
    }

    /// Oldest item without removing it
    pub fn front(&self) -> Option<&T> {
        if self.closed || self.len == 0 {
            return None;
        }
        self.slots[self.head].as_ref()
    }

    /// Invalidate the queue; later puts and gets fail
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Drop every item and reopen the queue with the same capacity
    pub fn reset(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
        self.closed = false;
    }

    /// Items from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % self.slots.len()].as_ref())
    }
}
