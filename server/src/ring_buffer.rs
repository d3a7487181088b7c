//! Fixed capacity circular buffer.
//!
//! Once full, every push overwrites the oldest slot in place, so the length can
//! never exceed the capacity and eviction is O(1).

pub struct RingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    /// Index of the oldest element once the buffer has wrapped
    head: usize,
}

impl<T: Clone> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    /// Appends `item`, returning the element it displaced if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return None;
        }

        if self.slots.len() < self.capacity {
            self.slots.push(item);
            None
        } else {
            let evicted = std::mem::replace(&mut self.slots[self.head], item);
            self.head = (self.head + 1) % self.capacity;
            Some(evicted)
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&T> {
        if self.slots.is_empty() {
            return None;
        }
        let newest = (self.head + self.slots.len() - 1) % self.slots.len();
        self.slots.get(newest)
    }

    /// Iterates from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (wrapped, front) = self.slots.split_at(self.head);
        front.iter().chain(wrapped.iter())
    }

    /// Copies the last `n` elements, oldest first. Everything is returned if
    /// `n` is at least the current length.
    pub fn suffix(&self, n: usize) -> Vec<T> {
        let skip = self.len().saturating_sub(n);
        self.iter().skip(skip).cloned().collect()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }
}
