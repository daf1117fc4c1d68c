use crate::types::{KeyAddr, Millis};
use std::collections::VecDeque;

/// Hard bound on keys awaiting resolution.
pub const QUEUE_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub addr: KeyAddr,
    pub deadline: Millis,
}

/// Bounded FIFO of keys awaiting resolution, oldest first.
///
/// The queue never grows past [`QUEUE_CAPACITY`]; callers must make room
/// (by resolving the head) before pushing onto a full queue.
#[derive(Debug, Clone)]
pub struct KeyQueue {
    entries: VecDeque<QueueEntry>,
}

impl Default for KeyQueue {
    fn default() -> Self {
        Self {
            entries: VecDeque::with_capacity(QUEUE_CAPACITY),
        }
    }
}

impl KeyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Returns the entry back if the queue is full.
    pub fn push(&mut self, addr: KeyAddr, deadline: Millis) -> Result<(), QueueEntry> {
        let entry = QueueEntry { addr, deadline };
        if self.is_full() {
            return Err(entry);
        }
        self.entries.push_back(entry);
        Ok(())
    }

    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    pub fn pop_head(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    pub fn position(&self, addr: KeyAddr) -> Option<usize> {
        self.entries.iter().position(|e| e.addr == addr)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= QUEUE_CAPACITY
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }
}
