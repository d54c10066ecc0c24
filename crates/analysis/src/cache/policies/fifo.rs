//! First-In, First-Out (FIFO) eviction state.
//!
//! Each set keeps a queue of block indices in installation order. Installs
//! enqueue at the head; the victim is popped from the tail (the oldest
//! install). Hits do not reorder the queue. A set-wide invalidation does
//! not clear the queue; the re-installed blocks are simply enqueued again.

use std::collections::VecDeque;

/// FIFO bookkeeping for one set.
#[derive(Debug, Default)]
pub struct FifoState {
    queue: VecDeque<usize>,
}

impl FifoState {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the installation of block `blk`.
    pub fn push(&mut self, blk: usize) {
        self.queue.push_front(blk);
    }

    /// Removes and returns the oldest installed block. An empty queue
    /// yields block 0.
    pub fn pop_oldest(&mut self) -> usize {
        self.queue.pop_back().unwrap_or(0)
    }
}
