//! Reusable encoding buffers
//!
//! Owned by one writer and shared with its workers through an `Arc`. Only a
//! throughput optimization: any buffer handed out is cleared, so output never
//! depends on which buffer a row happened to get.

use parking_lot::Mutex;

/// Buffers larger than this are dropped on release instead of being kept.
const MAX_RETAINED_CAPACITY: usize = 4 * 1024 * 1024;

/// Pool of scratch `Vec<u8>` buffers, safe to use from many threads at once.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    retain: usize,
    buffer_capacity: usize,
}

impl BufferPool {
    /// Create a pool that keeps at most `retain` idle buffers, each freshly
    /// allocated one starting with `buffer_capacity` bytes.
    pub fn new(retain: usize, buffer_capacity: usize) -> Self {
        BufferPool {
            free: Mutex::new(Vec::with_capacity(retain)),
            retain,
            buffer_capacity,
        }
    }

    /// Take an empty buffer, reusing an idle one when available.
    pub fn acquire(&self) -> Vec<u8> {
        match self.free.lock().pop() {
            Some(buffer) => buffer,
            None => Vec::with_capacity(self.buffer_capacity),
        }
    }

    /// Hand a buffer back. Its contents are discarded.
    pub fn release(&self, mut buffer: Vec<u8>) {
        if buffer.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buffer.clear();
        let mut free = self.free.lock();
        if free.len() < self.retain {
            free.push(buffer);
        }
    }

    /// Number of idle buffers currently held.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}
