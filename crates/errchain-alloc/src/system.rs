use tracing::trace;

use crate::error::Result;
use crate::traits::{Allocator, Block};

/// Allocator backed by the process heap.
///
/// Allocation failures are reported as [`AllocError::OutOfMemory`]
/// instead of aborting the process.
///
/// [`AllocError::OutOfMemory`]: crate::AllocError::OutOfMemory
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl SystemAllocator {
    /// Create a heap allocator handle.
    pub const fn new() -> Self {
        Self
    }
}

impl Allocator for SystemAllocator {
    fn allocate(&self, size: usize) -> Result<Block> {
        let block = Block::try_new(size);
        if let Err(err) = &block {
            trace!(size, error = %err, "heap allocation failed");
        }
        block
    }

    fn release(&self, block: Block) {
        drop(block);
    }
}
