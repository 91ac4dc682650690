use bytes::buf::Limit;
use bytes::BufMut;

use crate::error::{AllocError, Result};

/// Bounded writer over a [`Block`]'s unwritten tail.
pub type BlockWriter<'a> = Limit<&'a mut Vec<u8>>;

/// A fallible allocate/release capability.
///
/// Structures built on top of an allocator borrow it for their whole
/// lifetime and never own it. Every [`Block`] handed out by `allocate` must
/// come back through `release` on the same allocator; since `Block` is not
/// `Clone`, a block can be released at most once.
pub trait Allocator {
    /// Allocate a block of exactly `size` bytes.
    ///
    /// On failure nothing is allocated and the error describes why.
    fn allocate(&self, size: usize) -> Result<Block>;

    /// Return a block previously obtained from [`Allocator::allocate`].
    fn release(&self, block: Block);
}

impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate(&self, size: usize) -> Result<Block> {
        (**self).allocate(size)
    }

    fn release(&self, block: Block) {
        (**self).release(block)
    }
}

/// An owned, fixed-size byte region obtained from an [`Allocator`].
///
/// The block starts empty and is filled through [`Block::writer`], which
/// refuses to write past the requested size.
pub struct Block {
    buf: Vec<u8>,
    size: usize,
}

impl Block {
    /// Reserve `size` bytes from the process heap without aborting on failure.
    pub fn try_new(size: usize) -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(size)
            .map_err(|_| AllocError::OutOfMemory { requested: size })?;
        Ok(Self { buf, size })
    }

    /// The size requested when this block was allocated.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes that can still be written.
    pub fn remaining(&self) -> usize {
        self.size - self.buf.len()
    }

    /// The written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// A writer bounded by the block's remaining capacity.
    pub fn writer(&mut self) -> BlockWriter<'_> {
        let remaining = self.remaining();
        (&mut self.buf).limit(remaining)
    }

    /// Zero-fill any unwritten tail so the whole block is initialised.
    pub fn finish(&mut self) {
        self.buf.resize(self.size, 0);
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("size", &self.size)
            .field("len", &self.buf.len())
            .finish()
    }
}
