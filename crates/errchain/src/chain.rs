use std::iter::FusedIterator;

use errchain_alloc::{AllocError, Allocator, Result, SystemAllocator};
use errchain_deque::{Deque, Iter};
use errchain_record::RecordRef;
use tracing::{error, trace};

use crate::frame::{Frame, FrameParts};

/// An ordered, double-ended chain of error frames.
///
/// Each frame is encoded into a single allocation from the chain's
/// allocator. Pushes are all-or-nothing: on failure the chain is exactly as
/// it was and the allocator's error is returned unchanged.
///
/// A chain is confined to one thread; callers sharing one across threads
/// must serialize every operation themselves.
///
/// # Example
///
/// ```
/// use errchain::{ErrorChain, SystemAllocator};
///
/// let alloc = SystemAllocator::new();
/// let mut chain = ErrorChain::construct(&alloc).unwrap();
///
/// chain.push_last(1, "f.c", 10, "main", &[]).unwrap();
/// chain.push_last(2, "f.c", 20, "g", &[0xAA]).unwrap();
///
/// assert_eq!(chain.size(), 2);
/// assert_eq!(chain.peek_first().unwrap().code(), 1);
/// assert_eq!(chain.peek_last().unwrap().opaque(), &[0xAA]);
///
/// chain.discard_first();
/// assert_eq!(chain.peek_first().unwrap().code(), 2);
/// ```
pub struct ErrorChain<'a, A: Allocator + ?Sized = SystemAllocator> {
    queue: Deque<'a, A>,
}

impl<'a, A: Allocator + ?Sized> ErrorChain<'a, A> {
    /// Create an empty chain drawing from `allocator`.
    ///
    /// The allocator's error is propagated unchanged.
    pub fn construct(allocator: &'a A) -> Result<Self> {
        Ok(Self {
            queue: Deque::construct(allocator)?,
        })
    }

    /// Release every frame and the chain's own storage.
    pub fn destruct(self) {
        self.queue.destruct();
    }

    /// Release every frame, first to last. The chain stays usable.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// The allocator this chain draws from.
    pub fn allocator(&self) -> &'a A {
        self.queue.allocator()
    }

    /// Push a frame in front of the first one.
    ///
    /// `file`, `function` and `opaque` are copied into the frame.
    pub fn push_first(
        &mut self,
        code: i64,
        file: &str,
        line: u64,
        function: &str,
        opaque: &[u8],
    ) -> Result<()> {
        let parts = FrameParts {
            code,
            file,
            line,
            function,
            opaque,
        };
        let len = encoded_len(&parts)?;
        self.queue.push_front_with(len, |w| parts.encode(w))?;

        trace!(code, line, size = self.size(), "frame pushed first");
        Ok(())
    }

    /// Push a frame after the last one.
    ///
    /// `file`, `function` and `opaque` are copied into the frame.
    pub fn push_last(
        &mut self,
        code: i64,
        file: &str,
        line: u64,
        function: &str,
        opaque: &[u8],
    ) -> Result<()> {
        let parts = FrameParts {
            code,
            file,
            line,
            function,
            opaque,
        };
        let len = encoded_len(&parts)?;
        self.queue.push_back_with(len, |w| parts.encode(w))?;

        trace!(code, line, size = self.size(), "frame pushed last");
        Ok(())
    }

    /// Remove the first frame. No-op if the chain is empty.
    pub fn discard_first(&mut self) {
        self.queue.discard_front();
    }

    /// Remove the last frame. No-op if the chain is empty.
    pub fn discard_last(&mut self) {
        self.queue.discard_back();
    }

    /// View the first frame, or `None` if the chain is empty.
    pub fn peek_first(&self) -> Option<Frame<'_>> {
        self.queue.peek_front().and_then(decode_logged)
    }

    /// View the last frame, or `None` if the chain is empty.
    pub fn peek_last(&self) -> Option<Frame<'_>> {
        self.queue.peek_back().and_then(decode_logged)
    }

    /// Number of frames.
    pub fn size(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Walk the frames first to last; `rev()` walks last to first.
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            inner: self.queue.iter(),
        }
    }
}

impl<A: Allocator + ?Sized> std::fmt::Debug for ErrorChain<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorChain")
            .field("size", &self.size())
            .finish()
    }
}

impl<'c, A: Allocator + ?Sized> IntoIterator for &'c ErrorChain<'_, A> {
    type Item = Frame<'c>;
    type IntoIter = Frames<'c>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames()
    }
}

fn encoded_len(parts: &FrameParts<'_>) -> Result<usize> {
    parts.encoded_len().ok_or(AllocError::OutOfMemory {
        requested: usize::MAX,
    })
}

fn decode_logged(record: RecordRef<'_>) -> Option<Frame<'_>> {
    Frame::decode(record)
        .inspect_err(|err| error!(error = %err, size = record.size(), "stored frame is undecodable"))
        .ok()
}

/// Iterator over the frames of an [`ErrorChain`].
#[derive(Debug, Clone)]
pub struct Frames<'c> {
    inner: Iter<'c>,
}

impl<'c> Iterator for Frames<'c> {
    type Item = Frame<'c>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.by_ref().find_map(decode_logged)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.inner.len()))
    }
}

impl DoubleEndedIterator for Frames<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.by_ref().rev().find_map(decode_logged)
    }
}

impl FusedIterator for Frames<'_> {}
