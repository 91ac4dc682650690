//! Doubly-linked queue of opaque records over a slot arena.
//!
//! Nodes live in a slot arena and refer to each other by [`NodeKey`]. Each
//! node owns one [`OpaqueRecord`] allocated from the queue's allocator; the
//! arena itself only holds links. Both ends are tracked, so every operation
//! is O(1).
//!
//! # Failure atomicity
//!
//! A push first reserves an arena slot, then allocates the record, and only
//! then touches any link. If either step fails the queue is unchanged.
//!
//! # Example
//!
//! ```
//! use errchain_alloc::SystemAllocator;
//! use errchain_deque::Deque;
//!
//! let alloc = SystemAllocator::new();
//! let mut queue = Deque::construct(&alloc).unwrap();
//!
//! queue.push_back_bytes(b"a").unwrap();
//! queue.push_back_bytes(b"b").unwrap();
//! queue.push_front_bytes(b"c").unwrap();
//!
//! assert_eq!(queue.len(), 3);
//! assert_eq!(queue.peek_front().unwrap().data(), b"c");
//! assert_eq!(queue.peek_back().unwrap().data(), b"b");
//!
//! queue.discard_front();
//! assert_eq!(queue.peek_front().unwrap().data(), b"a");
//! ```

use std::iter::FusedIterator;
use std::mem;

use bytes::BufMut;
use errchain_alloc::{AllocError, Allocator, Block, BlockWriter, Result};
use errchain_record::{OpaqueRecord, RecordRef};
use tracing::{debug, trace, warn};

use crate::key::NodeKey;

/// Queue header: both ends, the free-slot list, and the element count.
#[derive(Debug, Clone, Copy)]
struct Header {
    first: NodeKey,
    last: NodeKey,
    free: NodeKey,
    len: usize,
}

impl Header {
    const EMPTY: Self = Self {
        first: NodeKey::NONE,
        last: NodeKey::NONE,
        free: NodeKey::NONE,
        len: 0,
    };
}

/// Bytes charged to the allocator for a queue's control block.
pub const CONTROL_BLOCK_SIZE: usize = mem::size_of::<Header>();

#[derive(Debug)]
struct Node {
    prev: NodeKey,
    next: NodeKey,
    record: OpaqueRecord,
}

#[derive(Debug)]
enum Slot {
    Vacant { next_free: NodeKey },
    Occupied(Node),
}

/// A double-ended queue of opaque records.
///
/// The queue borrows its allocator for its whole lifetime. Dropping the
/// queue releases every node and the control block back to it.
pub struct Deque<'a, A: Allocator + ?Sized> {
    allocator: &'a A,
    control: Option<Block>,
    slots: Vec<Slot>,
    header: Header,
}

impl<'a, A: Allocator + ?Sized> Deque<'a, A> {
    /// Create an empty queue whose storage comes from `allocator`.
    ///
    /// # Errors
    ///
    /// Fails only if the control block cannot be allocated; nothing is
    /// leaked in that case.
    pub fn construct(allocator: &'a A) -> Result<Self> {
        let control = allocator.allocate(CONTROL_BLOCK_SIZE)?;
        debug!(control_bytes = CONTROL_BLOCK_SIZE, "queue constructed");
        Ok(Self {
            allocator,
            control: Some(control),
            slots: Vec::new(),
            header: Header::EMPTY,
        })
    }

    /// Release every node and the control block.
    ///
    /// Equivalent to dropping the queue.
    pub fn destruct(self) {
        drop(self);
    }

    /// The allocator this queue draws from.
    pub fn allocator(&self) -> &'a A {
        self.allocator
    }

    /// Number of records in the queue.
    #[inline]
    pub fn len(&self) -> usize {
        self.header.len
    }

    /// Returns `true` if the queue holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.header.len == 0
    }

    // ========================================================================
    // Push
    // ========================================================================

    /// Push a copy of `record` at the front.
    pub fn push_front(&mut self, record: RecordRef<'_>) -> Result<()> {
        self.push_front_with(record.data().len(), |w| w.put_slice(record.data()))
    }

    /// Push a copy of `record` at the back.
    pub fn push_back(&mut self, record: RecordRef<'_>) -> Result<()> {
        self.push_back_with(record.data().len(), |w| w.put_slice(record.data()))
    }

    /// Push a record holding a copy of `data` at the front.
    pub fn push_front_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.push_front_with(data.len(), |w| w.put_slice(data))
    }

    /// Push a record holding a copy of `data` at the back.
    pub fn push_back_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.push_back_with(data.len(), |w| w.put_slice(data))
    }

    /// Push a record of `data_len` bytes at the front, written in place by `fill`.
    pub fn push_front_with<F>(&mut self, data_len: usize, fill: F) -> Result<()>
    where
        F: FnOnce(&mut BlockWriter<'_>),
    {
        let record = self.prepare(data_len, fill)?;
        let key = self.insert(Node {
            prev: NodeKey::NONE,
            next: self.header.first,
            record,
        });

        match self.node_mut(self.header.first) {
            Some(first) => first.prev = key,
            None => self.header.last = key,
        }
        self.header.first = key;
        self.header.len += 1;

        trace!(len = self.header.len, "pushed front");
        Ok(())
    }

    /// Push a record of `data_len` bytes at the back, written in place by `fill`.
    pub fn push_back_with<F>(&mut self, data_len: usize, fill: F) -> Result<()>
    where
        F: FnOnce(&mut BlockWriter<'_>),
    {
        let record = self.prepare(data_len, fill)?;
        let key = self.insert(Node {
            prev: self.header.last,
            next: NodeKey::NONE,
            record,
        });

        match self.node_mut(self.header.last) {
            Some(last) => last.next = key,
            None => self.header.first = key,
        }
        self.header.last = key;
        self.header.len += 1;

        trace!(len = self.header.len, "pushed back");
        Ok(())
    }

    // ========================================================================
    // Discard
    // ========================================================================

    /// Remove and release the front record. No-op if empty.
    pub fn discard_front(&mut self) {
        let Some(node) = self.remove(self.header.first) else {
            return;
        };

        self.header.first = node.next;
        match self.node_mut(node.next) {
            Some(next) => next.prev = NodeKey::NONE,
            None => self.header.last = NodeKey::NONE,
        }
        self.header.len -= 1;

        node.record.release(self.allocator);
        trace!(len = self.header.len, "discarded front");
    }

    /// Remove and release the back record. No-op if empty.
    pub fn discard_back(&mut self) {
        let Some(node) = self.remove(self.header.last) else {
            return;
        };

        self.header.last = node.prev;
        match self.node_mut(node.prev) {
            Some(prev) => prev.next = NodeKey::NONE,
            None => self.header.first = NodeKey::NONE,
        }
        self.header.len -= 1;

        node.record.release(self.allocator);
        trace!(len = self.header.len, "discarded back");
    }

    /// Release every record, front to back. The control block is kept.
    pub fn clear(&mut self) {
        let mut key = self.header.first;
        while let Some(node) = self.remove(key) {
            key = node.next;
            node.record.release(self.allocator);
        }

        self.slots.clear();
        self.header = Header::EMPTY;
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// View the front record without removing it.
    pub fn peek_front(&self) -> Option<RecordRef<'_>> {
        self.node(self.header.first).map(|node| node.record.as_record())
    }

    /// View the back record without removing it.
    pub fn peek_back(&self) -> Option<RecordRef<'_>> {
        self.node(self.header.last).map(|node| node.record.as_record())
    }

    /// Walk the records front to back (or back to front via `rev`).
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            slots: &self.slots,
            front: self.header.first,
            back: self.header.last,
            remaining: self.header.len,
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Reserve a slot, then allocate the record. Nothing is linked yet.
    fn prepare<F>(&mut self, data_len: usize, fill: F) -> Result<OpaqueRecord>
    where
        F: FnOnce(&mut BlockWriter<'_>),
    {
        self.reserve_slot()
            .and_then(|()| OpaqueRecord::allocate_with(self.allocator, data_len, fill))
            .inspect_err(|err| {
                warn!(error = %err, data_len, len = self.header.len, "push failed");
            })
    }

    fn reserve_slot(&mut self) -> Result<()> {
        if self.header.free.is_some() {
            return Ok(());
        }

        let slot_bytes = mem::size_of::<Slot>();
        if self.slots.len() >= NodeKey::MAX_SLOTS - 1 {
            return Err(AllocError::OutOfMemory {
                requested: slot_bytes,
            });
        }

        self.slots
            .try_reserve(1)
            .map_err(|_| AllocError::OutOfMemory {
                requested: slot_bytes,
            })
    }

    /// Store `node` in a slot made available by `reserve_slot`.
    fn insert(&mut self, node: Node) -> NodeKey {
        let free = self.header.free;
        if let Some(slot) = self.slots.get_mut(free.index()) {
            if let Slot::Vacant { next_free } = *slot {
                self.header.free = next_free;
                *slot = Slot::Occupied(node);
                return free;
            }
        }

        let index = self.slots.len();
        self.slots.push(Slot::Occupied(node));
        // reserve_slot keeps the arena below MAX_SLOTS - 1
        NodeKey::from_index(index).unwrap_or(NodeKey::NONE)
    }

    /// Take the node out of `key`'s slot and put the slot on the free list.
    fn remove(&mut self, key: NodeKey) -> Option<Node> {
        let slot = self.slots.get_mut(key.index())?;
        let vacant = Slot::Vacant {
            next_free: self.header.free,
        };
        match mem::replace(slot, vacant) {
            Slot::Occupied(node) => {
                self.header.free = key;
                Some(node)
            }
            previous @ Slot::Vacant { .. } => {
                *slot = previous;
                None
            }
        }
    }

    fn node(&self, key: NodeKey) -> Option<&Node> {
        match self.slots.get(key.index()) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        match self.slots.get_mut(key.index()) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }
}

impl<A: Allocator + ?Sized> Drop for Deque<'_, A> {
    fn drop(&mut self) {
        let len = self.header.len;
        self.clear();
        if let Some(control) = self.control.take() {
            self.allocator.release(control);
        }
        debug!(released_nodes = len, "queue destructed");
    }
}

impl<A: Allocator + ?Sized> std::fmt::Debug for Deque<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deque")
            .field("len", &self.header.len)
            .field("slots", &self.slots.len())
            .finish()
    }
}

impl<'d, A: Allocator + ?Sized> IntoIterator for &'d Deque<'_, A> {
    type Item = RecordRef<'d>;
    type IntoIter = Iter<'d>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Linear walk over a [`Deque`]'s links.
#[derive(Debug, Clone)]
pub struct Iter<'d> {
    slots: &'d [Slot],
    front: NodeKey,
    back: NodeKey,
    remaining: usize,
}

impl<'d> Iter<'d> {
    fn node(&self, key: NodeKey) -> Option<&'d Node> {
        match self.slots.get(key.index()) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }
}

impl<'d> Iterator for Iter<'d> {
    type Item = RecordRef<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.node(self.front)?;
        self.front = node.next;
        self.remaining -= 1;
        Some(node.record.as_record())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.node(self.back)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some(node.record.as_record())
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
