//! Handles addressing nodes in the queue's slot arena.
//!
//! Uses a reserved sentinel (`u32::MAX`) instead of `Option<NodeKey>` so a
//! node's links stay two words wide.

/// Index of a node slot, or [`NodeKey::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(u32);

impl NodeKey {
    /// Sentinel for "no node".
    pub const NONE: Self = NodeKey(u32::MAX);

    /// Number of distinct slots a key can address.
    pub const MAX_SLOTS: usize = u32::MAX as usize;

    /// Key for slot `index`, or `None` if the index is not addressable.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        if index < Self::MAX_SLOTS {
            Some(NodeKey(index as u32))
        } else {
            None
        }
    }

    /// Slot index. The sentinel maps past every valid slot.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` if this is the sentinel.
    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Returns `true` if this addresses a slot.
    #[inline]
    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}
