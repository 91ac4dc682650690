//! Double-ended queue of opaque records.
//!
//! Every node is a length-prefixed record allocated from a caller-supplied
//! [`errchain_alloc::Allocator`]. The queue never interprets record data.

pub mod deque;
pub mod key;

pub use deque::{Deque, Iter, CONTROL_BLOCK_SIZE};
pub use key::NodeKey;
