//! Allocator-backed error-context chains.
//!
//! An [`ErrorChain`] is an ordered, double-ended collection of error frames
//! that a call stack accumulates while a failure propagates upward. Each
//! frame carries a code, the source location it was pushed from, and an
//! opaque caller-defined payload. Storage comes from an injected
//! [`Allocator`], and every fallible operation reports the allocator's own
//! error unchanged.
//!
//! # Crate Structure
//!
//! - [`alloc`] - Allocator capability, system and budgeted allocators
//! - [`record`] - Length-prefixed opaque records
//! - [`deque`] - Double-ended queue of records
//! - [`ErrorChain`] and [`Frame`] - The frame encoding over the queue
//!
//! # Example
//!
//! ```
//! use errchain::{push_last, BudgetAllocator, ErrorChain};
//!
//! fn parse(chain: &mut ErrorChain<'_, BudgetAllocator>, input: &str) -> Option<u32> {
//!     match input.parse() {
//!         Ok(n) => Some(n),
//!         Err(_) => {
//!             let _ = push_last!(chain, 22, input.as_bytes());
//!             None
//!         }
//!     }
//! }
//!
//! let alloc = BudgetAllocator::unlimited();
//! let mut chain = ErrorChain::construct(&alloc).unwrap();
//!
//! assert_eq!(parse(&mut chain, "12"), Some(12));
//! assert_eq!(parse(&mut chain, "x"), None);
//!
//! let frame = chain.peek_last().unwrap();
//! assert_eq!(frame.code(), 22);
//! assert_eq!(frame.opaque(), b"x");
//!
//! chain.destruct();
//! assert!(alloc.stats().is_balanced());
//! ```

pub mod chain;
pub mod error;
pub mod frame;
mod macros;

/// Re-export allocator types.
pub mod alloc {
    pub use errchain_alloc::*;
}

/// Re-export record types.
pub mod record {
    pub use errchain_record::*;
}

/// Re-export queue types.
pub mod deque {
    pub use errchain_deque::*;
}

pub use chain::{ErrorChain, Frames};
pub use error::FrameError;
pub use frame::{decode_frame, Frame, FrameParts, FRAME_FIXED_SIZE, FRAME_TAG, FRAME_VERSION};

pub use errchain_alloc::{
    AllocError, AllocStats, Allocator, BudgetAllocator, BudgetConfig, SystemAllocator,
};
