//! Fallible allocator capability for the error-chain structures.
//!
//! Structures in this workspace never reach for the global allocator to hold
//! their payloads. They borrow an [`Allocator`] for their whole lifetime and
//! ask it for [`Block`]s, so that an allocation failure is an ordinary
//! [`AllocError`] value instead of an abort.
//!
//! - [`SystemAllocator`] serves blocks from the process heap.
//! - [`BudgetAllocator`] wraps another allocator with byte/block limits,
//!   counters, and fault injection for tests.
//!
//! This is the lowest layer of errchain. Everything else builds on top of
//! the capability defined here.

pub mod budget;
pub mod config;
pub mod error;
pub mod system;
pub mod traits;

pub use budget::{AllocStats, BudgetAllocator};
pub use config::BudgetConfig;
pub use error::{
    AllocError, Result, STATUS_ALLOCATION_LIMIT, STATUS_BUDGET_EXHAUSTED,
    STATUS_INJECTED_FAILURE, STATUS_OK, STATUS_OUT_OF_MEMORY,
};
pub use system::SystemAllocator;
pub use traits::{Allocator, Block, BlockWriter};
