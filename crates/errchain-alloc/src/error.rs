/// Status returned by fallible operations that succeeded.
pub const STATUS_OK: i32 = 0;

/// The process heap could not satisfy the request.
pub const STATUS_OUT_OF_MEMORY: i32 = 1;

/// A byte budget would have been exceeded.
pub const STATUS_BUDGET_EXHAUSTED: i32 = 2;

/// A live-allocation limit would have been exceeded.
pub const STATUS_ALLOCATION_LIMIT: i32 = 3;

/// A failure armed through fault injection fired.
pub const STATUS_INJECTED_FAILURE: i32 = 4;

/// Errors reported by an [`Allocator`](crate::Allocator).
///
/// This is the only failure category in the error-chain core. Every variant
/// carries a stable, non-zero status code (see [`AllocError::status`]).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// The underlying heap refused the request.
    #[error("out of memory ({requested} bytes requested)")]
    OutOfMemory { requested: usize },

    /// The configured byte budget does not cover the request.
    #[error("allocation budget exhausted ({requested} bytes requested, {in_use} of {limit} in use)")]
    BudgetExhausted {
        requested: usize,
        in_use: usize,
        limit: usize,
    },

    /// The configured number of live allocations has been reached.
    #[error("allocation limit reached ({limit} live blocks)")]
    AllocationLimit { limit: usize },

    /// An armed fault-injection point fired.
    #[error("injected allocation failure on call {call}")]
    Injected { call: u64 },
}

impl AllocError {
    /// Numeric status code for this failure. Never [`STATUS_OK`].
    pub fn status(&self) -> i32 {
        match self {
            AllocError::OutOfMemory { .. } => STATUS_OUT_OF_MEMORY,
            AllocError::BudgetExhausted { .. } => STATUS_BUDGET_EXHAUSTED,
            AllocError::AllocationLimit { .. } => STATUS_ALLOCATION_LIMIT,
            AllocError::Injected { .. } => STATUS_INJECTED_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, AllocError>;
