use std::cell::Cell;

use tracing::debug;

use crate::config::BudgetConfig;
use crate::error::{AllocError, Result};
use crate::system::SystemAllocator;
use crate::traits::{Allocator, Block};

/// Counters kept by a [`BudgetAllocator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocStats {
    /// Successful `allocate` calls.
    pub allocations: u64,
    /// `release` calls.
    pub releases: u64,
    /// Failed `allocate` calls, whatever the cause.
    pub failures: u64,
    /// Blocks currently allocated.
    pub live_blocks: usize,
    /// Bytes currently allocated.
    pub live_bytes: usize,
    /// High-water mark of `live_bytes`.
    pub peak_bytes: usize,
}

impl AllocStats {
    /// Returns `true` when every allocated block has been released.
    pub fn is_balanced(&self) -> bool {
        self.live_blocks == 0 && self.allocations == self.releases
    }
}

/// An allocator wrapper that enforces a [`BudgetConfig`], keeps
/// [`AllocStats`], and can be armed to fail on demand.
///
/// Counters use `Cell`, so a budget allocator is confined to one thread,
/// like the structures that borrow it.
///
/// # Example
///
/// ```
/// use errchain_alloc::{Allocator, BudgetAllocator, BudgetConfig};
///
/// let alloc = BudgetAllocator::new(BudgetConfig::unlimited().with_max_bytes(64));
/// let block = alloc.allocate(48).unwrap();
/// assert!(alloc.allocate(32).is_err());
///
/// alloc.release(block);
/// assert!(alloc.stats().is_balanced());
/// ```
#[derive(Debug)]
pub struct BudgetAllocator<A = SystemAllocator> {
    inner: A,
    config: BudgetConfig,
    stats: Cell<AllocStats>,
    calls: Cell<u64>,
    fail_on_call: Cell<Option<u64>>,
}

impl BudgetAllocator<SystemAllocator> {
    /// Budget the process heap.
    pub fn new(config: BudgetConfig) -> Self {
        Self::with_inner(SystemAllocator::new(), config)
    }

    /// Count heap allocations without limiting them.
    pub fn unlimited() -> Self {
        Self::new(BudgetConfig::unlimited())
    }
}

impl<A: Allocator> BudgetAllocator<A> {
    /// Budget allocations served by `inner`.
    pub fn with_inner(inner: A, config: BudgetConfig) -> Self {
        Self {
            inner,
            config,
            stats: Cell::new(AllocStats::default()),
            calls: Cell::new(0),
            fail_on_call: Cell::new(None),
        }
    }

    /// The limits in force.
    pub fn config(&self) -> BudgetConfig {
        self.config
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> AllocStats {
        self.stats.get()
    }

    /// Make the next `allocate` call fail.
    pub fn fail_next(&self) {
        self.fail_after(0);
    }

    /// Let `successes` more `allocate` calls through, then fail the one after.
    pub fn fail_after(&self, successes: u64) {
        self.fail_on_call
            .set(Some(self.calls.get() + successes + 1));
    }

    /// Cancel a pending injected failure.
    pub fn disarm(&self) {
        self.fail_on_call.set(None);
    }

    /// Unwrap the inner allocator.
    pub fn into_inner(self) -> A {
        self.inner
    }

    fn reject(&self, err: AllocError) -> Result<Block> {
        let mut stats = self.stats.get();
        stats.failures += 1;
        self.stats.set(stats);
        debug!(error = %err, "allocation rejected");
        Err(err)
    }

    fn check_budget(&self, size: usize) -> Result<()> {
        let stats = self.stats.get();

        if let Some(limit) = self.config.max_allocations {
            if stats.live_blocks >= limit {
                return Err(AllocError::AllocationLimit { limit });
            }
        }

        if let Some(limit) = self.config.max_bytes {
            let fits = stats
                .live_bytes
                .checked_add(size)
                .is_some_and(|total| total <= limit);
            if !fits {
                return Err(AllocError::BudgetExhausted {
                    requested: size,
                    in_use: stats.live_bytes,
                    limit,
                });
            }
        }

        Ok(())
    }
}

impl<A: Allocator> Allocator for BudgetAllocator<A> {
    fn allocate(&self, size: usize) -> Result<Block> {
        let call = self.calls.get() + 1;
        self.calls.set(call);

        if self.fail_on_call.get() == Some(call) {
            self.fail_on_call.set(None);
            return self.reject(AllocError::Injected { call });
        }

        if let Err(err) = self.check_budget(size) {
            return self.reject(err);
        }

        let block = match self.inner.allocate(size) {
            Ok(block) => block,
            Err(err) => return self.reject(err),
        };

        let mut stats = self.stats.get();
        stats.allocations += 1;
        stats.live_blocks += 1;
        stats.live_bytes += size;
        stats.peak_bytes = stats.peak_bytes.max(stats.live_bytes);
        self.stats.set(stats);

        Ok(block)
    }

    fn release(&self, block: Block) {
        let mut stats = self.stats.get();
        stats.releases += 1;
        stats.live_blocks = stats.live_blocks.saturating_sub(1);
        stats.live_bytes = stats.live_bytes.saturating_sub(block.size());
        self.stats.set(stats);

        self.inner.release(block);
    }
}
