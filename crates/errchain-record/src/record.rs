use bytes::BufMut;
use errchain_alloc::{AllocError, Allocator, Block, BlockWriter};

use crate::codec::{record_size, RecordRef};

/// An encoded record living in a block obtained from an [`Allocator`].
///
/// The record is built in place: one allocation sized for header and data,
/// filled once, immutable afterwards. It must be handed back with
/// [`OpaqueRecord::release`] to the allocator it came from.
pub struct OpaqueRecord {
    block: Block,
}

impl OpaqueRecord {
    /// Allocate a record carrying `data_len` bytes and let `fill` write them.
    ///
    /// `fill` receives a writer bounded to `data_len` bytes. Any bytes it
    /// leaves unwritten are zeroed. Fails only if the allocator does.
    pub fn allocate_with<A, F>(alloc: &A, data_len: usize, fill: F) -> errchain_alloc::Result<Self>
    where
        A: Allocator + ?Sized,
        F: FnOnce(&mut BlockWriter<'_>),
    {
        let size = record_size(data_len).ok_or(AllocError::OutOfMemory {
            requested: usize::MAX,
        })?;

        let mut block = alloc.allocate(size)?;
        {
            let mut writer = block.writer();
            writer.put_u64_le(size as u64);
            fill(&mut writer);
        }
        block.finish();

        Ok(Self { block })
    }

    /// Allocate a record holding a copy of `data`.
    pub fn copy_from<A>(alloc: &A, data: &[u8]) -> errchain_alloc::Result<Self>
    where
        A: Allocator + ?Sized,
    {
        Self::allocate_with(alloc, data.len(), |writer| writer.put_slice(data))
    }

    /// Allocate a copy of an existing record.
    pub fn copy_record<A>(alloc: &A, record: RecordRef<'_>) -> errchain_alloc::Result<Self>
    where
        A: Allocator + ?Sized,
    {
        Self::copy_from(alloc, record.data())
    }

    /// View the encoded record.
    pub fn as_record(&self) -> RecordRef<'_> {
        RecordRef::trusted(self.block.as_slice())
    }

    /// Total record size, header included.
    pub fn size(&self) -> usize {
        self.block.size()
    }

    /// Return the record's storage to `alloc`.
    pub fn release<A>(self, alloc: &A)
    where
        A: Allocator + ?Sized,
    {
        alloc.release(self.block);
    }
}

impl std::fmt::Debug for OpaqueRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpaqueRecord")
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use errchain_alloc::{BudgetAllocator, SystemAllocator};

    use super::*;
    use crate::codec::{decode_record, RECORD_HEADER_SIZE};

    #[test]
    fn copy_from_round_trips() {
        let alloc = SystemAllocator::new();
        let record = OpaqueRecord::copy_from(&alloc, b"\x01\x02\x03").unwrap();

        assert_eq!(record.size(), RECORD_HEADER_SIZE + 3);
        let decoded = decode_record(record.as_record().as_bytes()).unwrap();
        assert_eq!(decoded.data(), &[1, 2, 3]);

        record.release(&alloc);
    }

    #[test]
    fn one_allocation_per_record() {
        let alloc = BudgetAllocator::unlimited();
        let record = OpaqueRecord::copy_from(&alloc, &[0xAA; 40]).unwrap();

        let stats = alloc.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.live_bytes, RECORD_HEADER_SIZE + 40);

        record.release(&alloc);
        assert!(alloc.stats().is_balanced());
    }

    #[test]
    fn short_fill_is_zero_padded() {
        let alloc = SystemAllocator::new();
        let record = OpaqueRecord::allocate_with(&alloc, 4, |w| w.put_u8(9)).unwrap();

        assert_eq!(record.as_record().data(), &[9, 0, 0, 0]);
        record.release(&alloc);
    }

    #[test]
    fn copy_record_duplicates_data() {
        let alloc = SystemAllocator::new();
        let original = OpaqueRecord::copy_from(&alloc, b"payload").unwrap();
        let copy = OpaqueRecord::copy_record(&alloc, original.as_record()).unwrap();

        assert_eq!(copy.as_record(), original.as_record());

        original.release(&alloc);
        copy.release(&alloc);
    }

    #[test]
    fn allocation_failure_is_propagated() {
        let alloc = BudgetAllocator::unlimited();
        alloc.fail_next();

        let err = OpaqueRecord::copy_from(&alloc, b"x").unwrap_err();
        assert_eq!(err, AllocError::Injected { call: 1 });
        assert_eq!(alloc.stats().live_blocks, 0);
    }
}
