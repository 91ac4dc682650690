use bytes::{Buf, BufMut};

use crate::error::{RecordError, Result};

/// Record header: total size (8 bytes, little-endian).
pub const RECORD_HEADER_SIZE: usize = 8;

/// Total encoded size of a record carrying `data_len` bytes.
///
/// Returns `None` if the size does not fit in `usize`.
pub fn record_size(data_len: usize) -> Option<usize> {
    RECORD_HEADER_SIZE.checked_add(data_len)
}

/// Write the header of a record that will carry `data_len` bytes.
///
/// The caller writes exactly `data_len` data bytes after it.
pub fn put_record_header<B: BufMut>(data_len: usize, dst: &mut B) -> Result<()> {
    let size = record_size(data_len).ok_or(RecordError::TooLarge { len: data_len })?;
    dst.put_u64_le(size as u64);
    Ok(())
}

/// Encode a record into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬─────────────────────┐
/// │ Size (8B LE)     │ Data                │
/// │ header + data    │ (Size - 8 bytes)    │
/// └──────────────────┴─────────────────────┘
/// ```
pub fn encode_record<B: BufMut>(data: &[u8], dst: &mut B) -> Result<()> {
    put_record_header(data.len(), dst)?;
    dst.put_slice(data);
    Ok(())
}

/// Decode the record at the start of `src`.
///
/// The returned view covers exactly the bytes the size field declares;
/// anything after them is ignored.
pub fn decode_record(src: &[u8]) -> Result<RecordRef<'_>> {
    if src.len() < RECORD_HEADER_SIZE {
        return Err(RecordError::Truncated {
            needed: RECORD_HEADER_SIZE,
            available: src.len(),
        });
    }

    let mut header = &src[..RECORD_HEADER_SIZE];
    let declared = header.get_u64_le();

    let size = match usize::try_from(declared) {
        Ok(size) if size >= RECORD_HEADER_SIZE => size,
        _ => {
            return Err(RecordError::SizeMismatch {
                declared,
                actual: src.len(),
            })
        }
    };

    if src.len() < size {
        return Err(RecordError::Truncated {
            needed: size,
            available: src.len(),
        });
    }

    Ok(RecordRef { bytes: &src[..size] })
}

/// A borrowed view of one encoded record.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecordRef<'a> {
    bytes: &'a [u8],
}

impl<'a> RecordRef<'a> {
    /// Wrap bytes this crate wrote itself, skipping validation.
    pub(crate) fn trusted(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Total record size, header included.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// The data carried after the header.
    pub fn data(&self) -> &'a [u8] {
        &self.bytes[RECORD_HEADER_SIZE..]
    }

    /// The complete encoded record.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl std::fmt::Debug for RecordRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordRef")
            .field("size", &self.size())
            .finish()
    }
}
