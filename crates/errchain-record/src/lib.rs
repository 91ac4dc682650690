//! Length-prefixed opaque records.
//!
//! A record is a self-describing byte blob used to erase the type of
//! whatever a container stores:
//! - An 8-byte little-endian size (header + data)
//! - The data bytes
//!
//! [`OpaqueRecord`] builds a record directly in a block obtained from an
//! [`errchain_alloc::Allocator`]; [`RecordRef`] is the zero-copy view.

pub mod codec;
pub mod error;
pub mod record;

pub use codec::{
    decode_record, encode_record, put_record_header, record_size, RecordRef, RECORD_HEADER_SIZE,
};
pub use error::{RecordError, Result};
pub use record::OpaqueRecord;
