/// Errors that can occur while encoding or decoding a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The buffer ends before the record does.
    #[error("record truncated (need {needed} bytes, have {available})")]
    Truncated { needed: usize, available: usize },

    /// The size field cannot describe a well-formed record.
    #[error("record size field is {declared}, but {actual} bytes were supplied")]
    SizeMismatch { declared: u64, actual: usize },

    /// The data is too large for the size field.
    #[error("record data too large ({len} bytes)")]
    TooLarge { len: usize },
}

pub type Result<T> = std::result::Result<T, RecordError>;
