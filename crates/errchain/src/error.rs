/// Errors that can occur while decoding a stored frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The frame does not start with the frame tag.
    #[error("invalid frame tag 0x{tag:02X} (expected 0xEF)")]
    UnknownTag { tag: u8 },

    /// The frame was written by an unknown layout version.
    #[error("unsupported frame version {version}")]
    UnsupportedVersion { version: u8 },

    /// The record ends before the frame does.
    #[error("frame truncated (need {needed} bytes, have {available})")]
    Truncated { needed: usize, available: usize },

    /// A source-location string is not valid UTF-8.
    #[error("frame {field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// A source-location string is missing its NUL terminator.
    #[error("frame {field} is not NUL-terminated")]
    MissingNul { field: &'static str },
}

pub type Result<T> = std::result::Result<T, FrameError>;
