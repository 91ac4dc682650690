//! Error-frame layout inside a record's data.
//!
//! ```text
//! ┌─────┬─────┬──────────┬──────────┬──────────┬──────┬────┬──────────┬──────┬────┬──────────┬────────┐
//! │ Tag │ Ver │ Code     │ Line     │ File len │ File │ \0 │ Func len │ Func │ \0 │ Opq len  │ Opaque │
//! │ 1B  │ 1B  │ 8B i64LE │ 8B u64LE │ 4B u32LE │      │ 1B │ 4B u32LE │      │ 1B │ 8B u64LE │        │
//! └─────┴─────┴──────────┴──────────┴──────────┴──────┴────┴──────────┴──────┴────┴──────────┴────────┘
//! ```
//!
//! Source-location strings are copied into the frame and NUL-terminated so
//! a C caller can borrow them in place.

use std::ffi::CStr;

use bytes::{Buf, BufMut};
use errchain_record::RecordRef;

use crate::error::{FrameError, Result};

/// First byte of every frame.
pub const FRAME_TAG: u8 = 0xEF;

/// Current layout version.
pub const FRAME_VERSION: u8 = 1;

/// Bytes a frame occupies besides its strings and opaque payload.
pub const FRAME_FIXED_SIZE: usize = 1 + 1 + 8 + 8 + 4 + 1 + 4 + 1 + 8;

/// The fields of a frame about to be pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParts<'s> {
    pub code: i64,
    pub file: &'s str,
    pub line: u64,
    pub function: &'s str,
    pub opaque: &'s [u8],
}

impl FrameParts<'_> {
    /// Length of the encoded frame, or `None` if it cannot be represented.
    pub fn encoded_len(&self) -> Option<usize> {
        u32::try_from(self.file.len()).ok()?;
        u32::try_from(self.function.len()).ok()?;

        FRAME_FIXED_SIZE
            .checked_add(self.file.len())?
            .checked_add(self.function.len())?
            .checked_add(self.opaque.len())
    }

    /// Write the frame. `dst` must have room for [`encoded_len`](Self::encoded_len) bytes.
    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(FRAME_TAG);
        dst.put_u8(FRAME_VERSION);
        dst.put_i64_le(self.code);
        dst.put_u64_le(self.line);
        put_cstr(dst, self.file);
        put_cstr(dst, self.function);
        dst.put_u64_le(self.opaque.len() as u64);
        dst.put_slice(self.opaque);
    }
}

fn put_cstr<B: BufMut>(dst: &mut B, s: &str) {
    dst.put_u32_le(s.len() as u32);
    dst.put_slice(s.as_bytes());
    dst.put_u8(0);
}

/// A zero-copy view of one stored frame.
///
/// Every accessor borrows the node the frame lives in, so the view cannot
/// outlive a discard of that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'c> {
    code: i64,
    line: u64,
    file: &'c str,
    file_c: &'c CStr,
    function: &'c str,
    function_c: &'c CStr,
    opaque: &'c [u8],
}

impl<'c> Frame<'c> {
    /// Decode the frame stored in `record`.
    pub fn decode(record: RecordRef<'c>) -> Result<Self> {
        decode_frame(record.data())
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn file(&self) -> &'c str {
        self.file
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn function(&self) -> &'c str {
        self.function
    }

    /// The caller-defined payload. Empty when none was pushed.
    pub fn opaque(&self) -> &'c [u8] {
        self.opaque
    }

    /// File name as a C string, borrowed from the frame.
    ///
    /// Stops at the first interior NUL, if the name had one.
    pub fn file_cstr(&self) -> &'c CStr {
        self.file_c
    }

    /// Function name as a C string, borrowed from the frame.
    pub fn function_cstr(&self) -> &'c CStr {
        self.function_c
    }
}

/// Decode a frame from a record's data bytes.
pub fn decode_frame(mut src: &[u8]) -> Result<Frame<'_>> {
    need(src, 2)?;
    let tag = src.get_u8();
    if tag != FRAME_TAG {
        return Err(FrameError::UnknownTag { tag });
    }
    let version = src.get_u8();
    if version != FRAME_VERSION {
        return Err(FrameError::UnsupportedVersion { version });
    }

    need(src, 16)?;
    let code = src.get_i64_le();
    let line = src.get_u64_le();

    let (file, file_c) = take_cstr(&mut src, "file")?;
    let (function, function_c) = take_cstr(&mut src, "function")?;

    need(src, 8)?;
    let declared = src.get_u64_le();
    let opaque_len = usize::try_from(declared).map_err(|_| FrameError::Truncated {
        needed: usize::MAX,
        available: src.len(),
    })?;
    need(src, opaque_len)?;
    let opaque = &src[..opaque_len];

    Ok(Frame {
        code,
        line,
        file,
        file_c,
        function,
        function_c,
        opaque,
    })
}

fn need(src: &[u8], needed: usize) -> Result<()> {
    if src.len() < needed {
        return Err(FrameError::Truncated {
            needed,
            available: src.len(),
        });
    }
    Ok(())
}

fn take_cstr<'c>(src: &mut &'c [u8], field: &'static str) -> Result<(&'c str, &'c CStr)> {
    need(src, 4)?;
    let len = src.get_u32_le() as usize;
    let end = len.saturating_add(1);
    need(src, end)?;

    let (bytes, rest) = src.split_at(end);
    *src = rest;

    if bytes[len] != 0 {
        return Err(FrameError::MissingNul { field });
    }
    let s = std::str::from_utf8(&bytes[..len]).map_err(|_| FrameError::InvalidUtf8 { field })?;
    let c = CStr::from_bytes_until_nul(bytes).map_err(|_| FrameError::MissingNul { field })?;
    Ok((s, c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(parts: &FrameParts<'_>) -> Vec<u8> {
        let mut buf = Vec::new();
        parts.encode(&mut buf);
        buf
    }

    fn parts<'s>(opaque: &'s [u8]) -> FrameParts<'s> {
        FrameParts {
            code: -7,
            file: "src/io.rs",
            line: 120,
            function: "io::read",
            opaque,
        }
    }

    #[test]
    fn test_encoded_len_matches_encoding() {
        let p = parts(b"\x01\x02\x03");
        assert_eq!(encode(&p).len(), p.encoded_len().unwrap());
        assert_eq!(
            p.encoded_len().unwrap(),
            FRAME_FIXED_SIZE + "src/io.rs".len() + "io::read".len() + 3
        );
    }

    #[test]
    fn test_decode_fields() {
        let buf = encode(&parts(b"payload"));
        let frame = decode_frame(&buf).unwrap();

        assert_eq!(frame.code(), -7);
        assert_eq!(frame.file(), "src/io.rs");
        assert_eq!(frame.line(), 120);
        assert_eq!(frame.function(), "io::read");
        assert_eq!(frame.opaque(), b"payload");
        assert_eq!(frame.file_cstr().to_bytes(), b"src/io.rs");
        assert_eq!(frame.function_cstr().to_str().unwrap(), "io::read");
    }

    #[test]
    fn test_empty_fields() {
        let p = FrameParts {
            code: 0,
            file: "",
            line: 0,
            function: "",
            opaque: &[],
        };
        let buf = encode(&p);
        assert_eq!(buf.len(), FRAME_FIXED_SIZE);

        let frame = decode_frame(&buf).unwrap();
        assert_eq!(frame.file(), "");
        assert!(frame.opaque().is_empty());
        assert!(frame.function_cstr().is_empty());
    }

    #[test]
    fn test_layout_is_little_endian() {
        let buf = encode(&parts(&[]));
        assert_eq!(buf[0], FRAME_TAG);
        assert_eq!(buf[1], FRAME_VERSION);
        assert_eq!(&buf[2..10], &(-7i64).to_le_bytes());
        assert_eq!(&buf[10..18], &120u64.to_le_bytes());
        assert_eq!(&buf[18..22], &9u32.to_le_bytes());
        assert_eq!(&buf[22..31], b"src/io.rs");
        assert_eq!(buf[31], 0);
    }

    #[test]
    fn test_unknown_tag() {
        let mut buf = encode(&parts(&[]));
        buf[0] = 0x00;
        assert_eq!(
            decode_frame(&buf).unwrap_err(),
            FrameError::UnknownTag { tag: 0x00 }
        );
    }

    #[test]
    fn test_unsupported_version() {
        let mut buf = encode(&parts(&[]));
        buf[1] = 2;
        assert_eq!(
            decode_frame(&buf).unwrap_err(),
            FrameError::UnsupportedVersion { version: 2 }
        );
    }

    #[test]
    fn test_truncated_anywhere() {
        let buf = encode(&parts(b"xyz"));
        for cut in 0..buf.len() {
            assert!(
                matches!(
                    decode_frame(&buf[..cut]),
                    Err(FrameError::Truncated { .. })
                ),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn test_missing_nul() {
        let mut buf = encode(&parts(&[]));
        buf[31] = b'!';
        assert_eq!(
            decode_frame(&buf).unwrap_err(),
            FrameError::MissingNul { field: "file" }
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let mut buf = encode(&parts(&[]));
        buf[22] = 0xFF;
        assert_eq!(
            decode_frame(&buf).unwrap_err(),
            FrameError::InvalidUtf8 { field: "file" }
        );
    }

    #[test]
    fn test_interior_nul_shortens_cstr() {
        let p = FrameParts {
            file: "a\0b",
            ..parts(&[])
        };
        let buf = encode(&p);
        let frame = decode_frame(&buf).unwrap();

        assert_eq!(frame.file(), "a\0b");
        assert_eq!(frame.file_cstr().to_bytes(), b"a");
    }
}
