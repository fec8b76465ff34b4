use crate::error::{Error, Result};

/// Byte range `[offset, end)` to be declared as zero-filled.
///
/// Layout matches FILE_ZERO_DATA_INFORMATION: two signed 64-bit offsets with
/// an exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ZeroRange {
    pub offset: i64,
    pub end: i64,
}

impl ZeroRange {
    pub fn new(offset: i64, end: i64) -> Result<Self> {
        if offset < 0 || end < offset {
            return Err(Error::BadZeroRange { offset, end });
        }
        Ok(Self { offset, end })
    }

    /// The range covering the first `length` bytes of a file.
    pub fn from_start(length: u64) -> Result<Self> {
        let end = i64::try_from(length).map_err(|_| Error::LengthTooLarge(length))?;
        Self::new(0, end)
    }

    pub fn len(&self) -> u64 {
        (self.end - self.offset) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.offset
    }
}
