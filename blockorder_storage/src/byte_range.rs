//! Byte ranges within a stored value.
//!
//! Block containers are read in two kinds of range: the chunk index at the end of the container and a single encoded chunk at a known offset.

use std::ops::Range;

use thiserror::Error;

/// A range of bytes within a stored value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ByteRange {
    /// `length` bytes starting at `offset`, or every byte after `offset` if the length is [`None`].
    FromStart(u64, Option<u64>),
    /// The last `length` bytes.
    Suffix(u64),
}

impl ByteRange {
    /// The bounds of the range within a value of `size` bytes.
    ///
    /// # Errors
    /// Returns [`InvalidByteRangeError`] if the range does not lie within the value.
    pub fn bounds(self, size: u64) -> Result<Range<usize>, InvalidByteRangeError> {
        let (start, end) = match self {
            Self::FromStart(offset, None) => (offset, size),
            Self::FromStart(offset, Some(length)) => (offset, offset.saturating_add(length)),
            Self::Suffix(length) => (size.wrapping_sub(length), size),
        };
        if start > end || end > size {
            return Err(InvalidByteRangeError {
                byte_range: self,
                size,
            });
        }
        let to_usize = |bound: u64| {
            usize::try_from(bound).map_err(|_| InvalidByteRangeError {
                byte_range: self,
                size,
            })
        };
        Ok(to_usize(start)?..to_usize(end)?)
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FromStart(offset, None) => write!(f, "bytes {offset}.."),
            Self::FromStart(offset, Some(length)) => {
                write!(f, "bytes {offset}..{}", offset.saturating_add(*length))
            }
            Self::Suffix(length) => write!(f, "last {length} bytes"),
        }
    }
}

/// A byte range outside of a stored value.
#[derive(Copy, Clone, Debug, Error)]
#[error("{byte_range} is outside of a value of {size} bytes")]
pub struct InvalidByteRangeError {
    byte_range: ByteRange,
    size: u64,
}

impl InvalidByteRangeError {
    /// The requested byte range.
    #[must_use]
    pub const fn byte_range(&self) -> ByteRange {
        self.byte_range
    }

    /// The size of the value.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_range_bounds() {
        assert_eq!(ByteRange::FromStart(1, None).bounds(10).unwrap(), 1..10);
        assert_eq!(ByteRange::FromStart(1, Some(5)).bounds(10).unwrap(), 1..6);
        assert_eq!(ByteRange::FromStart(10, None).bounds(10).unwrap(), 10..10);
        assert_eq!(ByteRange::Suffix(3).bounds(10).unwrap(), 7..10);
        assert_eq!(ByteRange::Suffix(10).bounds(10).unwrap(), 0..10);
        assert_eq!(ByteRange::Suffix(0).bounds(0).unwrap(), 0..0);
    }

    #[test]
    fn byte_range_outside() {
        assert!(ByteRange::FromStart(11, None).bounds(10).is_err());
        assert!(ByteRange::FromStart(8, Some(3)).bounds(10).is_err());
        assert!(ByteRange::FromStart(u64::MAX, Some(2)).bounds(10).is_err());
        assert!(ByteRange::Suffix(11).bounds(10).is_err());

        let err = ByteRange::FromStart(1, Some(4)).bounds(3).unwrap_err();
        assert_eq!(err.byte_range(), ByteRange::FromStart(1, Some(4)));
        assert_eq!(err.size(), 3);
        assert_eq!(err.to_string(), "bytes 1..5 is outside of a value of 3 bytes");
        assert_eq!(
            ByteRange::Suffix(4).bounds(3).unwrap_err().to_string(),
            "last 4 bytes is outside of a value of 3 bytes"
        );
    }
}
