//! The output of a region read.
//!
//! A [`RegionBytes`] holds the elements of a region in row-major order with its shape and element size,
//! and converts to a vector of any plain-old-data element type of the same size.

use thiserror::Error;

use crate::grid::ArrayShape;

/// The bytes of a region of an array in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionBytes {
    shape: ArrayShape,
    element_size: usize,
    bytes: Vec<u8>,
}

/// A region bytes error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegionBytesError {
    /// The number of bytes does not match the shape and element size.
    #[error("region of shape {shape:?} with {element_size} byte elements expects {expected_len} bytes, got {len}")]
    InvalidBytesLength {
        /// The region shape.
        shape: ArrayShape,
        /// The element size.
        element_size: usize,
        /// The number of bytes.
        len: usize,
        /// The expected number of bytes.
        expected_len: u64,
    },
    /// The element type size does not match the region element size.
    #[error("element type of {element_type_size} bytes is incompatible with {element_size} byte elements")]
    IncompatibleElementSize {
        /// The size of the element type.
        element_type_size: usize,
        /// The element size of the region.
        element_size: usize,
    },
}

impl RegionBytes {
    /// Create new region bytes.
    ///
    /// # Errors
    /// Returns [`RegionBytesError::InvalidBytesLength`] if the length of `bytes` does not match `shape` and `element_size`.
    pub fn new(
        shape: ArrayShape,
        element_size: usize,
        bytes: Vec<u8>,
    ) -> Result<Self, RegionBytesError> {
        let expected_len = shape
            .iter()
            .product::<u64>()
            .saturating_mul(element_size as u64);
        if bytes.len() as u64 == expected_len {
            Ok(Self {
                shape,
                element_size,
                bytes,
            })
        } else {
            Err(RegionBytesError::InvalidBytesLength {
                len: bytes.len(),
                shape,
                element_size,
                expected_len,
            })
        }
    }

    /// The region shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// The element size in bytes.
    #[must_use]
    pub const fn element_size(&self) -> usize {
        self.element_size
    }

    /// The number of elements.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// The bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Convert into the bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Copy the bytes to a vector of elements.
    ///
    /// # Errors
    /// Returns [`RegionBytesError::IncompatibleElementSize`] if the size of `T` does not match the element size.
    pub fn to_elements<T: bytemuck::Pod>(&self) -> Result<Vec<T>, RegionBytesError> {
        if size_of::<T>() == self.element_size {
            Ok(bytemuck::pod_collect_to_vec(&self.bytes))
        } else {
            Err(RegionBytesError::IncompatibleElementSize {
                element_type_size: size_of::<T>(),
                element_size: self.element_size,
            })
        }
    }
}
