//! Fixed-rank representations of a shape and block shape.

use std::ops::Range;

use crate::partition_shape::{trimmed_extent, validate_partition};
use crate::ShapeError;

/// The default maximum number of axes of a [`NormalizedShape`].
pub const DEFAULT_MAX_RANK: usize = 8;

/// A shape and block shape right-aligned into `R` axis slots.
///
/// For a rank `r` shape, slot `R - r + i` holds axis `i` and the leading `R - r` slots hold 1.
/// Identity axes do not change the row-major linearisation, so every downstream computation can iterate over a constant number of axes.
/// ```text
/// shape       = [5, 6]        -> [1, 1, 1, 1, 1, 1, 5, 6]
/// block_shape = [2, 3]        -> [1, 1, 1, 1, 1, 1, 2, 3]
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NormalizedShape<const R: usize = DEFAULT_MAX_RANK> {
    shape: [u64; R],
    block_shape: [u64; R],
    padded_shape: [u64; R],
    rank: usize,
}

/// Right-align `shape` and `block_shape` into [`DEFAULT_MAX_RANK`] axis slots.
///
/// # Errors
/// Returns [`ShapeError::InvalidRank`] if the rank is zero or exceeds [`DEFAULT_MAX_RANK`], [`ShapeError::InvalidBlockShape`] if any block extent is zero or exceeds its axis extent, or [`ShapeError::TooLarge`] if the padded shape has more than [`u64::MAX`] elements.
pub fn normalize(shape: &[u64], block_shape: &[u64]) -> Result<NormalizedShape, ShapeError> {
    NormalizedShape::new(shape, block_shape)
}

impl<const R: usize> NormalizedShape<R> {
    /// Create a new normalized shape.
    ///
    /// # Errors
    /// Returns [`ShapeError::InvalidRank`] if the rank is zero or exceeds `R`, [`ShapeError::InvalidBlockShape`] if any block extent is zero or exceeds its axis extent, or [`ShapeError::TooLarge`] if the padded shape has more than [`u64::MAX`] elements.
    pub fn new(shape: &[u64], block_shape: &[u64]) -> Result<Self, ShapeError> {
        let padded_shape = validate_partition(shape, block_shape, R)?;
        let rank = shape.len();
        let mut shape_slots = [1; R];
        let mut block_slots = [1; R];
        let mut padded_slots = [1; R];
        shape_slots[R - rank..].copy_from_slice(shape);
        block_slots[R - rank..].copy_from_slice(block_shape);
        padded_slots[R - rank..].copy_from_slice(&padded_shape);
        Ok(Self {
            shape: shape_slots,
            block_shape: block_slots,
            padded_shape: padded_slots,
            rank,
        })
    }

    /// The number of slots.
    #[must_use]
    pub const fn max_rank() -> usize {
        R
    }

    /// The rank of the shape before normalisation.
    #[must_use]
    pub const fn rank(&self) -> usize {
        self.rank
    }

    /// The slots occupied by the axes of the shape.
    #[must_use]
    pub const fn occupied(&self) -> Range<usize> {
        R - self.rank..R
    }

    /// The normalized shape.
    #[must_use]
    pub const fn shape(&self) -> &[u64; R] {
        &self.shape
    }

    /// The normalized block shape.
    #[must_use]
    pub const fn block_shape(&self) -> &[u64; R] {
        &self.block_shape
    }

    /// The normalized shape rounded up to a multiple of the block shape.
    #[must_use]
    pub const fn padded_shape(&self) -> [u64; R] {
        self.padded_shape
    }

    /// The normalized shape rounded down to a multiple of the block shape.
    #[must_use]
    pub fn trimmed_shape(&self) -> [u64; R] {
        std::array::from_fn(|i| trimmed_extent(self.shape[i], self.block_shape[i]))
    }

    /// The number of complete blocks along each slot.
    #[must_use]
    pub fn grid_shape(&self) -> [u64; R] {
        std::array::from_fn(|i| self.shape[i] / self.block_shape[i])
    }

    /// Returns true if every extent is a multiple of its block extent.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        std::iter::zip(&self.shape, &self.block_shape).all(|(s, b)| s % b == 0)
    }

    /// The shape without the leading unit slots.
    #[must_use]
    pub fn to_shape(&self) -> Vec<u64> {
        self.shape[self.occupied()].to_vec()
    }

    /// The block shape without the leading unit slots.
    #[must_use]
    pub fn to_block_shape(&self) -> Vec<u64> {
        self.block_shape[self.occupied()].to_vec()
    }
}
