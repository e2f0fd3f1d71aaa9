//! The geometry of an array partitioned into blocks.

use thiserror::Error;

use crate::{ArrayShape, IncompatibleDimensionalityError, NormalizedShape, DEFAULT_MAX_RANK};

/// An invalid shape or block shape.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ShapeError {
    /// The rank is zero or exceeds the supported maximum.
    #[error("invalid rank {rank}, expected 1 to {max_rank} axes")]
    InvalidRank { rank: usize, max_rank: usize },
    /// The shape has a zero extent.
    #[error("invalid shape {0:?}, all extents must be nonzero")]
    InvalidShape(ArrayShape),
    /// A block extent is zero or exceeds its axis extent.
    #[error("invalid block shape {block_shape:?} for shape {shape:?}")]
    InvalidBlockShape {
        shape: ArrayShape,
        block_shape: ArrayShape,
    },
    /// The shape and block shape differ in dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// The shape is not a multiple of the block shape.
    #[error("shape {shape:?} is not a multiple of block shape {block_shape:?}")]
    UnalignedShape {
        shape: ArrayShape,
        block_shape: ArrayShape,
    },
    /// The number of elements of the padded shape exceeds [`u64::MAX`].
    #[error("shape {shape:?} padded to block shape {block_shape:?} has too many elements")]
    TooLarge {
        shape: ArrayShape,
        block_shape: ArrayShape,
    },
}

/// Check that `shape` and `block_shape` describe a valid partitioning with at most `max_rank` axes and return the padded shape.
///
/// # Errors
/// Returns a [`ShapeError`] if the rank is outside `1..=max_rank`, the dimensionalities differ, an extent is zero, a block extent exceeds its axis extent, or the padded shape has more than [`u64::MAX`] elements.
pub(crate) fn validate_partition(
    shape: &[u64],
    block_shape: &[u64],
    max_rank: usize,
) -> Result<ArrayShape, ShapeError> {
    if shape.is_empty() || shape.len() > max_rank {
        return Err(ShapeError::InvalidRank {
            rank: shape.len(),
            max_rank,
        });
    }
    if block_shape.len() != shape.len() {
        return Err(IncompatibleDimensionalityError::new(block_shape.len(), shape.len()).into());
    }
    if shape.contains(&0) {
        return Err(ShapeError::InvalidShape(shape.to_vec()));
    }
    if std::iter::zip(shape, block_shape).any(|(&s, &b)| b == 0 || b > s) {
        return Err(ShapeError::InvalidBlockShape {
            shape: shape.to_vec(),
            block_shape: block_shape.to_vec(),
        });
    }

    // every element count of the partition is bounded by the padded element count
    let too_large = || ShapeError::TooLarge {
        shape: shape.to_vec(),
        block_shape: block_shape.to_vec(),
    };
    let padded_shape = std::iter::zip(shape, block_shape)
        .map(|(&s, &b)| padded_extent(s, b))
        .collect::<Option<ArrayShape>>()
        .ok_or_else(too_large)?;
    padded_shape
        .iter()
        .try_fold(1u64, |acc, &extent| acc.checked_mul(extent))
        .ok_or_else(too_large)?;
    Ok(padded_shape)
}

/// Round `extent` up to a multiple of `block`.
///
/// Returns [`None`] if `block` is zero or the padded extent exceeds [`u64::MAX`].
#[must_use]
pub const fn padded_extent(extent: u64, block: u64) -> Option<u64> {
    extent.checked_next_multiple_of(block)
}

/// Round `extent` down to a multiple of `block`.
#[must_use]
pub const fn trimmed_extent(extent: u64, block: u64) -> u64 {
    extent - extent % block
}

/// A validated array shape and block shape.
///
/// The array is logically padded along each axis to a multiple of the block extent.
/// The *trimmed* shape is the region covered by complete blocks of the unpadded shape:
/// ```text
/// shape = [5, 5], block_shape = [2, 2]
///
///   x x | x x | x .      padded shape  = [6, 6]
///   x x | x x | x .      trimmed shape = [4, 4]
///   ----+-----+----      grid shape    = [2, 2]
///   x x | x x | x .
///   x x | x x | x .
///   ----+-----+----
///   x x   x x   x .
///   . .   . .   . .
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartitionShape {
    shape: ArrayShape,
    block_shape: ArrayShape,
    padded_shape: ArrayShape,
}

impl PartitionShape {
    /// Create a new partition shape.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if the rank is outside `1..=`[`DEFAULT_MAX_RANK`], the dimensionalities differ, an extent is zero, a block extent exceeds its axis extent, or the padded shape has more than [`u64::MAX`] elements.
    pub fn new(shape: ArrayShape, block_shape: ArrayShape) -> Result<Self, ShapeError> {
        let padded_shape = validate_partition(&shape, &block_shape, DEFAULT_MAX_RANK)?;
        Ok(Self {
            shape,
            block_shape,
            padded_shape,
        })
    }

    /// The array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// The block shape.
    #[must_use]
    pub fn block_shape(&self) -> &[u64] {
        &self.block_shape
    }

    /// The number of axes.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Returns true if every axis extent is a multiple of its block extent.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        std::iter::zip(&self.shape, &self.block_shape).all(|(s, b)| s % b == 0)
    }

    /// The shape rounded up to a multiple of the block shape.
    #[must_use]
    pub fn padded_shape(&self) -> ArrayShape {
        self.padded_shape.clone()
    }

    /// The shape rounded down to a multiple of the block shape.
    #[must_use]
    pub fn trimmed_shape(&self) -> ArrayShape {
        std::iter::zip(&self.shape, &self.block_shape)
            .map(|(&s, &b)| trimmed_extent(s, b))
            .collect()
    }

    /// The number of complete blocks along each axis.
    #[must_use]
    pub fn grid_shape(&self) -> ArrayShape {
        std::iter::zip(&self.shape, &self.block_shape)
            .map(|(&s, &b)| s / b)
            .collect()
    }

    /// The number of elements in the array.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// The number of elements in the padded array.
    #[must_use]
    pub fn num_elements_padded(&self) -> u64 {
        self.padded_shape.iter().product()
    }

    /// The number of elements in a block.
    #[must_use]
    pub fn block_num_elements(&self) -> u64 {
        self.block_shape.iter().product()
    }

    /// The number of complete blocks.
    #[must_use]
    pub fn num_blocks(&self) -> u64 {
        self.grid_shape().iter().product()
    }

    /// Right-align the shape and block shape into `R` axis slots.
    ///
    /// # Errors
    /// Returns [`ShapeError::InvalidRank`] if the dimensionality exceeds `R`.
    pub fn normalize<const R: usize>(&self) -> Result<NormalizedShape<R>, ShapeError> {
        NormalizedShape::<R>::new(&self.shape, &self.block_shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_shape_ragged() {
        let partition = PartitionShape::new(vec![5, 5], vec![2, 2]).unwrap();
        assert!(!partition.is_exact());
        assert_eq!(partition.padded_shape(), vec![6, 6]);
        assert_eq!(partition.trimmed_shape(), vec![4, 4]);
        assert_eq!(partition.grid_shape(), vec![2, 2]);
        assert_eq!(partition.num_elements_padded(), 36);
        assert_eq!(partition.block_num_elements(), 4);
        assert_eq!(partition.num_blocks(), 4);
    }

    #[test]
    fn partition_shape_exact() {
        let partition = PartitionShape::new(vec![4, 6, 3], vec![2, 3, 3]).unwrap();
        assert!(partition.is_exact());
        assert_eq!(partition.padded_shape(), partition.shape());
        assert_eq!(partition.trimmed_shape(), partition.shape());
        assert_eq!(partition.grid_shape(), vec![2, 2, 1]);
    }

    #[test]
    fn partition_shape_invalid() {
        assert_eq!(
            PartitionShape::new(vec![], vec![]),
            Err(ShapeError::InvalidRank {
                rank: 0,
                max_rank: DEFAULT_MAX_RANK
            })
        );
        assert!(matches!(
            PartitionShape::new(vec![2; 9], vec![1; 9]),
            Err(ShapeError::InvalidRank { rank: 9, .. })
        ));
        assert!(matches!(
            PartitionShape::new(vec![4, 4], vec![2]),
            Err(ShapeError::IncompatibleDimensionality(_))
        ));
        assert!(matches!(
            PartitionShape::new(vec![4, 0], vec![2, 1]),
            Err(ShapeError::InvalidShape(_))
        ));
        assert!(matches!(
            PartitionShape::new(vec![4, 4], vec![2, 0]),
            Err(ShapeError::InvalidBlockShape { .. })
        ));
        assert!(matches!(
            PartitionShape::new(vec![4, 4], vec![2, 5]),
            Err(ShapeError::InvalidBlockShape { .. })
        ));
    }

    #[test]
    fn partition_shape_too_large() {
        assert!(matches!(
            PartitionShape::new(vec![u64::MAX], vec![2]),
            Err(ShapeError::TooLarge { .. })
        ));
        assert!(matches!(
            PartitionShape::new(vec![1 << 40, 1 << 40], vec![1, 1]),
            Err(ShapeError::TooLarge { .. })
        ));
        assert!(matches!(
            PartitionShape::new(vec![1 << 32, (1 << 32) - 1], vec![1, 2]),
            Err(ShapeError::TooLarge { .. })
        ));
        let partition = PartitionShape::new(vec![1 << 32, (1 << 31) - 1], vec![1, 2]).unwrap();
        assert_eq!(partition.num_elements_padded(), 1 << 63);
        assert_eq!(partition.num_blocks(), (1 << 32) * ((1 << 30) - 1));
    }

    #[test]
    fn extents() {
        assert_eq!(padded_extent(5, 2), Some(6));
        assert_eq!(padded_extent(6, 3), Some(6));
        assert_eq!(padded_extent(u64::MAX, 2), None);
        assert_eq!(padded_extent(u64::MAX, u64::MAX), Some(u64::MAX));
        assert_eq!(padded_extent(3, 0), None);
        assert_eq!(trimmed_extent(5, 2), 4);
        assert_eq!(trimmed_extent(7, 7), 7);
    }
}
