//! Partition geometry, chunk indexing and region resolution for the [`blockorder`](https://docs.rs/blockorder/latest/blockorder/index.html) crate.
//!
//! An N-dimensional array with a row-major `shape` is partitioned into blocks of `block_shape`.
//! This crate provides:
//!  - [`NormalizedShape`]: a shape and block shape right-aligned into a fixed number of axis slots,
//!  - [`PartitionShape`]: the padded, trimmed and block grid shapes of a partitioning,
//!  - [`ChunkMap`]: a mapping from block grid keys to sequential [`ChunkId`]s,
//!  - [`RegionSelector`] and [`resolve`]: the blocks (and their chunks) overlapping a region of the array,
//!  - [`ArraySubset`] and [`iterators`]: rectangular subsets and the iterators used to walk them.
//!
//! ## Licence
//! `blockorder_grid` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.

mod array_subset;
pub use array_subset::{ArraySubset, ArraySubsetError};

mod normalized_shape;
pub use normalized_shape::{normalize, NormalizedShape, DEFAULT_MAX_RANK};

mod partition_shape;
pub use partition_shape::{padded_extent, trimmed_extent, PartitionShape, ShapeError};

mod chunk_map;
pub use chunk_map::{build_index, ChunkId, ChunkMap};

mod region_selector;
pub use region_selector::{AxisSelector, RegionSelector};

mod resolver;
pub use resolver::{resolve, BlockCoordinate, ResolveError, ResolvedBlocks};

pub mod iterators;

/// The shape of an array (i.e. the number of elements along each axis).
pub type ArrayShape = Vec<u64>;

/// An ND index to an element in an array or block.
pub type ArrayIndices = Vec<u64>;

/// An ND index to an element in an array or block.
/// Uses [`TinyVec`](tinyvec::TinyVec) for stack allocation up to 4 dimensions.
pub type ArrayIndicesTinyVec = tinyvec::TinyVec<[u64; 4]>;

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }

    /// The dimensionality that was supplied.
    #[must_use]
    pub const fn got(&self) -> usize {
        self.0
    }

    /// The dimensionality that was expected.
    #[must_use]
    pub const fn expected(&self) -> usize {
        self.1
    }
}

/// Ravel ND indices to a linearised index.
///
/// Returns [`None`] if any `indices` are out-of-bounds of `shape` or the dimensionality differs.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> Option<u64> {
    if indices.len() != shape.len() {
        return None;
    }
    let mut index: u64 = 0;
    let mut count = 1;
    for (i, s) in std::iter::zip(indices, shape).rev() {
        if i >= s {
            return None;
        }
        index += i * count;
        count *= s;
    }
    Some(index)
}

/// Unravel a linearised index to ND indices.
///
/// Returns [`None`] if `index` is out-of-bounds of `shape`.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> Option<ArrayIndicesTinyVec> {
    let total_size: u64 = shape
        .iter()
        .try_fold(1u64, |acc, &dim| acc.checked_mul(dim))?;
    if index >= total_size {
        return None;
    }

    let mut indices: ArrayIndicesTinyVec = std::iter::repeat_n(0, shape.len()).collect();
    for (i, &s) in std::iter::zip(indices.iter_mut(), shape).rev() {
        *i = index % s;
        index /= s;
    }
    Some(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ravel_unravel() {
        //  0  1  2
        //  3  4  5
        assert_eq!(ravel_indices(&[1, 2], &[2, 3]), Some(5));
        assert_eq!(ravel_indices(&[0, 1], &[2, 3]), Some(1));
        assert_eq!(ravel_indices(&[2, 0], &[2, 3]), None);
        assert_eq!(ravel_indices(&[0], &[2, 3]), None);
        assert_eq!(unravel_index(5, &[2, 3]).unwrap().as_slice(), &[1, 2]);
        assert_eq!(unravel_index(6, &[2, 3]), None);
        assert_eq!(
            unravel_index(23, &[1, 2, 3, 4, 1]).unwrap().as_slice(),
            &[0, 1, 2, 3, 0]
        );
    }
}
