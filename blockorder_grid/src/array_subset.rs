//! Array subsets.
//!
//! An [`ArraySubset`] represents a rectangular subset of an array, a block, or a block grid.
//!
//! [`iterators`](crate::iterators) includes the [`ArraySubset`] iterators.

use std::fmt::{Debug, Display};
use std::ops::Range;

use thiserror::Error;

use crate::iterators::{ContiguousLinearisedIndices, Indices};
use crate::{ArrayIndices, ArrayShape, IncompatibleDimensionalityError};

/// An array subset error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ArraySubsetError {
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// Incompatible start and shape.
    #[error("incompatible start {start:?} with shape {shape:?}")]
    IncompatibleStartShape {
        start: ArrayIndices,
        shape: ArrayShape,
    },
    /// The subset extends beyond the array shape.
    #[error("subset ending at {end:?} is out of bounds of array shape {array_shape:?}")]
    OutOfBounds {
        end: ArrayIndices,
        array_shape: ArrayShape,
    },
}

/// An array subset.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct ArraySubset {
    /// The start of the array subset.
    pub(crate) start: ArrayIndices,
    /// The shape of the array subset.
    pub(crate) shape: ArrayShape,
}

impl Display for ArraySubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_ranges().fmt(f)
    }
}

impl<T: IntoIterator<Item = Range<u64>>> From<T> for ArraySubset {
    fn from(ranges: T) -> Self {
        let (start, shape) = ranges
            .into_iter()
            .map(|range| (range.start, range.end.saturating_sub(range.start)))
            .unzip();
        Self { start, shape }
    }
}

impl ArraySubset {
    /// Create a new array subset from a list of [`Range`]s.
    #[must_use]
    pub fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        Self::from(ranges.iter().cloned())
    }

    /// Create a new array subset with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset.
    ///
    /// # Errors
    /// Returns [`ArraySubsetError`] if the size of `start` and `shape` do not match.
    pub fn new_with_start_shape(
        start: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, ArraySubsetError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(ArraySubsetError::IncompatibleStartShape { start, shape })
        }
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the exclusive end of the array subset.
    #[must_use]
    pub fn end_exc(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start + size)
            .collect()
    }

    /// Return the array subset as a list of [`Range`]s.
    #[must_use]
    pub fn to_ranges(&self) -> Vec<Range<u64>> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(&start, &size)| start..start + size)
            .collect()
    }

    /// Returns if the array subset is empty (i.e. has a zero element in its shape).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the number of elements of the array subset.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Returns true if the array subset is within the bounds of `array_shape`.
    #[must_use]
    pub fn inbounds_shape(&self, array_shape: &[u64]) -> bool {
        self.dimensionality() == array_shape.len()
            && std::iter::zip(self.end_exc(), array_shape).all(|(end, &shape)| end <= shape)
    }

    /// Returns an iterator over the indices of elements within the subset.
    #[must_use]
    pub fn indices(&self) -> Indices {
        Indices::new(self.clone())
    }

    /// Returns an iterator over the linearised indices of contiguous elements within the subset.
    ///
    /// # Errors
    /// Returns [`ArraySubsetError`] if the `array_shape` does not encapsulate this array subset.
    pub fn contiguous_linearised_indices(
        &self,
        array_shape: &[u64],
    ) -> Result<ContiguousLinearisedIndices, ArraySubsetError> {
        ContiguousLinearisedIndices::new(self.clone(), array_shape.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_subset() {
        assert!(ArraySubset::new_with_start_shape(vec![0, 0], vec![10, 10]).is_ok());
        assert!(ArraySubset::new_with_start_shape(vec![0, 0], vec![10]).is_err());

        let array_subset = ArraySubset::new_with_ranges(&[1..5, 2..6]);
        assert_eq!(array_subset.start(), &[1, 2]);
        assert_eq!(array_subset.shape(), &[4, 4]);
        assert_eq!(array_subset.end_exc(), vec![5, 6]);
        assert_eq!(array_subset.num_elements(), 16);
        assert_eq!(array_subset.to_ranges(), vec![1..5, 2..6]);
        assert_eq!(array_subset.to_string(), "[1..5, 2..6]");
        assert!(!array_subset.is_empty());
        assert!(array_subset.inbounds_shape(&[10, 10]));
        assert!(!array_subset.inbounds_shape(&[2, 2]));
        assert!(!array_subset.inbounds_shape(&[10, 10, 10]));

        assert!(ArraySubset::new_with_ranges(&[1..1, 0..2]).is_empty());
    }
}
