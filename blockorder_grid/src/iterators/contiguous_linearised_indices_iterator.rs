use std::iter::FusedIterator;

use crate::iterators::IndicesIntoIterator;
use crate::{
    ravel_indices, ArrayShape, ArraySubset, ArraySubsetError, IncompatibleDimensionalityError,
};

/// Iterates over contiguous linearised element indices in an array subset.
///
/// The iterator item is a tuple: (linearised index, # contiguous elements).
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
/// Trailing axes which the subset spans completely are merged into a single run.
/// For example, consider a 4x3 array with linearised element indices
/// ```text
/// 0   1   2
/// 3   4   5
/// 6   7   8
/// 9  10  11
/// ```
/// An iterator with an array subset covering the entire array will produce `[(0, 12)]`.
/// An iterator with an array subset corresponding to the lower right 2x2 region will produce `[(7, 2), (10, 2)]`.
#[derive(Clone, Debug)]
pub struct ContiguousLinearisedIndices {
    subset_contiguous_start: ArraySubset,
    contiguous_elements: u64,
    array_shape: ArrayShape,
}

impl ContiguousLinearisedIndices {
    /// Create a new contiguous linearised indices iterator.
    ///
    /// # Errors
    /// Returns [`ArraySubsetError`] if `array_shape` does not encapsulate `subset`.
    pub fn new(subset: ArraySubset, array_shape: ArrayShape) -> Result<Self, ArraySubsetError> {
        if subset.dimensionality() != array_shape.len() {
            return Err(IncompatibleDimensionalityError::new(
                subset.dimensionality(),
                array_shape.len(),
            )
            .into());
        }
        if !subset.inbounds_shape(&array_shape) {
            return Err(ArraySubsetError::OutOfBounds {
                end: subset.end_exc(),
                array_shape,
            });
        }

        let mut contiguous = true;
        let mut contiguous_elements = 1;
        let mut shape_out = vec![0; array_shape.len()];
        for (i, (&subset_start, &subset_size, &array_size)) in
            itertools::izip!(subset.start(), subset.shape(), &array_shape)
                .enumerate()
                .rev()
        {
            if contiguous {
                contiguous_elements *= subset_size;
                shape_out[i] = 1;
                contiguous = subset_start == 0 && subset_size == array_size;
            } else {
                shape_out[i] = subset_size;
            }
        }
        if subset.is_empty() {
            shape_out.fill(0);
        }
        let subset_contiguous_start =
            ArraySubset::new_with_start_shape(subset.start().to_vec(), shape_out)?;
        Ok(Self {
            subset_contiguous_start,
            contiguous_elements,
            array_shape,
        })
    }

    /// Return the number of contiguous runs (i.e. the length of the iterator).
    #[must_use]
    pub fn len(&self) -> usize {
        self.subset_contiguous_start.indices().len()
    }

    /// Returns true if there are no contiguous runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the number of contiguous elements (fixed on each iteration).
    #[must_use]
    pub fn contiguous_elements(&self) -> u64 {
        self.contiguous_elements
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> ContiguousLinearisedIndicesIterator<'_> {
        ContiguousLinearisedIndicesIterator {
            inner: self.subset_contiguous_start.indices().into_iter(),
            array_shape: &self.array_shape,
            contiguous_elements: self.contiguous_elements,
        }
    }
}

impl<'a> IntoIterator for &'a ContiguousLinearisedIndices {
    type Item = (u64, u64);
    type IntoIter = ContiguousLinearisedIndicesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Serial contiguous linearised indices iterator.
///
/// See [`ContiguousLinearisedIndices`].
pub struct ContiguousLinearisedIndicesIterator<'a> {
    inner: IndicesIntoIterator,
    array_shape: &'a [u64],
    contiguous_elements: u64,
}

impl Iterator for ContiguousLinearisedIndicesIterator<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.inner.next()?;
        // in bounds, checked on construction
        let index = ravel_indices(&indices, self.array_shape)?;
        Some((index, self.contiguous_elements))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ContiguousLinearisedIndicesIterator<'_> {}

impl FusedIterator for ContiguousLinearisedIndicesIterator<'_> {}
