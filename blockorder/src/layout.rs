//! The partition layout engine.
//!
//! Permutes an array between its *natural* (row-major) layout and a *block-interleaved* layout in which the elements of every block are contiguous.
//! Both layouts are addressed over the padded shape (see [`PartitionShape::padded_shape`](crate::grid::PartitionShape::padded_shape)).
//!
//! If every axis extent is a multiple of its block extent, the [`LayoutPath::Exact`] path interleaves the whole array.
//! Otherwise the [`LayoutPath::General`] path interleaves the *aligned* elements, those inside the complete blocks of every axis, and leaves the elements of each axis remainder in place:
//! ```text
//! shape = [5, 5], block_shape = [2, 2], padded shape = [6, 6]
//!
//! natural                    block-interleaved
//!  0  1  2  3  4  5           0  1  6  7  4  5
//!  6  7  8  9 10 11           2  3  8  9 10 11
//! 12 13 14 15 16 17          12 13 18 19 16 17
//! 18 19 20 21 22 23          14 15 20 21 22 23
//! 24 25 26 27 28 29          24 25 26 27 28 29
//! 30 31 32 33 34 35          30 31 32 33 34 35
//! ```
//! The aligned positions, taken in natural order, hold the blocks one after another.

use blockorder_grid::{ArraySubset, ArraySubsetError, NormalizedShape, ShapeError, DEFAULT_MAX_RANK};
use derive_more::Display;
use thiserror::Error;

/// The direction of a layout transform.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum Direction {
    /// Natural layout to block-interleaved layout.
    #[display("forward")]
    Forward,
    /// Block-interleaved layout to natural layout.
    #[display("inverse")]
    Inverse,
}

impl Direction {
    /// Create a direction from an `inverse` flag.
    #[must_use]
    pub const fn from_inverse(inverse: bool) -> Self {
        if inverse {
            Self::Inverse
        } else {
            Self::Forward
        }
    }

    /// Returns true for [`Direction::Inverse`].
    #[must_use]
    pub const fn is_inverse(self) -> bool {
        matches!(self, Self::Inverse)
    }
}

/// The path taken by a layout transform.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum LayoutPath {
    /// Every axis extent is a multiple of its block extent.
    #[display("exact")]
    Exact,
    /// At least one axis has a remainder.
    #[display("general")]
    General,
}

impl LayoutPath {
    /// Returns true for [`LayoutPath::Exact`].
    #[must_use]
    pub const fn is_exact(self) -> bool {
        matches!(self, Self::Exact)
    }
}

/// A layout error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Invalid shape or block shape.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// An invalid array subset.
    #[error(transparent)]
    ArraySubset(#[from] ArraySubsetError),
    /// The element size is zero.
    #[error("the element size must be nonzero")]
    InvalidElementSize,
    /// A buffer does not hold the expected number of bytes.
    #[error("buffer of {len} bytes does not match the expected {expected} bytes")]
    InvalidBufferLength {
        /// The buffer length.
        len: usize,
        /// The expected buffer length.
        expected: u64,
    },
    /// The padded array cannot be addressed on this platform.
    #[error("padded array of {0} elements is too large to address")]
    TooLarge(u64),
}

/// The partition layout of a shape and block shape with at most `R` axes.
///
/// A layout is computed once and can be applied to any number of buffers with [`transform`](PartitionLayout::transform).
#[derive(Clone, Debug)]
pub struct PartitionLayout<const R: usize = DEFAULT_MAX_RANK> {
    normalized: NormalizedShape<R>,
    num_elements_padded: usize,
    num_elements_aligned: usize,
    /// Elements copied per step, the block extent of the fastest axis.
    run_length: usize,
    /// (extent, stride) of each block grid and intra-block axis, slowest first, excluding the fastest intra-block axis.
    digits: Vec<(usize, usize)>,
    /// (start, length) of the aligned elements in the padded natural layout.
    aligned_runs: Vec<(usize, usize)>,
    /// (start, length) of the remaining elements in the padded natural layout.
    remainder_runs: Vec<(usize, usize)>,
}

fn checked_usize(value: u64, num_elements: u64) -> Result<usize, LayoutError> {
    usize::try_from(value).map_err(|_| LayoutError::TooLarge(num_elements))
}

impl<const R: usize> PartitionLayout<R> {
    /// Create a new partition layout.
    ///
    /// # Errors
    /// Returns a [`LayoutError`] if the shape or block shape is invalid or the padded array is too large to address.
    pub fn new(shape: &[u64], block_shape: &[u64]) -> Result<Self, LayoutError> {
        let normalized = NormalizedShape::<R>::new(shape, block_shape)?;
        let padded = normalized.padded_shape();
        let trimmed = normalized.trimmed_shape();
        let grid = normalized.grid_shape();
        let block = normalized.block_shape();

        let num_elements_padded = padded
            .iter()
            .try_fold(1u64, |acc, &extent| acc.checked_mul(extent))
            .ok_or(LayoutError::TooLarge(u64::MAX))?;
        let num_elements_padded_usize = checked_usize(num_elements_padded, num_elements_padded)?;
        let to_usize = |value: u64| checked_usize(value, num_elements_padded);

        let mut strides = [1u64; R];
        for axis in (0..R.saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * padded[axis + 1];
        }

        let mut digits = Vec::with_capacity(2 * R);
        for axis in 0..R {
            if grid[axis] > 1 {
                digits.push((to_usize(grid[axis])?, to_usize(block[axis] * strides[axis])?));
            }
        }
        for axis in 0..R.saturating_sub(1) {
            if block[axis] > 1 {
                digits.push((to_usize(block[axis])?, to_usize(strides[axis])?));
            }
        }

        let aligned_runs = ArraySubset::new_with_shape(trimmed.to_vec())
            .contiguous_linearised_indices(&padded)?
            .iter()
            .map(|(start, length)| Ok((to_usize(start)?, to_usize(length)?)))
            .collect::<Result<Vec<_>, LayoutError>>()?;
        let mut remainder_runs = Vec::new();
        let mut end = 0;
        for &(start, length) in &aligned_runs {
            if start > end {
                remainder_runs.push((end, start - end));
            }
            end = start + length;
        }
        if num_elements_padded_usize > end {
            remainder_runs.push((end, num_elements_padded_usize - end));
        }

        Ok(Self {
            normalized,
            num_elements_padded: num_elements_padded_usize,
            num_elements_aligned: aligned_runs.iter().map(|(_, length)| length).sum(),
            run_length: to_usize(block[R - 1])?,
            digits,
            aligned_runs,
            remainder_runs,
        })
    }

    /// The normalized shape and block shape.
    #[must_use]
    pub const fn normalized(&self) -> &NormalizedShape<R> {
        &self.normalized
    }

    /// The path taken by [`transform`](PartitionLayout::transform).
    #[must_use]
    pub fn path(&self) -> LayoutPath {
        if self.normalized.is_exact() {
            LayoutPath::Exact
        } else {
            LayoutPath::General
        }
    }

    /// The number of elements in the padded array.
    #[must_use]
    pub const fn num_elements_padded(&self) -> usize {
        self.num_elements_padded
    }

    /// The number of elements inside complete blocks.
    #[must_use]
    pub const fn num_elements_aligned(&self) -> usize {
        self.num_elements_aligned
    }

    /// The number of elements outside of complete blocks, including padding.
    #[must_use]
    pub const fn num_elements_remainder(&self) -> usize {
        self.num_elements_padded - self.num_elements_aligned
    }

    /// Visit every run of `run_length` elements as (block-interleaved position, natural position) pairs in block-interleaved order.
    fn for_each_run(&self, mut f: impl FnMut(usize, usize)) {
        let num_runs = self.num_elements_aligned / self.run_length;
        let mut counters = vec![0; self.digits.len()];
        let mut aligned_runs = self.aligned_runs.iter().copied();
        let mut natural = 0;
        let (mut interleaved, mut remaining) = (0, 0);
        for _ in 0..num_runs {
            if remaining == 0 {
                // aligned run lengths are multiples of the run length
                let Some((start, length)) = aligned_runs.next() else {
                    break;
                };
                (interleaved, remaining) = (start, length);
            }
            f(interleaved, natural);
            interleaved += self.run_length;
            remaining -= self.run_length;

            for (counter, &(extent, stride)) in
                std::iter::zip(counters.iter_mut(), &self.digits).rev()
            {
                *counter += 1;
                natural += stride;
                if *counter < extent {
                    break;
                }
                natural -= stride * extent;
                *counter = 0;
            }
        }
    }

    fn validate_buffer(&self, len: usize, element_size: usize) -> Result<(), LayoutError> {
        self.validate_length(len, self.num_elements_padded, element_size)
    }

    fn validate_length(
        &self,
        len: usize,
        num_elements: usize,
        element_size: usize,
    ) -> Result<(), LayoutError> {
        if element_size == 0 {
            return Err(LayoutError::InvalidElementSize);
        }
        let expected = num_elements
            .checked_mul(element_size)
            .ok_or(LayoutError::TooLarge(self.num_elements_padded as u64))?;
        if len == expected {
            Ok(())
        } else {
            Err(LayoutError::InvalidBufferLength {
                len,
                expected: expected as u64,
            })
        }
    }

    fn permute(
        &self,
        src: &[u8],
        dest: &mut [u8],
        element_size: usize,
        direction: Direction,
        handle_remainder: bool,
    ) {
        if handle_remainder {
            for &(start, length) in &self.remainder_runs {
                let bytes = start * element_size..(start + length) * element_size;
                dest[bytes.clone()].copy_from_slice(&src[bytes]);
            }
        }
        let run_bytes = self.run_length * element_size;
        self.for_each_run(|interleaved, natural| {
            let interleaved = interleaved * element_size;
            let natural = natural * element_size;
            match direction {
                Direction::Forward => dest[interleaved..interleaved + run_bytes]
                    .copy_from_slice(&src[natural..natural + run_bytes]),
                Direction::Inverse => dest[natural..natural + run_bytes]
                    .copy_from_slice(&src[interleaved..interleaved + run_bytes]),
            }
        });
    }

    /// Transform `src` into `dest` in `direction`.
    ///
    /// `src` and `dest` must both hold `element_size` bytes for every element of the padded array.
    /// Returns the [`LayoutPath`] taken.
    ///
    /// # Errors
    /// Returns a [`LayoutError`] if `element_size` is zero or a buffer has an unexpected length.
    /// Nothing is written to `dest` on error.
    pub fn transform(
        &self,
        src: &[u8],
        dest: &mut [u8],
        element_size: usize,
        direction: Direction,
    ) -> Result<LayoutPath, LayoutError> {
        self.validate_buffer(src.len(), element_size)?;
        self.validate_buffer(dest.len(), element_size)?;
        let path = self.path();
        log::debug!(
            "{direction} layout transform of shape {:?} with block shape {:?} using the {path} path",
            self.normalized.to_shape(),
            self.normalized.to_block_shape(),
        );
        self.permute(src, dest, element_size, direction, !path.is_exact());
        Ok(path)
    }

    /// Transform the elements of `src` into `dest` in `direction`.
    ///
    /// # Errors
    /// Returns a [`LayoutError`] if `T` is zero sized or a buffer has an unexpected length.
    pub fn transform_elements<T: bytemuck::Pod>(
        &self,
        src: &[T],
        dest: &mut [T],
        direction: Direction,
    ) -> Result<LayoutPath, LayoutError> {
        let element_size = size_of::<T>();
        if element_size == 0 {
            return Err(LayoutError::InvalidElementSize);
        }
        self.transform(
            bytemuck::cast_slice(src),
            bytemuck::cast_slice_mut(dest),
            element_size,
            direction,
        )
    }

    fn gather(
        &self,
        runs: &[(usize, usize)],
        num_elements: usize,
        buffer: &[u8],
        element_size: usize,
    ) -> Result<Vec<u8>, LayoutError> {
        self.validate_buffer(buffer.len(), element_size)?;
        let mut out = Vec::with_capacity(num_elements * element_size);
        for &(start, length) in runs {
            out.extend_from_slice(&buffer[start * element_size..(start + length) * element_size]);
        }
        Ok(out)
    }

    fn scatter(
        &self,
        runs: &[(usize, usize)],
        num_elements: usize,
        elements: &[u8],
        buffer: &mut [u8],
        element_size: usize,
    ) -> Result<(), LayoutError> {
        self.validate_buffer(buffer.len(), element_size)?;
        self.validate_length(elements.len(), num_elements, element_size)?;
        let mut offset = 0;
        for &(start, length) in runs {
            let bytes = length * element_size;
            buffer[start * element_size..start * element_size + bytes]
                .copy_from_slice(&elements[offset..offset + bytes]);
            offset += bytes;
        }
        Ok(())
    }

    /// Gather the aligned elements of a padded `buffer` in natural order.
    ///
    /// For a block-interleaved `buffer` this is the sequence of complete blocks.
    ///
    /// # Errors
    /// Returns a [`LayoutError`] if `buffer` has an unexpected length.
    pub fn gather_aligned(&self, buffer: &[u8], element_size: usize) -> Result<Vec<u8>, LayoutError> {
        self.gather(
            &self.aligned_runs,
            self.num_elements_aligned,
            buffer,
            element_size,
        )
    }

    /// Scatter `elements` to the aligned elements of a padded `buffer`. The inverse of [`gather_aligned`](PartitionLayout::gather_aligned).
    ///
    /// # Errors
    /// Returns a [`LayoutError`] if `elements` or `buffer` has an unexpected length.
    pub fn scatter_aligned(
        &self,
        elements: &[u8],
        buffer: &mut [u8],
        element_size: usize,
    ) -> Result<(), LayoutError> {
        self.scatter(
            &self.aligned_runs,
            self.num_elements_aligned,
            elements,
            buffer,
            element_size,
        )
    }

    /// Gather the elements of a padded `buffer` outside of complete blocks in natural order.
    ///
    /// # Errors
    /// Returns a [`LayoutError`] if `buffer` has an unexpected length.
    pub fn gather_remainder(
        &self,
        buffer: &[u8],
        element_size: usize,
    ) -> Result<Vec<u8>, LayoutError> {
        self.gather(
            &self.remainder_runs,
            self.num_elements_remainder(),
            buffer,
            element_size,
        )
    }

    /// Scatter `elements` to the elements of a padded `buffer` outside of complete blocks. The inverse of [`gather_remainder`](PartitionLayout::gather_remainder).
    ///
    /// # Errors
    /// Returns a [`LayoutError`] if `elements` or `buffer` has an unexpected length.
    pub fn scatter_remainder(
        &self,
        elements: &[u8],
        buffer: &mut [u8],
        element_size: usize,
    ) -> Result<(), LayoutError> {
        self.scatter(
            &self.remainder_runs,
            self.num_elements_remainder(),
            elements,
            buffer,
            element_size,
        )
    }
}

/// Transform a padded array between the natural and block-interleaved layouts.
///
/// `src` and `dest` must both hold `element_size` bytes for every element of the padded array.
/// Returns the [`LayoutPath`] taken, [`LayoutPath::Exact`] if and only if every extent of `shape` is a multiple of its extent in `block_shape`.
///
/// # Errors
/// Returns a [`LayoutError`] if the rank is zero or exceeds [`DEFAULT_MAX_RANK`], a block extent is zero or exceeds its axis extent, `element_size` is zero, or a buffer has an unexpected length.
/// Nothing is written to `dest` on error.
pub fn transform(
    src: &[u8],
    dest: &mut [u8],
    element_size: usize,
    block_shape: &[u64],
    shape: &[u64],
    direction: Direction,
) -> Result<LayoutPath, LayoutError> {
    PartitionLayout::<DEFAULT_MAX_RANK>::new(shape, block_shape)?.transform(
        src,
        dest,
        element_size,
        direction,
    )
}

/// Transform a padded array of elements between the natural and block-interleaved layouts.
///
/// See [`transform`].
///
/// # Errors
/// Returns a [`LayoutError`] if the partitioning is invalid, `T` is zero sized, or a buffer has an unexpected length.
pub fn transform_elements<T: bytemuck::Pod>(
    src: &[T],
    dest: &mut [T],
    block_shape: &[u64],
    shape: &[u64],
    direction: Direction,
) -> Result<LayoutPath, LayoutError> {
    PartitionLayout::<DEFAULT_MAX_RANK>::new(shape, block_shape)?
        .transform_elements(src, dest, direction)
}
