//! Resolution of a region selector to the blocks it overlaps.

use std::iter::FusedIterator;

use derive_more::{Deref, From};
use thiserror::Error;

use crate::iterators::IndicesIntoIterator;
use crate::partition_shape::{trimmed_extent, validate_partition};
use crate::{
    ravel_indices, ArrayIndices, ArrayIndicesTinyVec, ArrayShape, ArraySubset, AxisSelector,
    ChunkId, ChunkMap, IncompatibleDimensionalityError, RegionSelector, ShapeError,
    DEFAULT_MAX_RANK,
};

/// A region resolution error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ResolveError {
    /// The selector dimensionality does not match the array.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// Invalid shape or block shape.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// A fixed index lies outside of the complete blocks of its axis.
    #[error("invalid selector index {index} on axis {axis}, the complete block extent is {extent}")]
    InvalidSelector { axis: usize, index: u64, extent: u64 },
    /// A resolved block is not in the chunk map.
    #[error("block {coordinate:?} with key {key} is not in the chunk map")]
    UnknownBlock { coordinate: ArrayIndices, key: u64 },
}

/// The coordinate of a block in the block grid.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deref, From)]
pub struct BlockCoordinate(ArrayIndicesTinyVec);

impl BlockCoordinate {
    /// The block grid indices.
    #[must_use]
    pub fn indices(&self) -> &[u64] {
        &self.0
    }

    /// The element indices of the first element of the block.
    #[must_use]
    pub fn origin(&self, block_shape: &[u64]) -> ArrayIndices {
        std::iter::zip(self.0.iter(), block_shape)
            .map(|(i, b)| i * b)
            .collect()
    }
}

/// Resolve the blocks overlapping `selector` and their chunk identifiers in `chunk_map`.
///
/// A fixed index selects the single block containing it.
/// A full range selects every complete block along its axis.
/// Blocks are produced in row-major block grid order.
///
/// # Errors
/// Returns a [`ResolveError`] if the partitioning is invalid, the selector dimensionality does not match `shape`, or a fixed index lies beyond the complete blocks of its axis.
/// The iterator yields [`ResolveError::UnknownBlock`] for a block absent from `chunk_map`.
pub fn resolve<'a>(
    selector: &RegionSelector,
    chunk_map: &'a ChunkMap,
    shape: &[u64],
    block_shape: &[u64],
) -> Result<ResolvedBlocks<'a>, ResolveError> {
    validate_partition(shape, block_shape, DEFAULT_MAX_RANK)?;
    if selector.dimensionality() != shape.len() {
        return Err(
            IncompatibleDimensionalityError::new(selector.dimensionality(), shape.len()).into(),
        );
    }

    let ranges = itertools::izip!(selector.axes(), shape, block_shape)
        .enumerate()
        .map(|(axis, (selector, &extent, &block))| {
            let extent = trimmed_extent(extent, block);
            match *selector {
                AxisSelector::Index(index) if index < extent => {
                    Ok(index / block..index / block + 1)
                }
                AxisSelector::Index(index) => Err(ResolveError::InvalidSelector {
                    axis,
                    index,
                    extent,
                }),
                AxisSelector::Full => Ok(0..extent / block),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    let grid_subset = ArraySubset::new_with_ranges(&ranges);
    let grid_shape: ArrayShape = std::iter::zip(shape, block_shape)
        .map(|(s, b)| s / b)
        .collect();

    Ok(ResolvedBlocks {
        inner: grid_subset.indices().into_iter(),
        grid_subset,
        grid_shape,
        chunk_map,
    })
}

/// An iterator over the blocks resolved from a [`RegionSelector`].
///
/// See [`resolve`].
#[derive(Clone, Debug)]
pub struct ResolvedBlocks<'a> {
    inner: IndicesIntoIterator,
    grid_subset: ArraySubset,
    grid_shape: ArrayShape,
    chunk_map: &'a ChunkMap,
}

impl ResolvedBlocks<'_> {
    /// The subset of the block grid covered by the resolved blocks.
    #[must_use]
    pub fn grid_subset(&self) -> &ArraySubset {
        &self.grid_subset
    }

    /// The number of complete blocks along each axis.
    #[must_use]
    pub fn grid_shape(&self) -> &[u64] {
        &self.grid_shape
    }
}

impl Iterator for ResolvedBlocks<'_> {
    type Item = Result<(BlockCoordinate, ChunkId), ResolveError>;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.inner.next()?;
        let key = ravel_indices(&indices, &self.grid_shape)?;
        Some(match self.chunk_map.get(key) {
            Some(id) => Ok((BlockCoordinate(indices), id)),
            None => Err(ResolveError::UnknownBlock {
                coordinate: indices.to_vec(),
                key,
            }),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ResolvedBlocks<'_> {}

impl FusedIterator for ResolvedBlocks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_index;

    #[test]
    fn resolve_fixed_every_axis() {
        let chunk_map = build_index(&[4, 6, 2], &[2, 3, 1]).unwrap();
        let selector = RegionSelector::new(vec![
            AxisSelector::Index(3),
            AxisSelector::Index(4),
            AxisSelector::Index(0),
        ]);
        let blocks = resolve(&selector, &chunk_map, &[4, 6, 2], &[2, 3, 1])
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(blocks.len(), 1);
        let (coordinate, id) = &blocks[0];
        assert_eq!(coordinate.indices(), &[1, 1, 0]);
        assert_eq!(coordinate.origin(&[2, 3, 1]), vec![2, 3, 0]);
        assert_eq!(*id, ChunkId::new(6));
    }

    #[test]
    fn resolve_full_every_axis() {
        let chunk_map = build_index(&[4, 6], &[2, 3]).unwrap();
        let resolved = resolve(&RegionSelector::full(2), &chunk_map, &[4, 6], &[2, 3]).unwrap();
        assert_eq!(resolved.len(), chunk_map.len());
        assert_eq!(resolved.grid_subset(), &ArraySubset::new_with_shape(vec![2, 2]));
        let ids: Vec<u64> = resolved.map(|block| block.unwrap().1.as_u64()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn resolve_mixed() {
        let chunk_map = build_index(&[4, 4], &[2, 2]).unwrap();
        let selector: RegionSelector = [Some(3), None].into_iter().collect();
        let blocks: Vec<_> = resolve(&selector, &chunk_map, &[4, 4], &[2, 2])
            .unwrap()
            .map(|block| block.unwrap())
            .map(|(coordinate, id)| (coordinate.indices().to_vec(), id.as_u64()))
            .collect();
        assert_eq!(blocks, vec![(vec![1, 0], 2), (vec![1, 1], 3)]);
    }

    #[test]
    fn resolve_ragged() {
        // Only the complete blocks of [5, 5] are chunked.
        let chunk_map = build_index(&[4, 4], &[2, 2]).unwrap();
        let resolved = resolve(&RegionSelector::full(2), &chunk_map, &[5, 5], &[2, 2]).unwrap();
        assert_eq!(resolved.count(), 4);
        assert_eq!(
            resolve(
                &[Some(4), None].into_iter().collect(),
                &chunk_map,
                &[5, 5],
                &[2, 2]
            )
            .unwrap_err(),
            ResolveError::InvalidSelector {
                axis: 0,
                index: 4,
                extent: 4
            }
        );
    }

    #[test]
    fn resolve_unknown_block() {
        let chunk_map = build_index(&[4, 4], &[2, 2]).unwrap();
        let mut resolved = resolve(&RegionSelector::full(2), &chunk_map, &[8, 4], &[2, 2]).unwrap();
        assert_eq!(resolved.len(), 8);
        assert!(resolved.by_ref().take(4).all(|block| block.is_ok()));
        assert_eq!(
            resolved.next(),
            Some(Err(ResolveError::UnknownBlock {
                coordinate: vec![2, 0],
                key: 4
            }))
        );
    }

    #[test]
    fn resolve_invalid() {
        let chunk_map = build_index(&[4, 4], &[2, 2]).unwrap();
        assert!(matches!(
            resolve(&RegionSelector::full(3), &chunk_map, &[4, 4], &[2, 2]),
            Err(ResolveError::IncompatibleDimensionality(_))
        ));
        assert!(matches!(
            resolve(&RegionSelector::full(2), &chunk_map, &[4, 4], &[2, 8]),
            Err(ResolveError::Shape(ShapeError::InvalidBlockShape { .. }))
        ));
    }
}
