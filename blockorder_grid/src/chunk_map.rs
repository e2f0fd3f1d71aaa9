//! Chunk indexing of a block grid.

use std::collections::BTreeMap;

use derive_more::{Deref, Display, From};

use crate::partition_shape::validate_partition;
use crate::{ravel_indices, ArrayShape, ArraySubset, ShapeError, DEFAULT_MAX_RANK};

/// The sequential identifier of a stored chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deref, Display, From)]
pub struct ChunkId(u64);

impl ChunkId {
    /// Create a new chunk identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Return the identifier as a [`u64`].
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A mapping from block grid keys to sequential [`ChunkId`]s.
///
/// The key of a block is the row-major linearised index of its block coordinate in the block grid.
/// A chunk map is immutable once built and can be shared across concurrent readers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkMap {
    shape: ArrayShape,
    block_shape: ArrayShape,
    grid_shape: ArrayShape,
    ids: BTreeMap<u64, ChunkId>,
}

/// Build the chunk map of a block-aligned `shape` partitioned into `block_shape`.
///
/// Every block of the grid `shape / block_shape` is visited in row-major order and assigned the next [`ChunkId`].
///
/// # Errors
/// Returns a [`ShapeError`] if the partitioning is invalid or `shape` is not a multiple of `block_shape`.
pub fn build_index(shape: &[u64], block_shape: &[u64]) -> Result<ChunkMap, ShapeError> {
    ChunkMap::new(shape, block_shape)
}

impl ChunkMap {
    /// Create a new chunk map. See [`build_index`].
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if the partitioning is invalid or `shape` is not a multiple of `block_shape`.
    pub fn new(shape: &[u64], block_shape: &[u64]) -> Result<Self, ShapeError> {
        validate_partition(shape, block_shape, DEFAULT_MAX_RANK)?;
        if std::iter::zip(shape, block_shape).any(|(s, b)| s % b != 0) {
            return Err(ShapeError::UnalignedShape {
                shape: shape.to_vec(),
                block_shape: block_shape.to_vec(),
            });
        }

        let grid_shape: ArrayShape = std::iter::zip(shape, block_shape)
            .map(|(s, b)| s / b)
            .collect();
        let mut ids = BTreeMap::new();
        for (id, block_indices) in ArraySubset::new_with_shape(grid_shape.clone())
            .indices()
            .into_iter()
            .enumerate()
        {
            if let Some(key) = ravel_indices(&block_indices, &grid_shape) {
                ids.insert(key, ChunkId(id as u64));
            }
        }
        log::debug!(
            "built chunk map of {} chunks for shape {shape:?} with block shape {block_shape:?}",
            ids.len()
        );

        Ok(Self {
            shape: shape.to_vec(),
            block_shape: block_shape.to_vec(),
            grid_shape,
            ids,
        })
    }

    /// The block-aligned shape the map was built for.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// The block shape.
    #[must_use]
    pub fn block_shape(&self) -> &[u64] {
        &self.block_shape
    }

    /// The number of blocks along each axis.
    #[must_use]
    pub fn grid_shape(&self) -> &[u64] {
        &self.grid_shape
    }

    /// The number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if the map has no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Return the key of the block at `block_indices`.
    ///
    /// Returns [`None`] if `block_indices` is outside of the block grid.
    #[must_use]
    pub fn key(&self, block_indices: &[u64]) -> Option<u64> {
        ravel_indices(block_indices, &self.grid_shape)
    }

    /// Return the chunk identifier for `key`.
    #[must_use]
    pub fn get(&self, key: u64) -> Option<ChunkId> {
        self.ids.get(&key).copied()
    }

    /// Return the chunk identifier of the block at `block_indices`.
    #[must_use]
    pub fn chunk_id(&self, block_indices: &[u64]) -> Option<ChunkId> {
        self.key(block_indices).and_then(|key| self.get(key))
    }

    /// Iterate over the (key, chunk identifier) pairs in key order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (u64, ChunkId)> + '_ {
        self.ids.iter().map(|(&key, &id)| (key, id))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn chunk_map_complete_unique() {
        let chunk_map = build_index(&[6, 4, 9], &[2, 2, 3]).unwrap();
        assert_eq!(chunk_map.grid_shape(), &[3, 2, 3]);
        assert_eq!(chunk_map.len(), 18);
        let ids: HashSet<u64> = chunk_map.iter().map(|(_, id)| id.as_u64()).collect();
        assert_eq!(ids, (0..18).collect::<HashSet<_>>());
    }

    #[test]
    fn chunk_map_keys() {
        let chunk_map = build_index(&[4, 6], &[2, 2]).unwrap();
        assert_eq!(chunk_map.key(&[0, 0]), Some(0));
        assert_eq!(chunk_map.key(&[1, 2]), Some(5));
        assert_eq!(chunk_map.key(&[2, 0]), None);
        assert_eq!(chunk_map.chunk_id(&[1, 0]), Some(ChunkId::new(3)));
        assert_eq!(chunk_map.get(6), None);
        assert_eq!(chunk_map.chunk_id(&[1, 2]).map(|id| id.to_string()), Some("5".to_string()));
    }

    #[test]
    fn chunk_map_single_block() {
        let chunk_map = build_index(&[3, 3], &[3, 3]).unwrap();
        assert_eq!(chunk_map.len(), 1);
        assert!(!chunk_map.is_empty());
        assert_eq!(chunk_map.chunk_id(&[0, 0]), Some(ChunkId::new(0)));
    }

    #[test]
    fn chunk_map_unaligned() {
        assert_eq!(
            build_index(&[5, 4], &[2, 2]),
            Err(ShapeError::UnalignedShape {
                shape: vec![5, 4],
                block_shape: vec![2, 2]
            })
        );
        assert!(build_index(&[4, 4], &[2, 0]).is_err());
        assert!(build_index(&[4, 4], &[2]).is_err());
    }
}
