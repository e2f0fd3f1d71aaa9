//! A chunked array, an array stored as a block container of independently fetchable chunks.

use std::borrow::Cow;
use std::sync::Arc;

use thiserror::Error;

use crate::block_container::{BlockContainer, BlockContainerReader};
use crate::codec::{
    codec_from_configuration, BlockCodecTraits, BlockFetchError, CodecConfiguration, CodecError,
    CodecOptions,
};
use crate::grid::{
    build_index, ArrayShape, ArraySubset, ArraySubsetError, ChunkId, ChunkMap, PartitionShape,
    RegionSelector, ShapeError,
};
use crate::layout::{Direction, LayoutError, LayoutPath, PartitionLayout};
use crate::metadata::ChunkedArrayMetadata;
use crate::reader::{fetch_blocks, read_region, ReadError};
use crate::region_bytes::RegionBytes;
use crate::storage::{
    Bytes, ReadableStorageTraits, StorageError, StoreKey, StoreKeyError, WritableStorageTraits,
};

/// The name of the metadata key of a chunked array.
pub const METADATA_KEY: &str = "blockorder.json";

/// The name of the block container key of a chunked array.
pub const BLOCKS_KEY: &str = "blocks";

/// The name of the key holding the elements outside of complete blocks.
pub const REMAINDER_KEY: &str = "remainder";

/// A chunked array error.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ChunkedArrayError {
    /// Invalid shape or block shape.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// A layout error.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// A region read error.
    #[error(transparent)]
    Read(#[from] ReadError),
    /// A block fetch error.
    #[error(transparent)]
    BlockFetch(#[from] BlockFetchError),
    /// A codec error.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A storage error.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// An invalid store key.
    #[error(transparent)]
    StoreKey(#[from] StoreKeyError),
    /// An invalid array subset.
    #[error(transparent)]
    ArraySubset(#[from] ArraySubsetError),
    /// Missing metadata.
    #[error("missing metadata at {0}")]
    MissingMetadata(StoreKey),
    /// Invalid metadata.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    /// The element size is zero.
    #[error("the element size must be nonzero")]
    InvalidElementSize,
    /// The elements do not match the array shape.
    #[error("expected {expected} bytes of elements, got {len}")]
    InvalidBytesLength {
        /// The number of bytes.
        len: usize,
        /// The expected number of bytes.
        expected: u64,
    },
}

/// A chunked array.
///
/// The elements of an array with a logical `shape` are stored in three values below a path in a store:
///  - `blockorder.json`: the [`ChunkedArrayMetadata`],
///  - `blocks`: a [`BlockContainer`] with one chunk per complete block, and
///  - `remainder`: the encoded elements outside of complete blocks, only present if `shape` is not a multiple of the block shape.
///
/// Any region can be read by fetching only the chunks it overlaps ([`read_region`](ChunkedArray::read_region)).
///
/// ### Example
/// ```rust
/// # use std::sync::Arc;
/// use blockorder::storage::store::MemoryStore;
/// use blockorder::codec::CodecConfiguration;
/// use blockorder::grid::RegionSelector;
/// use blockorder::ChunkedArray;
///
/// let store = Arc::new(MemoryStore::new());
/// let array = ChunkedArray::create(store, "array", vec![4, 4], vec![2, 2], 1, CodecConfiguration::Identity)?;
/// array.store_metadata()?;
/// array.store(&(0..16).collect::<Vec<u8>>())?;
///
/// let row = array.read_region(&RegionSelector::from_iter([Some(3u64), None]))?;
/// assert_eq!(row.shape(), &[1, 4]);
/// assert_eq!(row.bytes(), &[12, 13, 14, 15]);
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
pub struct ChunkedArray<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    metadata: ChunkedArrayMetadata,
    partition: PartitionShape,
    layout: PartitionLayout,
    chunk_map: ChunkMap,
    codec: Arc<dyn BlockCodecTraits>,
    metadata_key: StoreKey,
    blocks_key: StoreKey,
    remainder_key: StoreKey,
}

impl<TStorage: ?Sized> core::fmt::Debug for ChunkedArray<TStorage> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChunkedArray")
            .field("metadata", &self.metadata)
            .field("blocks_key", &self.blocks_key)
            .finish_non_exhaustive()
    }
}

fn child_key(path: &str, name: &str) -> Result<StoreKey, StoreKeyError> {
    let path = path.trim_matches('/');
    if path.is_empty() {
        StoreKey::new(name)
    } else {
        StoreKey::new(format!("{path}/{name}"))
    }
}

impl<TStorage: ?Sized> ChunkedArray<TStorage> {
    /// Create a chunked array in `storage` at `path` from `metadata`.
    ///
    /// Nothing is written to the store. See [`store_metadata`](ChunkedArray::store_metadata).
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayError`] if the metadata is invalid or `path` is not a valid store key prefix.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: ChunkedArrayMetadata,
    ) -> Result<Self, ChunkedArrayError> {
        if metadata.element_size == 0 {
            return Err(ChunkedArrayError::InvalidElementSize);
        }
        let partition = PartitionShape::new(metadata.shape.clone(), metadata.block_shape.clone())?;
        let layout = PartitionLayout::new(&metadata.shape, &metadata.block_shape)?;
        let chunk_map = build_index(&partition.trimmed_shape(), &metadata.block_shape)?;
        if chunk_map.len() as u64 != metadata.num_chunks {
            return Err(ChunkedArrayError::InvalidMetadata(format!(
                "{} chunks, a shape of {:?} with a block shape of {:?} has {} complete blocks",
                metadata.num_chunks,
                metadata.shape,
                metadata.block_shape,
                chunk_map.len()
            )));
        }
        let codec = codec_from_configuration(&metadata.codec)?;
        Ok(Self {
            storage,
            partition,
            layout,
            chunk_map,
            codec,
            metadata_key: child_key(path, METADATA_KEY)?,
            blocks_key: child_key(path, BLOCKS_KEY)?,
            remainder_key: child_key(path, REMAINDER_KEY)?,
            metadata,
        })
    }

    /// Create a chunked array in `storage` at `path`.
    ///
    /// Nothing is written to the store. See [`store_metadata`](ChunkedArray::store_metadata).
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayError`] if the partitioning or element size is invalid, the codec is not enabled, or `path` is not a valid store key prefix.
    pub fn create(
        storage: Arc<TStorage>,
        path: &str,
        shape: ArrayShape,
        block_shape: ArrayShape,
        element_size: usize,
        codec: CodecConfiguration,
    ) -> Result<Self, ChunkedArrayError> {
        let num_chunks = PartitionShape::new(shape.clone(), block_shape.clone())?.num_blocks();
        Self::new_with_metadata(
            storage,
            path,
            ChunkedArrayMetadata {
                shape,
                block_shape,
                element_size,
                codec,
                num_chunks,
            },
        )
    }

    /// The metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ChunkedArrayMetadata {
        &self.metadata
    }

    /// The logical shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.metadata.shape
    }

    /// The block shape.
    #[must_use]
    pub fn block_shape(&self) -> &[u64] {
        &self.metadata.block_shape
    }

    /// The element size in bytes.
    #[must_use]
    pub const fn element_size(&self) -> usize {
        self.metadata.element_size
    }

    /// The partitioning of the array.
    #[must_use]
    pub const fn partition(&self) -> &PartitionShape {
        &self.partition
    }

    /// The chunk map of the complete blocks.
    #[must_use]
    pub const fn chunk_map(&self) -> &ChunkMap {
        &self.chunk_map
    }

    /// The layout path taken when storing and retrieving the array.
    #[must_use]
    pub fn path(&self) -> LayoutPath {
        self.layout.path()
    }

    /// The store key of the block container.
    #[must_use]
    pub const fn blocks_key(&self) -> &StoreKey {
        &self.blocks_key
    }

    fn element_bytes(&self, num_elements: u64) -> Result<usize, LayoutError> {
        (self.metadata.element_size as u64)
            .checked_mul(num_elements)
            .and_then(|size| usize::try_from(size).ok())
            .ok_or(LayoutError::TooLarge(num_elements))
    }

    /// The linearised runs of the logical array within the padded array.
    fn logical_runs(&self) -> Result<Vec<(usize, usize)>, ChunkedArrayError> {
        let subset = ArraySubset::new_with_shape(self.metadata.shape.clone());
        let runs = subset.contiguous_linearised_indices(&self.partition.padded_shape())?;
        let runs = runs
            .iter()
            .map(|(index, elements)| -> Result<_, LayoutError> {
                Ok((self.element_bytes(index)?, self.element_bytes(elements)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> ChunkedArray<TStorage> {
    /// Open the chunked array in `storage` at `path`.
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayError`] if the metadata is missing or invalid.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ChunkedArrayError> {
        let metadata_key = child_key(path, METADATA_KEY)?;
        let metadata = storage
            .get(&metadata_key)?
            .ok_or_else(|| ChunkedArrayError::MissingMetadata(metadata_key.clone()))?;
        let metadata: ChunkedArrayMetadata = serde_json::from_slice(&metadata)
            .map_err(|err| ChunkedArrayError::InvalidMetadata(err.to_string()))?;
        log::debug!("opening chunked array {metadata_key}: {metadata}");
        Self::new_with_metadata(storage, path, metadata)
    }

    /// Return a random access reader of the block container.
    ///
    /// # Errors
    /// Returns a [`BlockFetchError`] if the block container is missing or invalid.
    pub fn block_reader(&self) -> Result<BlockContainerReader<TStorage>, BlockFetchError> {
        BlockContainerReader::new(
            self.storage.clone(),
            self.blocks_key.clone(),
            self.metadata.num_chunks,
            self.metadata.element_size,
            self.codec.clone(),
        )
    }

    /// Read a region of the array with default codec options.
    ///
    /// See [`read_region_opt`](ChunkedArray::read_region_opt).
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayError`] if the region cannot be read.
    pub fn read_region(&self, selector: &RegionSelector) -> Result<RegionBytes, ChunkedArrayError> {
        self.read_region_opt(selector, &CodecOptions::default())
    }

    /// Read a region of the array.
    ///
    /// Only the chunks overlapping the region are fetched and decoded.
    /// A fixed index must lie within the complete blocks of its axis, and a full range spans the complete blocks of its axis.
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayError`] if the selector is invalid or any overlapping chunk cannot be fetched.
    pub fn read_region_opt(
        &self,
        selector: &RegionSelector,
        options: &CodecOptions,
    ) -> Result<RegionBytes, ChunkedArrayError> {
        let reader = self.block_reader()?;
        Ok(read_region(
            selector,
            &self.chunk_map,
            &self.metadata.shape,
            &self.metadata.block_shape,
            self.metadata.element_size,
            &reader,
            options,
        )?)
    }

    /// Retrieve the elements of the array with default codec options.
    ///
    /// See [`retrieve_opt`](ChunkedArray::retrieve_opt).
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayError`] if the array cannot be retrieved.
    pub fn retrieve(&self) -> Result<Vec<u8>, ChunkedArrayError> {
        self.retrieve_opt(&CodecOptions::default())
    }

    /// Retrieve the elements of the array in row-major order.
    ///
    /// Every chunk is fetched and decoded, the block-interleaved layout is inverted, and the padding is removed.
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayError`] if any chunk or the remainder cannot be fetched or decoded.
    pub fn retrieve_opt(&self, options: &CodecOptions) -> Result<Vec<u8>, ChunkedArrayError> {
        let element_size = self.metadata.element_size;
        let reader = self.block_reader()?;
        let chunk_ids: Vec<ChunkId> = (0..self.metadata.num_chunks).map(ChunkId::new).collect();
        let block_num_elements = self.partition.block_num_elements();
        let blocks = fetch_blocks(
            &chunk_ids,
            block_num_elements,
            self.element_bytes(block_num_elements)?,
            &reader,
            options,
        )?
        .concat();

        let mut interleaved = vec![0u8; self.element_bytes(self.partition.num_elements_padded())?];
        self.layout
            .scatter_aligned(&blocks, &mut interleaved, element_size)?;
        if !self.layout.path().is_exact() {
            let remainder = self
                .storage
                .get(&self.remainder_key)?
                .ok_or_else(|| BlockFetchError::MissingContainer(self.remainder_key.clone()))?;
            let decoded_size = self.layout.num_elements_remainder() * element_size;
            let remainder = self.codec.decode(
                Cow::Borrowed(&remainder[..]),
                decoded_size as u64,
                options,
            )?;
            self.layout
                .scatter_remainder(&remainder, &mut interleaved, element_size)?;
        }

        let mut natural = vec![0u8; interleaved.len()];
        self.layout
            .transform(&interleaved, &mut natural, element_size, Direction::Inverse)?;

        let mut elements =
            Vec::with_capacity(self.element_bytes(self.partition.num_elements())?);
        for (index, length) in self.logical_runs()? {
            elements.extend_from_slice(&natural[index..index + length]);
        }
        Ok(elements)
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> ChunkedArray<TStorage> {
    /// Store the metadata.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        let metadata = serde_json::to_vec_pretty(&self.metadata)
            .map_err(|err| StorageError::Other(err.to_string()))?;
        self.storage.set(&self.metadata_key, Bytes::from(metadata))
    }

    /// Store the elements of the array with default codec options.
    ///
    /// See [`store_opt`](ChunkedArray::store_opt).
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayError`] if the array cannot be stored.
    pub fn store(&self, elements: &[u8]) -> Result<(), ChunkedArrayError> {
        self.store_opt(elements, &CodecOptions::default())
    }

    /// Store the elements of the array, given in row-major order.
    ///
    /// The elements are padded, transformed to the block-interleaved layout, and every complete block is encoded into a chunk of the block container.
    /// The elements outside of complete blocks are encoded separately.
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayError`] if `elements` does not match the array shape, a codec fails, or there is an underlying store error.
    pub fn store_opt(
        &self,
        elements: &[u8],
        options: &CodecOptions,
    ) -> Result<(), ChunkedArrayError> {
        let element_size = self.metadata.element_size;
        let expected = self.element_bytes(self.partition.num_elements())?;
        if elements.len() != expected {
            return Err(ChunkedArrayError::InvalidBytesLength {
                len: elements.len(),
                expected: expected as u64,
            });
        }

        let mut natural = vec![0u8; self.element_bytes(self.partition.num_elements_padded())?];
        let mut offset = 0;
        for (index, length) in self.logical_runs()? {
            natural[index..index + length].copy_from_slice(&elements[offset..offset + length]);
            offset += length;
        }
        let mut interleaved = vec![0u8; natural.len()];
        let path = self
            .layout
            .transform(&natural, &mut interleaved, element_size, Direction::Forward)?;

        let blocks = self.layout.gather_aligned(&interleaved, element_size)?;
        let block_size = self.element_bytes(self.partition.block_num_elements())?;
        let container = BlockContainer::encode(&blocks, block_size, &*self.codec, options)?;
        let remainder = if path.is_exact() {
            None
        } else {
            let remainder = self.layout.gather_remainder(&interleaved, element_size)?;
            Some(self.codec.encode(Cow::Owned(remainder), options)?.into_owned())
        };

        // nothing is written unless every chunk encoded
        container.store(&*self.storage, &self.blocks_key)?;
        match remainder {
            Some(remainder) => self.storage.set(&self.remainder_key, Bytes::from(remainder))?,
            None => self.storage.erase(&self.remainder_key)?,
        }
        Ok(())
    }
}
