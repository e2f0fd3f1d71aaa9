//! A block container, a single store value holding independently encoded chunks.
//!
//! Every complete block is encoded with a [`BlockCodecTraits`] codec into a chunk.
//! The chunks are concatenated and followed by an index with the byte offset and byte length of every chunk:
//! ```text
//! [chunk 0][chunk 1]...[chunk n-1][offset 0][nbytes 0]...[offset n-1][nbytes n-1]
//! ```
//! Index entries are little-endian `u64`.
//! A [`BlockContainerReader`] reads the index with a suffix byte range and then any chunk with a single byte range.

use std::borrow::Cow;
use std::sync::Arc;

use rayon::prelude::*;

use crate::codec::{BlockCodecTraits, BlockFetch, BlockFetchError, CodecError, CodecOptions};
use crate::grid::ChunkId;
use crate::storage::byte_range::ByteRange;
use crate::storage::{Bytes, ReadableStorageTraits, StorageError, StoreKey, WritableStorageTraits};

const INDEX_ENTRY_SIZE: usize = 2 * size_of::<u64>();

/// An encoded block container.
#[derive(Clone, Debug)]
pub struct BlockContainer {
    bytes: Vec<u8>,
    num_chunks: u64,
}

impl BlockContainer {
    /// Encode a sequence of blocks of `block_size` bytes each.
    ///
    /// Chunks are encoded in parallel if `concurrent_target` in `options` is greater than one.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if `block_size` is zero, the length of `blocks` is not a multiple of `block_size`, or the codec fails.
    pub fn encode(
        blocks: &[u8],
        block_size: usize,
        codec: &dyn BlockCodecTraits,
        options: &CodecOptions,
    ) -> Result<Self, CodecError> {
        if block_size == 0 || blocks.len() % block_size != 0 {
            return Err(CodecError::Other(format!(
                "{} bytes is not a sequence of blocks of {block_size} bytes",
                blocks.len()
            )));
        }
        let encode_chunk = |block: &[u8]| -> Result<Vec<u8>, CodecError> {
            Ok(codec.encode(Cow::Borrowed(block), options)?.into_owned())
        };
        let chunks = if options.concurrent_target() > 1 {
            blocks
                .par_chunks(block_size)
                .map(encode_chunk)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            blocks
                .chunks(block_size)
                .map(encode_chunk)
                .collect::<Result<Vec<_>, _>>()?
        };

        let num_chunks = chunks.len() as u64;
        let data_size: usize = chunks.iter().map(Vec::len).sum();
        let mut bytes = Vec::with_capacity(data_size + chunks.len() * INDEX_ENTRY_SIZE);
        let mut index = Vec::with_capacity(chunks.len() * INDEX_ENTRY_SIZE);
        for chunk in &chunks {
            index.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
            index.extend_from_slice(&(chunk.len() as u64).to_le_bytes());
            bytes.extend_from_slice(chunk);
        }
        bytes.extend_from_slice(&index);
        Ok(Self { bytes, num_chunks })
    }

    /// The number of chunks.
    #[must_use]
    pub const fn num_chunks(&self) -> u64 {
        self.num_chunks
    }

    /// The encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Convert into the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Store the container at `key`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store fails.
    pub fn store<TStorage: ?Sized + WritableStorageTraits>(
        self,
        storage: &TStorage,
        key: &StoreKey,
    ) -> Result<(), StorageError> {
        log::debug!(
            "storing block container {key} ({} chunks, {} bytes)",
            self.num_chunks,
            self.bytes.len()
        );
        storage.set(key, Bytes::from(self.bytes))
    }
}

/// Random access to the chunks of a stored [`BlockContainer`].
pub struct BlockContainerReader<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    key: StoreKey,
    codec: Arc<dyn BlockCodecTraits>,
    element_size: usize,
    /// (offset, nbytes) of every chunk.
    index: Vec<(u64, u64)>,
}

impl<TStorage: ?Sized> core::fmt::Debug for BlockContainerReader<TStorage> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockContainerReader")
            .field("key", &self.key)
            .field("codec", &self.codec)
            .field("element_size", &self.element_size)
            .field("num_chunks", &self.index.len())
            .finish_non_exhaustive()
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> BlockContainerReader<TStorage> {
    /// Open the block container of `num_chunks` chunks at `key`.
    ///
    /// Only the index is read.
    ///
    /// # Errors
    /// Returns a [`BlockFetchError`] if the container is missing, cannot be read, or has an invalid index.
    pub fn new(
        storage: Arc<TStorage>,
        key: StoreKey,
        num_chunks: u64,
        element_size: usize,
        codec: Arc<dyn BlockCodecTraits>,
    ) -> Result<Self, BlockFetchError> {
        let size = storage
            .size_key(&key)?
            .ok_or_else(|| BlockFetchError::MissingContainer(key.clone()))?;
        let index_size = num_chunks
            .checked_mul(INDEX_ENTRY_SIZE as u64)
            .filter(|&index_size| index_size <= size)
            .ok_or_else(|| {
                BlockFetchError::InvalidIndex(format!(
                    "a container of {size} bytes cannot index {num_chunks} chunks"
                ))
            })?;
        let encoded_index = storage
            .get_byte_range(&key, ByteRange::Suffix(index_size))?
            .ok_or_else(|| BlockFetchError::MissingContainer(key.clone()))?;

        let data_size = size - index_size;
        let index = encoded_index
            .chunks_exact(INDEX_ENTRY_SIZE)
            .map(|entry| {
                let (offset, nbytes) = entry.split_at(size_of::<u64>());
                let offset = u64::from_le_bytes(offset.try_into().unwrap_or_default());
                let nbytes = u64::from_le_bytes(nbytes.try_into().unwrap_or_default());
                if offset.checked_add(nbytes).is_some_and(|end| end <= data_size) {
                    Ok((offset, nbytes))
                } else {
                    Err(BlockFetchError::InvalidIndex(format!(
                        "chunk at offset {offset} with {nbytes} bytes exceeds the {data_size} bytes of chunk data"
                    )))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        if index.len() as u64 != num_chunks {
            return Err(BlockFetchError::InvalidIndex(format!(
                "expected {num_chunks} index entries, got {}",
                index.len()
            )));
        }

        Ok(Self {
            storage,
            key,
            codec,
            element_size,
            index,
        })
    }

    /// The number of chunks.
    #[must_use]
    pub fn num_chunks(&self) -> u64 {
        self.index.len() as u64
    }

    /// The store key of the container.
    #[must_use]
    pub const fn key(&self) -> &StoreKey {
        &self.key
    }

    /// Retrieve the encoded bytes of a chunk.
    ///
    /// # Errors
    /// Returns a [`BlockFetchError`] if the chunk is not in the container or cannot be read.
    pub fn retrieve_chunk_encoded(&self, chunk_id: ChunkId) -> Result<Bytes, BlockFetchError> {
        let &(offset, nbytes) = usize::try_from(chunk_id.as_u64())
            .ok()
            .and_then(|chunk| self.index.get(chunk))
            .ok_or(BlockFetchError::MissingChunk(chunk_id))?;
        self.storage
            .get_byte_range(&self.key, ByteRange::FromStart(offset, Some(nbytes)))?
            .ok_or_else(|| BlockFetchError::MissingContainer(self.key.clone()))
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> BlockFetch for BlockContainerReader<TStorage> {
    fn fetch_block(
        &self,
        chunk_id: ChunkId,
        block_num_elements: u64,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, BlockFetchError> {
        let encoded = self.retrieve_chunk_encoded(chunk_id)?;
        log::trace!(
            "fetching chunk {chunk_id} of {} ({} bytes)",
            self.key,
            encoded.len()
        );
        let decoded_size = block_num_elements.saturating_mul(self.element_size as u64);
        let decoded = self
            .codec
            .decode(Cow::Borrowed(&encoded[..]), decoded_size, options)
            .map_err(|source| BlockFetchError::Codec { chunk_id, source })?;
        Ok(decoded.into_owned())
    }
}
