//! The block codec API for the [`blockorder`](https://docs.rs/blockorder/latest/blockorder/index.html) crate.
//!
//! A block codec turns the raw bytes of one block into a stored chunk and back ([`BlockCodecTraits`]).
//! A block fetcher retrieves the raw bytes of a single chunk from a store without decoding any other chunk ([`BlockFetch`]).
//!
//! Codecs are configured explicitly with [`CodecConfiguration`] metadata and [`CodecOptions`].
//!
//! ## Licence
//! `blockorder_codec` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

mod configuration;
mod options;

use std::borrow::Cow;
use std::sync::Arc;

use auto_impl::auto_impl;
use blockorder_grid::ChunkId;
use blockorder_storage::{StorageError, StoreKey};
use thiserror::Error;

pub use configuration::{
    CodecConfiguration, GzipCodecConfiguration, GzipCompressionLevel, GzipCompressionLevelError,
    ZstdCodecConfiguration, ZstdCompressionLevel, ZstdCompressionLevelError,
};
pub use options::CodecOptions;

/// Raw block bytes, owned or borrowed.
pub type RawBytes<'a> = Cow<'a, [u8]>;

/// Traits for a codec which compresses or decompresses the raw bytes of a single block.
///
/// A codec must satisfy `decode(encode(x)) == x`.
pub trait BlockCodecTraits: core::fmt::Debug + Send + Sync {
    /// Return the configuration of the codec.
    fn configuration(&self) -> CodecConfiguration;

    /// Encode the raw bytes of a block.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the codec fails.
    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError>;

    /// Decode a chunk to the raw bytes of a block of `decoded_size` bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the codec fails or, if enabled in `options`, the decoded size does not match `decoded_size`.
    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_size: u64,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError>;
}

/// Random access retrieval of the raw bytes of a single chunk.
#[auto_impl(&, Arc)]
pub trait BlockFetch: Send + Sync {
    /// Fetch and decode the chunk `chunk_id` holding a block of `block_num_elements` elements.
    ///
    /// The returned bytes hold exactly one block.
    ///
    /// # Errors
    /// Returns a [`BlockFetchError`] if the chunk is missing, cannot be read from storage, or cannot be decoded.
    fn fetch_block(
        &self,
        chunk_id: ChunkId,
        block_num_elements: u64,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, BlockFetchError>;
}

/// The decoded size of a block does not match what was expected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("the size of a decoded block is {size}, expected {expected_size}")]
pub struct UnexpectedBlockDecodedSizeError {
    size: u64,
    expected_size: u64,
}

impl UnexpectedBlockDecodedSizeError {
    /// Create a new [`UnexpectedBlockDecodedSizeError`].
    #[must_use]
    pub const fn new(size: u64, expected_size: u64) -> Self {
        Self {
            size,
            expected_size,
        }
    }

    /// The decoded size.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// The expected decoded size.
    #[must_use]
    pub const fn expected_size(&self) -> u64 {
        self.expected_size
    }
}

/// A codec error.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] Arc<std::io::Error>),
    /// The decoded size of a block did not match what was expected.
    #[error(transparent)]
    UnexpectedBlockDecodedSize(#[from] UnexpectedBlockDecodedSizeError),
    /// An invalid codec configuration.
    #[error("invalid codec configuration: {0}")]
    InvalidConfiguration(String),
    /// Other
    #[error("{_0}")]
    Other(String),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(Arc::new(err))
    }
}

impl From<GzipCompressionLevelError> for CodecError {
    fn from(err: GzipCompressionLevelError) -> Self {
        Self::InvalidConfiguration(err.to_string())
    }
}

impl From<ZstdCompressionLevelError> for CodecError {
    fn from(err: ZstdCompressionLevelError) -> Self {
        Self::InvalidConfiguration(err.to_string())
    }
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// A block fetch error.
///
/// Any failure to retrieve a required block is propagated, there is no fallback value.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum BlockFetchError {
    /// A chunk could not be decoded.
    #[error("failed to decode chunk {chunk_id}: {source}")]
    Codec {
        /// The chunk identifier.
        chunk_id: ChunkId,
        /// The codec error.
        #[source]
        source: CodecError,
    },
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// The value holding the chunks is not in the store.
    #[error("missing chunk container {0}")]
    MissingContainer(StoreKey),
    /// The chunk is not in the container.
    #[error("chunk {0} is not in the container")]
    MissingChunk(ChunkId),
    /// The chunk index of the container is invalid.
    #[error("invalid chunk index: {0}")]
    InvalidIndex(String),
    /// Other
    #[error("{_0}")]
    Other(String),
}

impl From<&str> for BlockFetchError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for BlockFetchError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
