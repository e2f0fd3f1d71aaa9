//! The storage API for the [`blockorder`](https://docs.rs/blockorder/latest/blockorder/index.html) crate.
//!
//! A chunked array keeps its metadata, block container and remainder as values under [`StoreKey`]s.
//! Block containers are read a [`ByteRange`](byte_range::ByteRange) at a time so that a single chunk is fetched without the rest of the container.
//!
//! [`store::MemoryStore`] is an in-memory store.
//!
//! ## Licence
//! `blockorder_storage` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

pub mod byte_range;
mod storage_sync;
pub mod store;
mod store_key;

use byte_range::InvalidByteRangeError;
use thiserror::Error;

pub use store_key::{StoreKey, StoreKeyError};

pub use self::storage_sync::{ReadableStorageTraits, WritableStorageTraits};

/// Stored values, an alias for [`bytes::Bytes`].
pub type Bytes = bytes::Bytes;

/// A stored value, or [`None`] if nothing is stored under the key.
pub type MaybeBytes = Option<Bytes>;

/// A storage error.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// An invalid store key.
    #[error(transparent)]
    InvalidStoreKey(#[from] StoreKeyError),
    /// A byte range outside of a stored value.
    #[error(transparent)]
    InvalidByteRange(#[from] InvalidByteRangeError),
    /// A failure of the underlying store.
    #[error("{0}")]
    Other(String),
}
