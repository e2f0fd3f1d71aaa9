use auto_impl::auto_impl;

use crate::byte_range::ByteRange;
use crate::{Bytes, MaybeBytes, StorageError, StoreKey};

/// Reading values from a store.
#[auto_impl(Arc, &)]
pub trait ReadableStorageTraits: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns [`None`] if nothing is stored under `key`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store fails.
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        self.get_byte_range(key, ByteRange::FromStart(0, None))
    }

    /// Read `byte_range` of the value stored under `key`.
    ///
    /// Returns [`None`] if nothing is stored under `key`.
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidByteRange`] if `byte_range` does not lie within the value, or another [`StorageError`] if the store fails.
    fn get_byte_range(
        &self,
        key: &StoreKey,
        byte_range: ByteRange,
    ) -> Result<MaybeBytes, StorageError>;

    /// The size in bytes of the value stored under `key`, or [`None`] if there is none.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store fails.
    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError>;
}

/// Writing values to a store.
#[auto_impl(Arc, &)]
pub trait WritableStorageTraits: Send + Sync {
    /// Store `value` under `key`, replacing any existing value.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store fails.
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError>;

    /// Remove the value under `key`. Erasing a missing key succeeds.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store fails.
    fn erase(&self, key: &StoreKey) -> Result<(), StorageError>;
}
