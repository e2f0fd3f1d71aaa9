//! An in-memory store.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::byte_range::ByteRange;
use crate::{
    Bytes, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey, WritableStorageTraits,
};

/// An in-memory store.
///
/// Values are reference counted, so reads of a byte range do not copy.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<StoreKey, Bytes>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The keys with a stored value, in order.
    #[must_use]
    pub fn keys(&self) -> Vec<StoreKey> {
        self.values.lock().keys().cloned().collect()
    }
}

impl ReadableStorageTraits for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn get_byte_range(
        &self,
        key: &StoreKey,
        byte_range: ByteRange,
    ) -> Result<MaybeBytes, StorageError> {
        let Some(value) = self.values.lock().get(key).cloned() else {
            return Ok(None);
        };
        let bounds = byte_range.bounds(value.len() as u64)?;
        Ok(Some(value.slice(bounds)))
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        Ok(self.values.lock().get(key).map(|value| value.len() as u64))
    }
}

impl WritableStorageTraits for MemoryStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        log::trace!("memory store set {key} ({} bytes)", value.len());
        self.values.lock().insert(key.clone(), value);
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        if self.values.lock().remove(key).is_some() {
            log::trace!("memory store erase {key}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::sync::Arc;

    use super::*;

    fn store_write_read<T: ReadableStorageTraits + WritableStorageTraits>(
        store: &T,
    ) -> Result<(), Box<dyn Error>> {
        let key = StoreKey::new("a/b")?;
        assert!(store.get(&key)?.is_none());
        assert!(store.size_key(&key)?.is_none());
        assert!(store.get_byte_range(&key, ByteRange::Suffix(1))?.is_none());
        store.set(&key, Bytes::from_static(&[0, 1, 2, 3, 4]))?;
        assert_eq!(store.get(&key)?.unwrap(), &[0u8, 1, 2, 3, 4][..]);
        assert_eq!(store.size_key(&key)?, Some(5));
        assert_eq!(
            store.get_byte_range(&key, ByteRange::FromStart(1, Some(2)))?.unwrap(),
            &[1u8, 2][..]
        );
        assert_eq!(
            store.get_byte_range(&key, ByteRange::Suffix(2))?.unwrap(),
            &[3u8, 4][..]
        );
        assert!(matches!(
            store.get_byte_range(&key, ByteRange::FromStart(4, Some(2))),
            Err(StorageError::InvalidByteRange(_))
        ));
        store.erase(&key)?;
        assert!(store.get(&key)?.is_none());
        store.erase(&key)?;
        Ok(())
    }

    #[test]
    fn memory() -> Result<(), Box<dyn Error>> {
        let store = MemoryStore::new();
        store_write_read(&store)?;
        store.set(&StoreKey::new("x")?, Bytes::new())?;
        assert_eq!(store.keys(), vec![StoreKey::new("x")?]);
        Ok(())
    }

    #[test]
    fn memory_shared() -> Result<(), Box<dyn Error>> {
        let store = Arc::new(MemoryStore::new());
        store_write_read(&store)?;
        let key = StoreKey::new("a")?;
        store.set(&key, Bytes::from_static(&[7, 8]))?;
        assert_eq!(
            store.get_byte_range(&key, ByteRange::FromStart(1, None))?.unwrap(),
            &[8u8][..]
        );
        Ok(())
    }
}
