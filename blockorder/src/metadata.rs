//! Chunked array metadata.
//!
//! The metadata of a [`ChunkedArray`](crate::ChunkedArray) is stored as JSON next to its block container:
//! ```rust
//! # let JSON = r#"
//! {
//!     "shape": [5, 5],
//!     "block_shape": [2, 2],
//!     "element_size": 4,
//!     "codec": {
//!         "name": "gzip",
//!         "configuration": {
//!             "level": 5
//!         }
//!     },
//!     "num_chunks": 4
//! }
//! # "#;
//! # use blockorder::ChunkedArrayMetadata;
//! # serde_json::from_str::<ChunkedArrayMetadata>(JSON).unwrap();
//! ```

use serde::{Deserialize, Serialize};

use crate::codec::CodecConfiguration;
use crate::grid::ArrayShape;

/// The metadata of a chunked array.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChunkedArrayMetadata {
    /// The logical shape of the array.
    pub shape: ArrayShape,
    /// The block shape.
    pub block_shape: ArrayShape,
    /// The size of an element in bytes.
    pub element_size: usize,
    /// The codec of every chunk.
    pub codec: CodecConfiguration,
    /// The number of chunks in the block container.
    pub num_chunks: u64,
}

impl core::fmt::Display for ChunkedArrayMetadata {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", serde_json::to_string(self).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_array_metadata() {
        let metadata = ChunkedArrayMetadata {
            shape: vec![4, 4],
            block_shape: vec![2, 2],
            element_size: 1,
            codec: CodecConfiguration::Identity,
            num_chunks: 4,
        };
        let json = metadata.to_string();
        assert_eq!(
            json,
            r#"{"shape":[4,4],"block_shape":[2,2],"element_size":1,"codec":{"name":"identity"},"num_chunks":4}"#
        );
        assert_eq!(
            serde_json::from_str::<ChunkedArrayMetadata>(&json).unwrap(),
            metadata
        );
        assert!(serde_json::from_str::<ChunkedArrayMetadata>(
            r#"{"shape":[4,4],"block_shape":[2,2],"element_size":1,"codec":{"name":"identity"}}"#
        )
        .is_err());
    }
}
