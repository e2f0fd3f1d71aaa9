//! `blockorder` is a Rust library for block-interleaved layouts of multidimensional arrays and chunked region reads.
//!
//! An N-dimensional array stored in row-major order is partitioned into blocks.
//! `blockorder` reorganises the array so that the elements of every block are contiguous, builds an index from block coordinates to sequentially numbered chunks, and reads any rectangular region by fetching only the chunks it overlaps.
//!
//! ## Overview
//! - [`layout`]: the partition layout engine, [`transform`] between the natural and block-interleaved layouts.
//!   - Arrays with an extent that is not a multiple of its block extent take the [general path](LayoutPath::General), elements outside of complete blocks keep their position.
//! - [`grid`]: shapes, padding, the [`ChunkMap`](grid::ChunkMap) of complete blocks ([`build_index`](grid::build_index)) and region resolution ([`resolve`](grid::resolve)).
//! - [`codec`]: block codecs (`identity`, `gzip`, `zstd`) and their explicit [`CodecOptions`](codec::CodecOptions).
//! - [`BlockContainer`] and [`BlockContainerReader`]: independently encoded chunks in a single store value with random access.
//! - [`read_region`]: the chunked reader, assembling a region from fetched blocks.
//! - [`ChunkedArray`]: an array stored in a block container of a [`storage`] store.
//!
//! ## Example
//! ```rust
//! use blockorder::{transform, Direction, LayoutPath};
//!
//! let natural: Vec<u8> = (0..16).collect();
//! let mut interleaved = vec![0; 16];
//! let path = transform(&natural, &mut interleaved, 1, &[2, 2], &[4, 4], Direction::Forward)?;
//! assert_eq!(path, LayoutPath::Exact);
//! assert_eq!(interleaved, [0, 1, 4, 5, 2, 3, 6, 7, 8, 9, 12, 13, 10, 11, 14, 15]);
//! # Ok::<_, blockorder::LayoutError>(())
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - `gzip`: enable the gzip codec.
//!  - `zstd`: enable the zstd codec.
//!
//! ## Logging
//! `blockorder` logs through the [`log`](https://docs.rs/log) crate.
//! Layout path selection, block container writes and region reads are logged at the `debug` level, and every fetched chunk at the `trace` level.
//!
//! ## Licence
//! `blockorder` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod codec;
pub mod layout;

mod block_container;
mod chunked_array;
mod metadata;
mod reader;
mod region_bytes;

pub use block_container::{BlockContainer, BlockContainerReader};
pub use chunked_array::{
    ChunkedArray, ChunkedArrayError, BLOCKS_KEY, METADATA_KEY, REMAINDER_KEY,
};
pub use layout::{
    transform, transform_elements, Direction, LayoutError, LayoutPath, PartitionLayout,
};
pub use metadata::ChunkedArrayMetadata;
pub use reader::{read_region, ReadError};
pub use region_bytes::{RegionBytes, RegionBytesError};

/// Re-export [`blockorder_grid`].
pub use blockorder_grid as grid;

/// Re-export [`blockorder_storage`].
pub use blockorder_storage as storage;
