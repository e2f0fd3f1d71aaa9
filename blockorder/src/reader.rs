//! Region reads from independently fetched blocks.

use rayon::prelude::*;
use thiserror::Error;

use crate::codec::{BlockFetch, BlockFetchError, CodecOptions, UnexpectedBlockDecodedSizeError};
use crate::grid::{
    resolve, trimmed_extent, ArrayIndices, ArrayShape, ArraySubset, ArraySubsetError,
    AxisSelector, ChunkId, ChunkMap, RegionSelector, ResolveError,
};
use crate::region_bytes::{RegionBytes, RegionBytesError};

/// A region read error.
///
/// A read either returns the complete region or fails, there is no partial result.
#[derive(Clone, Debug, Error)]
pub enum ReadError {
    /// The region could not be resolved to blocks.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// A block could not be fetched.
    #[error(transparent)]
    BlockFetch(#[from] BlockFetchError),
    /// An invalid array subset.
    #[error(transparent)]
    ArraySubset(#[from] ArraySubsetError),
    /// Invalid region bytes.
    #[error(transparent)]
    RegionBytes(#[from] RegionBytesError),
    /// The element size is zero.
    #[error("the element size must be nonzero")]
    InvalidElementSize,
    /// The region cannot be addressed on this platform.
    #[error("region of {0} bytes is too large to address")]
    TooLarge(u64),
}

fn to_usize(size: u64) -> Result<usize, ReadError> {
    usize::try_from(size).map_err(|_| ReadError::TooLarge(size))
}

/// The size in bytes of `num_elements` elements of `element_size` bytes.
fn bytes_size(num_elements: u64, element_size: u64) -> Result<usize, ReadError> {
    let size = num_elements
        .checked_mul(element_size)
        .ok_or(ReadError::TooLarge(u64::MAX))?;
    to_usize(size)
}

/// Fetch the blocks of `chunk_ids` in order, each checked to hold `block_size` bytes.
pub(crate) fn fetch_blocks<TFetch: ?Sized + BlockFetch>(
    chunk_ids: &[ChunkId],
    block_num_elements: u64,
    block_size: usize,
    fetch: &TFetch,
    options: &CodecOptions,
) -> Result<Vec<Vec<u8>>, BlockFetchError> {
    let fetch_block = |&chunk_id: &ChunkId| -> Result<Vec<u8>, BlockFetchError> {
        let bytes = fetch.fetch_block(chunk_id, block_num_elements, options)?;
        if bytes.len() == block_size {
            Ok(bytes)
        } else {
            Err(BlockFetchError::Codec {
                chunk_id,
                source: UnexpectedBlockDecodedSizeError::new(bytes.len() as u64, block_size as u64)
                    .into(),
            })
        }
    };
    let concurrent_target = options.concurrent_target();
    if concurrent_target > 1 && chunk_ids.len() > 1 {
        chunk_ids
            .par_iter()
            .with_min_len(chunk_ids.len().div_ceil(concurrent_target))
            .map(fetch_block)
            .collect()
    } else {
        chunk_ids.iter().map(fetch_block).collect()
    }
}

/// Read a region of an array from its blocks.
///
/// The blocks overlapping `selector` are resolved with `chunk_map` (see [`resolve`]) and fetched with `fetch`.
/// They are assembled into a buffer covering the resolved blocks, which is then sliced to the region.
/// A fixed index axis has length 1 in the region, a full range axis spans the complete blocks of that axis.
///
/// Blocks are fetched in parallel if `concurrent_target` in `options` is greater than one.
///
/// # Errors
/// Returns a [`ReadError`] if
///  - `element_size` is zero,
///  - the selector cannot be resolved or resolves to a block absent from `chunk_map`, or
///  - any block fails to fetch or decode, or has an unexpected size.
pub fn read_region<TFetch: ?Sized + BlockFetch>(
    selector: &RegionSelector,
    chunk_map: &ChunkMap,
    shape: &[u64],
    block_shape: &[u64],
    element_size: usize,
    fetch: &TFetch,
    options: &CodecOptions,
) -> Result<RegionBytes, ReadError> {
    if element_size == 0 {
        return Err(ReadError::InvalidElementSize);
    }
    let resolved = resolve(selector, chunk_map, shape, block_shape)?;
    let grid_subset = resolved.grid_subset().clone();
    let blocks = resolved.collect::<Result<Vec<_>, _>>()?;
    log::debug!(
        "reading region {selector} of shape {shape:?} from {} blocks of shape {block_shape:?}",
        blocks.len()
    );

    // the assembly buffer covers the resolved blocks
    let origin: ArrayIndices = std::iter::zip(grid_subset.start(), block_shape)
        .map(|(g, b)| g * b)
        .collect();
    let assembly_shape: ArrayShape = std::iter::zip(grid_subset.shape(), block_shape)
        .map(|(g, b)| g * b)
        .collect();
    let element_size_u64 = element_size as u64;
    let block_num_elements: u64 = block_shape.iter().product();
    let block_size = bytes_size(block_num_elements, element_size_u64)?;
    let assembly_num_elements = assembly_shape.iter().product::<u64>();
    let mut assembly = vec![0u8; bytes_size(assembly_num_elements, element_size_u64)?];

    let chunk_ids: Vec<ChunkId> = blocks.iter().map(|(_, chunk_id)| *chunk_id).collect();
    let fetched = fetch_blocks(&chunk_ids, block_num_elements, block_size, fetch, options)?;
    for ((coordinate, _), bytes) in std::iter::zip(&blocks, &fetched) {
        let block_start = std::iter::zip(coordinate.origin(block_shape), &origin)
            .map(|(start, origin)| start - origin)
            .collect();
        let block_subset = ArraySubset::new_with_start_shape(block_start, block_shape.to_vec())?;
        let mut offset = 0;
        for (index, elements) in &block_subset.contiguous_linearised_indices(&assembly_shape)? {
            let index = to_usize(index * element_size_u64)?;
            let length = to_usize(elements * element_size_u64)?;
            assembly[index..index + length].copy_from_slice(&bytes[offset..offset + length]);
            offset += length;
        }
    }

    // slice the region from the assembly buffer
    let region_ranges = itertools::izip!(selector.axes(), shape, block_shape, &origin)
        .map(|(selector, &extent, &block, &origin)| match *selector {
            AxisSelector::Index(index) => index - origin..index - origin + 1,
            AxisSelector::Full => 0..trimmed_extent(extent, block),
        })
        .collect::<Vec<_>>();
    let region_subset = ArraySubset::new_with_ranges(&region_ranges);
    let mut region = Vec::with_capacity(to_usize(region_subset.num_elements() * element_size_u64)?);
    for (index, elements) in &region_subset.contiguous_linearised_indices(&assembly_shape)? {
        let index = to_usize(index * element_size_u64)?;
        let length = to_usize(elements * element_size_u64)?;
        region.extend_from_slice(&assembly[index..index + length]);
    }
    Ok(RegionBytes::new(
        region_subset.shape().to_vec(),
        element_size,
        region,
    )?)
}
