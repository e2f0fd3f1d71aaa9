#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::sync::Arc;

use blockorder::codec::{BlockFetch, BlockFetchError, CodecConfiguration, CodecOptions};
use blockorder::grid::{
    build_index, resolve, AxisSelector, ChunkId, ChunkMap, RegionSelector, ResolveError,
};
use blockorder::storage::store::MemoryStore;
use blockorder::storage::StoreKey;
use blockorder::{
    read_region, transform, ChunkedArray, ChunkedArrayError, Direction, LayoutPath, ReadError,
};

/// Blocks cut from a block-interleaved array of `u8`.
struct InterleavedBlocks {
    interleaved: Vec<u8>,
    block_size: usize,
    failing: Option<u64>,
}

impl InterleavedBlocks {
    fn new(shape: &[u64], block_shape: &[u64]) -> Self {
        let num_elements = usize::try_from(shape.iter().product::<u64>()).unwrap();
        let natural: Vec<u8> = (0..num_elements).map(|i| i as u8).collect();
        let mut interleaved = vec![0; num_elements];
        transform(&natural, &mut interleaved, 1, block_shape, shape, Direction::Forward).unwrap();
        Self {
            interleaved,
            block_size: usize::try_from(block_shape.iter().product::<u64>()).unwrap(),
            failing: None,
        }
    }
}

impl BlockFetch for InterleavedBlocks {
    fn fetch_block(
        &self,
        chunk_id: ChunkId,
        _block_num_elements: u64,
        _options: &CodecOptions,
    ) -> Result<Vec<u8>, BlockFetchError> {
        if self.failing == Some(chunk_id.as_u64()) {
            return Err(BlockFetchError::MissingChunk(chunk_id));
        }
        let start = usize::try_from(chunk_id.as_u64()).unwrap() * self.block_size;
        Ok(self.interleaved[start..start + self.block_size].to_vec())
    }
}

#[test]
fn chunk_map_complete_and_unique() {
    for (shape, block_shape, expected) in [
        (vec![4, 4], vec![2, 2], 4),
        (vec![5, 5], vec![2, 2], 4),
        (vec![7, 3, 5], vec![2, 3, 2], 6),
        (vec![9], vec![4], 2),
    ] {
        let chunk_map: ChunkMap = build_index(&shape, &block_shape).unwrap();
        assert_eq!(chunk_map.len(), expected);
        let ids: BTreeSet<u64> = chunk_map.iter().map(|(_, id)| id.as_u64()).collect();
        assert_eq!(ids, (0..expected as u64).collect());
    }
}

#[test]
fn region_resolution_block_counts() {
    let chunk_map = build_index(&[6, 4, 4], &[2, 2, 2]).unwrap();
    let count = |selector: RegionSelector| {
        resolve(&selector, &chunk_map, &[6, 4, 4], &[2, 2, 2])
            .unwrap()
            .count()
    };
    assert_eq!(count(RegionSelector::from_iter([5u64, 3, 0])), 1);
    assert_eq!(count(RegionSelector::full(3)), 12);
    assert_eq!(count(RegionSelector::from_iter([Some(2u64), None, None])), 4);
    assert_eq!(count(RegionSelector::from_iter([None, Some(1u64), None])), 6);
}

#[test]
fn read_region_row_of_4x4() {
    let chunk_map = build_index(&[4, 4], &[2, 2]).unwrap();
    let fetch = InterleavedBlocks::new(&[4, 4], &[2, 2]);
    let selector = RegionSelector::new(vec![AxisSelector::Index(3), AxisSelector::Full]);
    let region = read_region(
        &selector,
        &chunk_map,
        &[4, 4],
        &[2, 2],
        1,
        &fetch,
        &CodecOptions::default(),
    )
    .unwrap();
    assert_eq!(region.shape(), &[1, 4]);
    assert_eq!(region.bytes(), &[12, 13, 14, 15]);
}

#[test]
fn read_region_every_point() {
    let shape = [4, 6];
    let block_shape = [2, 3];
    let chunk_map = build_index(&shape, &block_shape).unwrap();
    let fetch = InterleavedBlocks::new(&shape, &block_shape);
    let options = CodecOptions::default().with_concurrent_target(1);
    for row in 0..4u64 {
        for col in 0..6u64 {
            let region = read_region(
                &RegionSelector::from_iter([row, col]),
                &chunk_map,
                &shape,
                &block_shape,
                1,
                &fetch,
                &options,
            )
            .unwrap();
            assert_eq!(region.bytes(), &[(row * 6 + col) as u8]);
        }
    }
}

#[test]
fn read_region_failing_fetch() {
    let chunk_map = build_index(&[4, 4], &[2, 2]).unwrap();
    let mut fetch = InterleavedBlocks::new(&[4, 4], &[2, 2]);
    fetch.failing = Some(2);
    let read = |selector: RegionSelector| {
        read_region(
            &selector,
            &chunk_map,
            &[4, 4],
            &[2, 2],
            1,
            &fetch,
            &CodecOptions::default(),
        )
    };
    assert!(matches!(
        read(RegionSelector::full(2)),
        Err(ReadError::BlockFetch(BlockFetchError::MissingChunk(id))) if id.as_u64() == 2
    ));
    assert!(matches!(
        read(RegionSelector::from_iter([Some(2u64), None])),
        Err(ReadError::BlockFetch(_))
    ));
    // blocks 0 and 1 are unaffected
    let region = read(RegionSelector::from_iter([Some(1u64), None])).unwrap();
    assert_eq!(region.bytes(), &[4, 5, 6, 7]);
}

fn store_and_read(codec: CodecConfiguration, shape: &[u64], block_shape: &[u64]) {
    let store = Arc::new(MemoryStore::new());
    let num_elements = usize::try_from(shape.iter().product::<u64>()).unwrap();
    let values: Vec<u32> = (0..num_elements as u32).map(|i| i * 7 + 1).collect();
    let elements: Vec<u8> = bytemuck::cast_slice(&values).to_vec();

    let array = ChunkedArray::create(
        store.clone(),
        "/group/array",
        shape.to_vec(),
        block_shape.to_vec(),
        size_of::<u32>(),
        codec.clone(),
    )
    .unwrap();
    array.store_metadata().unwrap();
    array.store(&elements).unwrap();

    let array = ChunkedArray::open(store.clone(), "/group/array").unwrap();
    assert_eq!(array.metadata().codec, codec);
    assert_eq!(array.retrieve().unwrap(), elements);

    // the first row of complete blocks
    let trimmed: Vec<u64> = std::iter::zip(shape, block_shape)
        .map(|(s, b)| s / b * b)
        .collect();
    let mut selector = vec![AxisSelector::Full; shape.len()];
    selector[0] = AxisSelector::Index(0);
    let region = array.read_region(&RegionSelector::new(selector)).unwrap();
    let row_length = usize::try_from(trimmed[trimmed.len() - 1]).unwrap();
    assert_eq!(
        region.num_elements(),
        trimmed[1..].iter().product::<u64>()
    );
    if shape.len() == 2 {
        assert_eq!(
            region.to_elements::<u32>().unwrap(),
            values[..row_length].to_vec()
        );
    }

    let remainder = StoreKey::new("group/array/remainder").unwrap();
    if array.path() == LayoutPath::Exact {
        assert!(!store.keys().contains(&remainder));
    } else {
        assert!(store.keys().contains(&remainder));
    }
}

#[test]
fn chunked_array_identity() {
    store_and_read(CodecConfiguration::Identity, &[4, 4], &[2, 2]);
    store_and_read(CodecConfiguration::Identity, &[5, 5], &[2, 2]);
    store_and_read(CodecConfiguration::Identity, &[3, 7, 5], &[2, 3, 5]);
}

#[cfg(feature = "gzip")]
#[test]
fn chunked_array_gzip() {
    use blockorder::codec::{GzipCodecConfiguration, GzipCompressionLevel};
    let codec = CodecConfiguration::Gzip(GzipCodecConfiguration {
        level: GzipCompressionLevel::try_from(5).unwrap(),
    });
    store_and_read(codec.clone(), &[8, 8], &[4, 4]);
    store_and_read(codec, &[9, 10], &[4, 3]);
}

#[cfg(feature = "zstd")]
#[test]
fn chunked_array_zstd() {
    use blockorder::codec::{ZstdCodecConfiguration, ZstdCompressionLevel};
    let codec = CodecConfiguration::Zstd(ZstdCodecConfiguration {
        level: ZstdCompressionLevel::try_from(3).unwrap(),
        checksum: true,
    });
    store_and_read(codec.clone(), &[6, 6], &[3, 2]);
    store_and_read(codec, &[11, 5], &[4, 5]);
}

#[test]
fn chunked_array_5x5_aligned_region() {
    let store = Arc::new(MemoryStore::new());
    let array = ChunkedArray::create(
        store,
        "",
        vec![5, 5],
        vec![2, 2],
        1,
        CodecConfiguration::Identity,
    )
    .unwrap();
    assert_eq!(array.path(), LayoutPath::General);
    assert_eq!(array.metadata().num_chunks, 4);
    let elements: Vec<u8> = (0..25).collect();
    array.store(&elements).unwrap();

    let region = array.read_region(&RegionSelector::full(2)).unwrap();
    assert_eq!(region.shape(), &[4, 4]);
    assert_eq!(
        region.bytes(),
        &[0, 1, 2, 3, 5, 6, 7, 8, 10, 11, 12, 13, 15, 16, 17, 18]
    );
    let row = array
        .read_region(&RegionSelector::from_iter([Some(3u64), None]))
        .unwrap();
    assert_eq!(row.bytes(), &[15, 16, 17, 18]);

    // the last row and column are outside of complete blocks
    assert!(matches!(
        array.read_region(&RegionSelector::from_iter([4u64, 0])),
        Err(ChunkedArrayError::Read(ReadError::Resolve(
            ResolveError::InvalidSelector { axis: 0, index: 4, extent: 4 }
        )))
    ));
    assert_eq!(array.retrieve().unwrap(), elements);
}
