//! Benchmark the layout transform on the exact and general paths.
#![allow(missing_docs)]

use blockorder::{Direction, PartitionLayout};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn layout_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_transform");
    for (name, size) in [("exact", 256u64), ("general", 250u64)] {
        let layout = PartitionLayout::<8>::new(&[size; 3], &[32; 3]).unwrap();
        let num_elements = layout.num_elements_padded();
        group.throughput(Throughput::Bytes(num_elements as u64));
        for direction in [Direction::Forward, Direction::Inverse] {
            group.bench_with_input(
                BenchmarkId::new(name, direction),
                &direction,
                |b, &direction| {
                    let src = vec![1u8; num_elements];
                    let mut dest = vec![0u8; num_elements];
                    b.iter(|| {
                        layout.transform(&src, &mut dest, 1, direction).unwrap();
                    });
                },
            );
        }
    }
    group.finish();
}

fn layout_gather_aligned(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_gather_aligned");
    for size in &[64u64, 128u64, 250u64] {
        let layout = PartitionLayout::<8>::new(&[*size; 3], &[16; 3]).unwrap();
        let num_elements = layout.num_elements_padded();
        group.throughput(Throughput::Bytes(layout.num_elements_aligned() as u64 * 4));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            let buffer = vec![1u8; num_elements * 4];
            b.iter(|| layout.gather_aligned(&buffer, 4).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, layout_transform, layout_gather_aligned);
criterion_main!(benches);
