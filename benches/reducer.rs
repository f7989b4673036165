//! Benchmarks of the host-side fold

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gpu_pi::partition::Partition;
use gpu_pi::reducer::reduce;

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce");

    for workers in [256u32, 65_536, 4_194_304].iter() {
        let partition = Partition::new(u64::from(*workers) * 1_000, *workers).expect("valid partition");
        let counts = vec![676u32; *workers as usize];

        group.bench_with_input(BenchmarkId::from_parameter(workers), &counts, |b, counts| {
            b.iter(|| reduce(black_box(counts), &partition))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reduce);
criterion_main!(benches);
