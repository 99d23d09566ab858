use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use bsbi_index::builder::{BuilderOptions, Indexer};
use bsbi_index::documents::from_documents;
use helpers::documents::create_collection;
use rand::{rngs::StdRng, SeedableRng};
use temp_dir::TempDir;

fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);

    // Create the collection
    const NUM_DOCS: usize = 5_000;
    let documents = create_collection(NUM_DOCS, 2_000, 30, &mut rng);

    let mut group = c.benchmark_group("build");
    for (block_size, threads) in [(200, None), (10_000, None), (200, Some(4))] {
        let id = BenchmarkId::new(
            format!("threads-{}", threads.unwrap_or(1)),
            block_size,
        );
        group.bench_with_input(id, &block_size, |b, &block_size| {
            b.iter(|| {
                let dir = TempDir::new().expect("Could not create temporary directory");
                let options = BuilderOptions {
                    block_size,
                    threads,
                    ..Default::default()
                };
                Indexer::new(dir.path(), &options)
                    .expect("Invalid options")
                    .build(from_documents(documents.clone()))
                    .expect("Error while building the index")
            })
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
}
criterion_main!(benches);
