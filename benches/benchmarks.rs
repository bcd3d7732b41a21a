use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use ndarray_rand::RandomExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::Uniform;
use rsvd::{BackendSVD, NdarrayLinAlgBackend, Rsvd};

fn random_matrix(m: usize, n: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Array2::random_using((m, n), Uniform::new(0.0, 1.0), &mut rng)
}

/// Randomized factorization against the exact thin SVD it replaces.
fn bench_factorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("factorize");
    for &(m, n, rank) in &[(200, 120, 10), (400, 240, 10), (800, 480, 20)] {
        let a = random_matrix(m, n, 1234);
        let label = format!("{}x{}_k{}", m, n, rank);

        group.bench_with_input(BenchmarkId::new("randomized", &label), &a, |b, a| {
            let mut rsvd = Rsvd::with_seed(42);
            b.iter(|| rsvd.factorize(a, rank))
        });
        group.bench_with_input(BenchmarkId::new("exact_thin", &label), &a, |b, a| {
            b.iter(|| NdarrayLinAlgBackend.thin_svd(a).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_factorize);
criterion_main!(benches);
