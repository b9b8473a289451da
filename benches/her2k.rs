//! her2k kernel comparison
//!
//! Times the rayon-parallel kernel against the serial reference routine on
//! the same seeded column-major problems.
//!
//! # Usage:
//! ```bash
//! cargo bench --bench her2k
//! cargo bench --bench her2k -- her2k_256x64
//! ```

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use her2kbench::element::Precision;
use her2kbench::linalg::{blas, reference};
use her2kbench::params::{Order, ProblemDescriptor, Transpose, Uplo};
use her2kbench::report::OP_FACTOR;
use her2kbench::stage::generate;
use num::Complex;

fn bench_her2k_by_size(c: &mut Criterion) {
    let sizes = [(64, 16), (256, 64), (512, 128)];

    for (n, k) in sizes {
        let mut group = c.benchmark_group(format!("her2k_{n}x{k}"));
        group.sample_size(20);

        let p = ProblemDescriptor::new(
            Precision::Single,
            Order::ColumnMajor,
            Uplo::Upper,
            Transpose::NoTrans,
            n,
            k,
        )
        .with_multipliers(Complex::new(1.0, 0.5), 1.0);
        group.throughput(Throughput::Elements(p.problem_size() * OP_FACTOR));

        let host = match generate::<f32>(&p, 42) {
            Ok(host) => host,
            Err(err) => panic!("generating {n}x{k}: {err}"),
        };
        let alpha = Complex::new(p.alpha.re as f32, p.alpha.im as f32);
        let beta = p.beta as f32;

        group.bench_function(BenchmarkId::new("parallel", n), |bench| {
            let mut out = host.back_c.clone();
            bench.iter(|| {
                blas::her2k::her2k(
                    p.order,
                    p.uplo,
                    p.trans_a,
                    n,
                    k,
                    alpha,
                    black_box(&host.a),
                    p.lda,
                    black_box(&host.b),
                    p.ldb,
                    beta,
                    black_box(&mut out),
                    p.ldc,
                )
            })
        });

        group.bench_function(BenchmarkId::new("reference", n), |bench| {
            let mut out = host.back_c.clone();
            bench.iter(|| {
                reference::her2k(
                    p.order,
                    p.uplo,
                    p.trans_a,
                    n,
                    k,
                    alpha,
                    black_box(&host.a),
                    0,
                    p.lda,
                    black_box(&host.b),
                    0,
                    p.ldb,
                    beta,
                    black_box(&mut out),
                    0,
                    p.ldc,
                )
            })
        });

        group.finish();
    }
}

criterion_group!(benches, bench_her2k_by_size);
criterion_main!(benches);
