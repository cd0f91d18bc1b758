use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use amg_interp::{CscBuilder, CscMatrix, SkeletonConfig, StopRule, interp_skel};

/// 5-point Laplacian on a k x k grid with Dirichlet boundary.
fn laplacian_2d(k: usize) -> CscMatrix {
    let n = k * k;
    let mut b = CscBuilder::new(n, n);
    b.reserve(5 * n);
    for r in 0..k {
        for c in 0..k {
            let i = r * k + c;
            b.push(i, i, 4.0).unwrap();
            if c > 0 {
                b.push(i, i - 1, -1.0).unwrap();
            }
            if c + 1 < k {
                b.push(i, i + 1, -1.0).unwrap();
            }
            if r > 0 {
                b.push(i, i - k, -1.0).unwrap();
            }
            if r + 1 < k {
                b.push(i, i + k, -1.0).unwrap();
            }
        }
    }
    b.build().unwrap()
}

/// One target column per 2x2 block of grid points, unit entries.
fn block_targets(k: usize) -> CscMatrix {
    let n = k * k;
    let kc = k.div_ceil(2);
    let mut b = CscBuilder::new(n, kc * kc);
    for r in 0..k {
        for c in 0..k {
            let i = r * k + c;
            let j = (r / 2) * kc + c / 2;
            b.push(j, i, 1.0).unwrap();
        }
    }
    b.build().unwrap()
}

fn bench_interp_skel(c: &mut Criterion) {
    let mut group = c.benchmark_group("interp_skel");
    for &k in &[8usize, 16, 32] {
        let a = laplacian_2d(k);
        let b = block_targets(k);
        let diag = a.diagonal();
        let weights = vec![1.0; b.dim.ncols];

        group.throughput(Throughput::Elements(a.nnz() as u64));
        for (name, stop) in [("sum", StopRule::SumEntries), ("max", StopRule::MaxEntry)] {
            let config = SkeletonConfig {
                stop,
                ..Default::default()
            };
            group.bench_with_input(BenchmarkId::new(name, k), &k, |bench, _| {
                bench.iter(|| interp_skel(&a, &b, &diag, &weights, 1e-3, &config).unwrap());
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_interp_skel);
criterion_main!(benches);
