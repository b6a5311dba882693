//! PDD arithmetic benchmarks.
//!
//! These exercise the evaluator on realistic workloads: dense products of
//! binomials (exponentially many monomials, heavy node allocation) and
//! Gröbner-style reductions (cache-friendly repeated spine walks).
//!
//! Run with:
//! ```bash
//! cargo bench --bench pdd_bench
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use num_bigint::BigInt;
use num_rational::BigRational;
use pdd_rs::{Pdd, PddManager};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn q(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

/// The product (x0 + 1)(x1 + 2)...(x_{n-1} + n): 2^n monomials.
fn dense_product(m: &PddManager, n: u32) -> Pdd<'_> {
    let mut p = m.one();
    for i in 0..n {
        let x = m.mk_var(i).unwrap();
        let f = m.add_scalar(q(i as i64 + 1), &x).unwrap();
        p = m.mul(&p, &f).unwrap();
    }
    p
}

fn bench_dense_product(c: &mut Criterion) {
    let mut group = c.benchmark_group("dense_product");
    for n in [8u32, 12, 16] {
        group.throughput(Throughput::Elements(1 << n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let m = PddManager::new(n);
                let p = dense_product(&m, n);
                assert_eq!(m.degree(&p), n);
            });
        });
    }
    group.finish();
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce");
    for n in [8u32, 12] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let m = PddManager::new(n);
            let p = dense_product(&m, n);
            let x0 = m.mk_var(0).unwrap();
            let x1 = m.mk_var(1).unwrap();
            let d = m.add_scalar(q(-1), &m.mul(&x0, &x1).unwrap()).unwrap();
            b.iter(|| {
                let r = m.reduce(&p, &d).unwrap();
                assert!(!r.is_zero());
            });
        });
    }
    group.finish();
}

fn bench_random_sums(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_combinations");
    group.bench_function("sum_1000", |b| {
        let m = PddManager::new(8);
        let vars: Vec<_> = (0..8).map(|i| m.mk_var(i).unwrap()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        b.iter(|| {
            let mut p = m.zero();
            for _ in 0..1000 {
                let v = &vars[rng.gen_range(0..vars.len())];
                let t = m.mul_scalar(q(rng.gen_range(-9..=9)), v).unwrap();
                p = m.add(&p, &t).unwrap();
            }
            p
        });
    });
    group.finish();
}

criterion_group!(benches, bench_dense_product, bench_reduce, bench_random_sums);
criterion_main!(benches);
