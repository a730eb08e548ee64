use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fandv::fv::keygen_with_rng;
use fandv::parallel::{CancelToken, WorkerPool};
use fandv::params::presets::compact;
use fandv::ring::Poly;
use fandv::sampling::{Randomness, Sampler};

fn ring_ops(c: &mut Criterion) {
    let params = compact().unwrap();
    let d = params.ring_degree;
    let mut rng = Sampler::from_seed(0);
    let a = rng.uniform_poly(d, params.qpow);
    let b = rng.uniform_poly(d, params.qpow);
    let product = a.mul(&b);
    let phi = Poly::cyclotomic(d);

    c.bench_function("poly_mul_d64_q128", |bench| {
        bench.iter(|| black_box(&a).mul(black_box(&b)))
    });

    c.bench_function("fold_cyclotomic_d64", |bench| {
        bench.iter(|| {
            let mut p = product.clone();
            p.fold_cyclotomic(d);
            p
        })
    });

    c.bench_function("div_rem_monic_d64", |bench| {
        bench.iter(|| black_box(&product).div_rem_monic(&phi).unwrap())
    });
}

fn fv_ops(c: &mut Criterion) {
    let params = compact().unwrap();
    let mut rng = Sampler::from_seed(1);

    c.bench_function("fv_keygen", |b| {
        b.iter(|| keygen_with_rng(black_box(&params), &mut rng))
    });

    let (sk, pk, _) = keygen_with_rng(&params, &mut rng);
    c.bench_function("fv_encrypt", |b| {
        b.iter(|| pk.encrypt_with_rng(black_box(123_456), &mut rng))
    });

    let ct1 = pk.encrypt_with_rng(1000, &mut rng).unwrap();
    let ct2 = pk.encrypt_with_rng(-77, &mut rng).unwrap();
    c.bench_function("fv_decrypt", |b| b.iter(|| sk.decrypt(black_box(&ct1))));
    c.bench_function("fv_add", |b| {
        b.iter(|| black_box(&ct1).add(black_box(&ct2)))
    });
    c.bench_function("fv_mul", |b| {
        b.iter(|| black_box(&ct1).mul(black_box(&ct2)))
    });
}

fn collection_ops(c: &mut Criterion) {
    let params = compact().unwrap();
    let mut rng = Sampler::from_seed(2);
    let (_, pk, _) = keygen_with_rng(&params, &mut rng);
    let values: Vec<i64> = (0..16).collect();
    let m = pk.encrypt_matrix_with_rng(&values, 4, 4, &mut rng).unwrap();
    let v = m.to_vector();
    let pool = WorkerPool::global();

    let mut group = c.benchmark_group("collections");
    group.sample_size(10);
    group.bench_function("sum_serial_16", |b| b.iter(|| v.sum_serial()));
    group.bench_function("sum_parallel_16", |b| b.iter(|| v.sum_parallel()));
    group.bench_function("matmul_serial_4x4", |b| b.iter(|| m.matmul_serial(&m)));
    group.bench_function("matmul_parallel_4x4", |b| {
        b.iter(|| m.matmul_parallel_with(&pool, &m, &CancelToken::new()))
    });
    group.finish();
}

criterion_group!(benches, ring_ops, fv_ops, collection_ops);
criterion_main!(benches);
