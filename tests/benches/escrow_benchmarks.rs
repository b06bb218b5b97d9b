//! Escrow hot-path benchmarks.
//!
//! Covers the pure work every booking goes through: condition
//! generation, fulfillment verification and transaction construction.

use courtpay_escrow::{
    build_escrow_create, generate_condition_triple, verify_fulfillment, EscrowCreateParams,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const PAYER: &str = "rN7n7otQDd6FczFgLdSqtcsAUxDkw6fzRH";
const PAYEE: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";

fn bench_condition_generation(c: &mut Criterion) {
    c.bench_function("hashlock/generate_condition_triple", |b| {
        b.iter(|| black_box(generate_condition_triple()))
    });
}

fn bench_fulfillment_verification(c: &mut Criterion) {
    let triple = generate_condition_triple();
    c.bench_function("hashlock/verify_fulfillment", |b| {
        b.iter(|| {
            black_box(verify_fulfillment(
                triple.fulfillment.as_str(),
                &triple.condition,
            ))
        })
    });
}

fn bench_escrow_create_build(c: &mut Criterion) {
    let triple = generate_condition_triple();
    c.bench_function("tx_builder/build_escrow_create", |b| {
        b.iter(|| {
            black_box(build_escrow_create(EscrowCreateParams {
                owner: PAYER.to_string(),
                destination: PAYEE.to_string(),
                amount: "30.0".to_string(),
                condition: triple.condition.clone(),
                memo: Some("bench".to_string()),
                booking_id: None,
            }))
        })
    });
}

criterion_group!(
    benches,
    bench_condition_generation,
    bench_fulfillment_verification,
    bench_escrow_create_build
);
criterion_main!(benches);
