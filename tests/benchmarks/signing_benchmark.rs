//! Benchmarks for the request hot path
//!
//! - HMAC signing under each venue scheme
//! - Precision inference from sample strings
//! - Status normalization lookups

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tradegate_exchanges::auth::{Nonce, Params};
use tradegate_exchanges::precision::infer_granularity;
use tradegate_exchanges::prelude::*;
use tradegate_exchanges::status::RawStatus;
use tradegate_exchanges::Method;

fn order_params() -> Params {
    Params::new()
        .with("symbol", "ETHBTC")
        .with("side", "BUY")
        .with("type", "LIMIT")
        .with("timeInForce", "GTC")
        .with("quantity", "1.25000000")
        .with("price", "0.03124500")
        .with("recvWindow", "5000")
}

fn bench_signing(c: &mut Criterion) {
    let params = order_params();
    let credentials = Credentials::new("bench-api-key", "bench-secret-key");
    let url = "https://api.example.com/api/v3/order";

    let venues: [(&str, Box<dyn Venue>); 3] = [
        ("binance", Box::new(Binance::new())),
        ("bitpie", Box::new(Bitpie::new())),
        ("bgogo", Box::new(Bgogo::new())),
    ];

    let mut group = c.benchmark_group("sign");
    for (name, venue) in &venues {
        let signer = Signer::new(credentials.clone(), venue.signing_scheme());
        group.bench_function(*name, |b| {
            b.iter(|| signer.sign(Method::Post, url, black_box(&params), Nonce(1_700_000_000_000)))
        });
    }
    group.finish();
}

fn bench_inference(c: &mut Criterion) {
    c.bench_function("infer_granularity", |b| {
        b.iter(|| infer_granularity(black_box("0.03124500")))
    });
}

fn bench_status(c: &mut Criterion) {
    let mapping = Binance::new().status_mapping().clone();
    let raw = RawStatus::Token("PARTIALLY_FILLED".to_string());
    c.bench_function("normalize_status", |b| b.iter(|| mapping.normalize(black_box(&raw))));
}

criterion_group!(benches, bench_signing, bench_inference, bench_status);
criterion_main!(benches);
