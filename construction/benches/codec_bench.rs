// Transaction codec benchmarks for the Zilliqa construction adapter.
//
// Covers parsing the wire form, computing core bytes and hashing, plus
// hashing with growing `data` payloads.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use zil_construction::config::CHAIN_ID_TESTNET;
use zil_construction::transaction::{NativeTransaction, TransactionCodec};

const SENDER_KEY: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
const RECIPIENT: &str = "zil135un5ghygahlsgfduyl7ryuau23rdu98f354v4";

fn signed_blob(codec: &TransactionCodec, data: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "version": codec.version(),
        "nonce": 7,
        "toAddr": RECIPIENT,
        "amount": "1000000000000",
        "pubKey": SENDER_KEY,
        "gasPrice": "2000000000",
        "gasLimit": "50",
        "code": "",
        "data": data,
        "signature": "5a".repeat(64),
        "priority": false,
    }))
    .unwrap()
}

fn sample(codec: &TransactionCodec, data: &str) -> NativeTransaction {
    codec.parse(&signed_blob(codec, data)).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let codec = TransactionCodec::new(CHAIN_ID_TESTNET);
    let blob = signed_blob(&codec, "");

    c.bench_function("codec/parse", |b| {
        b.iter(|| codec.parse(&blob).unwrap());
    });
}

fn bench_core_bytes(c: &mut Criterion) {
    let codec = TransactionCodec::new(CHAIN_ID_TESTNET);
    let tx = sample(&codec, "");

    c.bench_function("codec/core_bytes", |b| {
        b.iter(|| codec.core_bytes(&tx).unwrap());
    });
}

fn bench_hash(c: &mut Criterion) {
    let codec = TransactionCodec::new(CHAIN_ID_TESTNET);
    let tx = sample(&codec, "");

    c.bench_function("codec/hash", |b| {
        b.iter(|| codec.hash(&tx).unwrap());
    });
}

fn bench_hash_with_data(c: &mut Criterion) {
    let codec = TransactionCodec::new(CHAIN_ID_TESTNET);
    let mut group = c.benchmark_group("codec/hash_data");

    for size in [64usize, 1024, 16 * 1024] {
        let tx = sample(&codec, &"x".repeat(size));

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &tx, |b, tx| {
            b.iter(|| codec.hash(tx).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_core_bytes,
    bench_hash,
    bench_hash_with_data,
);
criterion_main!(benches);
