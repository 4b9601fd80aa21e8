//! Performance benchmarks for the NDEF decoder.
//!
//! Measures decoding latency for the message shapes seen on real tags: a
//! single short URI record, the three-record companion app message and a
//! large long-form payload.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench ndef_bench
//! ```

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tagbridge_ndef::{decode_message, decode_records, decode_uri_payload};

/// Single URI record pointing at a Home Assistant tag.
fn uri_message() -> Vec<u8> {
    let url = b"home-assistant.io/tag/test123";
    let mut data = vec![0xD1, 0x01, (url.len() + 1) as u8, b'U', 0x04];
    data.extend_from_slice(url);
    data
}

/// URI record followed by two Android Application Records.
fn companion_message() -> Vec<u8> {
    let mut data = vec![0x91, 0x01, 0x1A, b'U', 0x04];
    data.extend_from_slice(b"home-assistant.io/tag/abc");
    data.extend_from_slice(&[0x14, 0x0F, 0x22]);
    data.extend_from_slice(b"android.com:pkg");
    data.extend_from_slice(b"io.homeassistant.companion.android");
    data.extend_from_slice(&[0x54, 0x0F, 0x2A]);
    data.extend_from_slice(b"android.com:pkg");
    data.extend_from_slice(b"io.homeassistant.companion.android.minimal");
    data
}

/// Single MIME record with a payload of `size` bytes.
fn large_message(size: usize) -> Vec<u8> {
    let mut data = vec![0xC2, 0x0A];
    data.extend_from_slice(&(size as u32).to_be_bytes());
    data.extend_from_slice(b"text/plain");
    data.extend(std::iter::repeat_n(b'x', size));
    data
}

/// Benchmark decoding small messages.
fn bench_decode_small(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_small");
    group.throughput(Throughput::Elements(1));

    let uri = uri_message();
    let companion = companion_message();

    group.bench_function("single_uri_record", |b| {
        b.iter(|| black_box(decode_records(black_box(&uri))));
    });

    group.bench_function("companion_message", |b| {
        b.iter(|| black_box(decode_records(black_box(&companion))));
    });

    group.finish();
}

/// Benchmark decoding large payloads from a shared buffer.
fn bench_decode_large(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_large");

    for size in [256usize, 4096, 65536] {
        let data = Bytes::from(large_message(size));
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(decode_message(black_box(data.clone()))));
        });
    }

    group.finish();
}

/// Benchmark URI prefix expansion.
fn bench_uri_expansion(c: &mut Criterion) {
    let payload = b"\x04home-assistant.io/tag/test123";

    c.bench_function("decode_uri_payload", |b| {
        b.iter(|| black_box(decode_uri_payload(black_box(payload))));
    });
}

criterion_group!(
    benches,
    bench_decode_small,
    bench_decode_large,
    bench_uri_expansion
);
criterion_main!(benches);
