//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Benchmarks for charcodec throughput

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use iristerm_charcodec::{CharsetCodec, Encoding, decode, encode};
use tokio_util::codec::Decoder;

fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

// ============================================================================
// Decoding Benchmarks
// ============================================================================

fn bench_decode_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_sizes");

    for size in [64usize, 1024, 16384] {
        let bytes = sample_bytes(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("legacy", size), &bytes, |b, bytes| {
            b.iter(|| decode(black_box(bytes), Encoding::Legacy8Bit));
        });

        let text = "USER>write \"שלום\",! ".repeat(size / 16 + 1);
        group.bench_with_input(BenchmarkId::new("utf8", size), text.as_bytes(), |b, bytes| {
            b.iter(|| decode(black_box(bytes), Encoding::Utf8));
        });
    }

    group.finish();
}

fn bench_codec_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_stream");
    let text = "%SYS>do ^%SS\r\n".repeat(256);

    group.bench_function("utf8_chunk", |b| {
        let mut codec = CharsetCodec::new(Encoding::Utf8);
        b.iter(|| {
            let mut src = BytesMut::from(text.as_bytes());
            while let Some(chunk) = codec.decode(&mut src).unwrap() {
                black_box(chunk);
            }
        });
    });

    group.finish();
}

// ============================================================================
// Encoding Benchmarks
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let text = "zn \"ישראל\" write $zv ".repeat(64);

    group.bench_function("legacy", |b| {
        b.iter(|| encode(black_box(&text), Encoding::Legacy8Bit));
    });
    group.bench_function("utf8", |b| {
        b.iter(|| encode(black_box(&text), Encoding::Utf8));
    });

    group.finish();
}

criterion_group!(benches, bench_decode_sizes, bench_codec_stream, bench_encode);
criterion_main!(benches);
