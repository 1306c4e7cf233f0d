//! Performance benchmarks for cloak-aead.
//!
//! Run with: `cargo bench -p cloak-aead`
//!
//! Compares the portable session against the kernel-driven session across
//! the message sizes the upstream throughput harness used.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use cloak_aead::{AeadSession, ChaCha20Poly1305, KernelSession, SoftKernel};

const SIZES: [usize; 6] = [64, 256, 1024, 8192, 16384, 65536];

const KEY: [u8; 32] = [0x42u8; 32];
const NONCE: [u8; 12] = [0x24u8; 12];
const AAD: &[u8] = b"benchmark associated data";

fn bench_portable_seal(c: &mut Criterion) {
    let mut group = c.benchmark_group("portable_seal");

    for size in SIZES {
        let plaintext = vec![0xAA; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut session = ChaCha20Poly1305::new(&KEY, &NONCE, AAD).unwrap();
                let ct = session.encrypt(black_box(&plaintext)).unwrap();
                let tag = session.mac();
                (ct, tag)
            })
        });
    }

    group.finish();
}

fn bench_portable_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("portable_open");

    for size in SIZES {
        let plaintext = vec![0xAA; size];
        let mut seal = ChaCha20Poly1305::new(&KEY, &NONCE, AAD).unwrap();
        let ciphertext = seal.encrypt(&plaintext).unwrap();
        let tag = seal.mac();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut session = ChaCha20Poly1305::new(&KEY, &NONCE, AAD).unwrap();
                let pt = session.decrypt(black_box(&ciphertext)).unwrap();
                let ok = session.verify(black_box(&tag));
                (pt, ok)
            })
        });
    }

    group.finish();
}

fn bench_kernel_seal(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel_seal");

    for size in SIZES {
        let plaintext = vec![0xAA; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut session =
                    KernelSession::new(SoftKernel::new(), &KEY, &NONCE, AAD).unwrap();
                let ct = session.encrypt(black_box(&plaintext)).unwrap();
                let tag = session.mac();
                (ct, tag)
            })
        });
    }

    group.finish();
}

fn bench_streaming_chunks(c: &mut Criterion) {
    let mut group = c.benchmark_group("portable_seal_streaming");

    // fixed 64 KiB message, varying chunk granularity
    let plaintext = vec![0xBB; 65536];
    for chunk in [256usize, 1024, 16384] {
        group.throughput(Throughput::Bytes(plaintext.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut session = ChaCha20Poly1305::new(&KEY, &NONCE, AAD).unwrap();
                let mut out = Vec::with_capacity(plaintext.len());
                for piece in plaintext.chunks(chunk) {
                    out.extend(session.encrypt(black_box(piece)).unwrap());
                }
                (out, session.mac())
            })
        });
    }

    group.finish();
}

criterion_group!(
    aead_benches,
    bench_portable_seal,
    bench_portable_open,
    bench_kernel_seal,
    bench_streaming_chunks,
);

criterion_main!(aead_benches);
