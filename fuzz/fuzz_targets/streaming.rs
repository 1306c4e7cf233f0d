//! Fuzz target for streaming equivalence
//!
//! Any chunking of the input must produce the same ciphertext and tag as a
//! single-shot encryption, on both backends.

#![no_main]

use arbitrary::Arbitrary;
use cloak_aead::{AeadSession, ChaCha20Poly1305, KernelSession, SoftKernel};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct StreamingInput {
    key: [u8; 32],
    nonce: [u8; 12],
    aad: Vec<u8>,
    plaintext: Vec<u8>,
    cuts: Vec<u8>,
    staging: u16,
}

fuzz_target!(|input: StreamingInput| {
    if input.aad.is_empty() {
        return;
    }

    let mut whole = ChaCha20Poly1305::new(&input.key, &input.nonce, &input.aad).unwrap();
    let expected = whole.encrypt(&input.plaintext).unwrap();
    let expected_tag = whole.mac();

    // portable session, arbitrary chunk boundaries
    let mut chunked = ChaCha20Poly1305::new(&input.key, &input.nonce, &input.aad).unwrap();
    let mut out = Vec::with_capacity(input.plaintext.len());
    let mut offset = 0;
    let mut cut = 0;
    while offset < input.plaintext.len() {
        let step = usize::from(*input.cuts.get(cut).unwrap_or(&1))
            .max(1)
            .min(input.plaintext.len() - offset);
        out.extend(
            chunked
                .encrypt(&input.plaintext[offset..offset + step])
                .unwrap(),
        );
        offset += step;
        cut += 1;
    }
    assert_eq!(out, expected);
    assert_eq!(chunked.mac(), expected_tag);

    // kernel session with an arbitrary bounded staging region
    let mut kernel = KernelSession::with_staging_capacity(
        SoftKernel::new(),
        &input.key,
        &input.nonce,
        &input.aad,
        usize::from(input.staging).max(1),
    )
    .unwrap();
    let kernel_ct = kernel.encrypt(&input.plaintext).unwrap();
    assert_eq!(kernel_ct, expected);
    assert_eq!(kernel.mac(), expected_tag);
});
