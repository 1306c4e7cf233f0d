//! Fuzz target for the AEAD session state machine
//!
//! Drives encrypt/decrypt/mac/verify with arbitrary inputs; nothing may
//! panic, and verification must accept exactly the genuine tag.

#![no_main]

use arbitrary::Arbitrary;
use cloak_aead::{AeadSession, ChaCha20Poly1305, Tag};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct SessionInput {
    key: [u8; 32],
    nonce: [u8; 12],
    aad: Vec<u8>,
    plaintext: Vec<u8>,
    candidate: [u8; 16],
}

fuzz_target!(|input: SessionInput| {
    // empty AAD must be rejected, never panic
    let Ok(mut seal) = ChaCha20Poly1305::new(&input.key, &input.nonce, &input.aad) else {
        assert!(input.aad.is_empty());
        return;
    };

    let ciphertext = seal.encrypt(&input.plaintext).unwrap();
    assert_eq!(ciphertext.len(), input.plaintext.len());
    let tag = seal.mac();

    // finalized session refuses further data
    assert!(seal.encrypt(b"x").is_err());

    // decrypt side recovers the plaintext and the genuine tag verifies
    let mut open = ChaCha20Poly1305::new(&input.key, &input.nonce, &input.aad).unwrap();
    let decrypted = open.decrypt(&ciphertext).unwrap();
    assert_eq!(decrypted, input.plaintext);

    let candidate = Tag::from_bytes(input.candidate);
    let genuine = *tag.as_bytes() == input.candidate;
    assert_eq!(open.verify(&candidate), genuine);
});
