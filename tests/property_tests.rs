//! Property-based tests for the CLOAK AEAD
//!
//! Uses proptest to verify invariants across large input spaces.

use proptest::prelude::*;

// ============================================================================
// AEAD Session Properties
// ============================================================================

mod session_properties {
    use super::*;
    use cloak_aead::{AeadSession, ChaCha20Poly1305};
    use cloak_integration_tests::chunk_by_sizes;

    proptest! {
        /// Encrypt then decrypt over fresh sessions recovers the plaintext,
        /// and both sides compute the same tag.
        #[test]
        fn aead_roundtrip(
            key in any::<[u8; 32]>(),
            nonce in any::<[u8; 12]>(),
            aad in prop::collection::vec(any::<u8>(), 1..64),
            plaintext in prop::collection::vec(any::<u8>(), 0..1024),
        ) {
            let mut seal = ChaCha20Poly1305::new(&key, &nonce, &aad).unwrap();
            let ciphertext = seal.encrypt(&plaintext).unwrap();
            prop_assert_eq!(ciphertext.len(), plaintext.len());
            let tag = seal.mac();

            let mut open = ChaCha20Poly1305::new(&key, &nonce, &aad).unwrap();
            let decrypted = open.decrypt(&ciphertext).unwrap();
            prop_assert_eq!(&decrypted, &plaintext);
            prop_assert!(open.verify(&tag));
        }

        /// Any chunking of the plaintext yields the same ciphertext and tag
        /// as a single-shot encryption.
        #[test]
        fn streaming_equivalence(
            key in any::<[u8; 32]>(),
            nonce in any::<[u8; 12]>(),
            aad in prop::collection::vec(any::<u8>(), 1..48),
            plaintext in prop::collection::vec(any::<u8>(), 1..2048),
            sizes in prop::collection::vec(1usize..97, 1..12),
        ) {
            let mut whole = ChaCha20Poly1305::new(&key, &nonce, &aad).unwrap();
            let expected = whole.encrypt(&plaintext).unwrap();
            let expected_tag = whole.mac();

            let mut chunked = ChaCha20Poly1305::new(&key, &nonce, &aad).unwrap();
            let mut out = Vec::with_capacity(plaintext.len());
            for piece in chunk_by_sizes(&plaintext, &sizes) {
                out.extend(chunked.encrypt(piece).unwrap());
            }

            prop_assert_eq!(out, expected);
            prop_assert_eq!(chunked.mac(), expected_tag);
        }

        /// Flipping any single bit of the ciphertext defeats verification,
        /// deterministically.
        #[test]
        fn ciphertext_tamper_detected(
            key in any::<[u8; 32]>(),
            nonce in any::<[u8; 12]>(),
            aad in prop::collection::vec(any::<u8>(), 1..32),
            plaintext in prop::collection::vec(any::<u8>(), 1..256),
            bit in 0usize..8,
            pos_seed in any::<usize>(),
        ) {
            let mut seal = ChaCha20Poly1305::new(&key, &nonce, &aad).unwrap();
            let mut ciphertext = seal.encrypt(&plaintext).unwrap();
            let tag = seal.mac();

            let pos = pos_seed % ciphertext.len();
            ciphertext[pos] ^= 1 << bit;

            let mut open = ChaCha20Poly1305::new(&key, &nonce, &aad).unwrap();
            let _ = open.decrypt(&ciphertext).unwrap();
            prop_assert!(!open.verify(&tag));
        }

        /// Flipping any single bit of the tag defeats verification.
        #[test]
        fn tag_tamper_detected(
            key in any::<[u8; 32]>(),
            nonce in any::<[u8; 12]>(),
            aad in prop::collection::vec(any::<u8>(), 1..32),
            plaintext in prop::collection::vec(any::<u8>(), 0..128),
            bit in 0usize..8,
            pos in 0usize..16,
        ) {
            let mut seal = ChaCha20Poly1305::new(&key, &nonce, &aad).unwrap();
            let ciphertext = seal.encrypt(&plaintext).unwrap();
            let tag = seal.mac();

            let mut bad = *tag.as_bytes();
            bad[pos] ^= 1 << bit;
            let bad = cloak_aead::Tag::from_bytes(bad);

            let mut open = ChaCha20Poly1305::new(&key, &nonce, &aad).unwrap();
            let _ = open.decrypt(&ciphertext).unwrap();
            prop_assert!(!open.verify(&bad));
        }

        /// The decrypt direction accumulates the same MAC state as the
        /// encrypt direction for the same wire bytes, chunked differently.
        #[test]
        fn decrypt_chunking_matches_tag(
            key in any::<[u8; 32]>(),
            nonce in any::<[u8; 12]>(),
            aad in prop::collection::vec(any::<u8>(), 1..32),
            plaintext in prop::collection::vec(any::<u8>(), 1..1024),
            sizes in prop::collection::vec(1usize..61, 1..8),
        ) {
            let mut seal = ChaCha20Poly1305::new(&key, &nonce, &aad).unwrap();
            let ciphertext = seal.encrypt(&plaintext).unwrap();
            let tag = seal.mac();

            let mut open = ChaCha20Poly1305::new(&key, &nonce, &aad).unwrap();
            let mut recovered = Vec::with_capacity(ciphertext.len());
            for piece in chunk_by_sizes(&ciphertext, &sizes) {
                recovered.extend(open.decrypt(piece).unwrap());
            }
            prop_assert_eq!(recovered, plaintext);
            prop_assert!(open.verify(&tag));
        }
    }
}

// ============================================================================
// Reference Implementation Oracle
// ============================================================================

mod oracle_properties {
    use super::*;
    use chacha20poly1305::{
        ChaCha20Poly1305 as Oracle,
        aead::{Aead, KeyInit, Payload},
    };
    use cloak_aead::{AeadSession, ChaCha20Poly1305};

    proptest! {
        /// Ciphertext and tag agree with the RustCrypto implementation for
        /// random inputs.
        #[test]
        fn matches_reference_implementation(
            key in any::<[u8; 32]>(),
            nonce in any::<[u8; 12]>(),
            aad in prop::collection::vec(any::<u8>(), 1..64),
            plaintext in prop::collection::vec(any::<u8>(), 0..512),
        ) {
            let oracle = Oracle::new((&key).into());
            let reference = oracle
                .encrypt(
                    (&nonce).into(),
                    Payload {
                        msg: &plaintext,
                        aad: &aad,
                    },
                )
                .unwrap();
            let (ref_ct, ref_tag) = reference.split_at(plaintext.len());

            let mut session = ChaCha20Poly1305::new(&key, &nonce, &aad).unwrap();
            let ciphertext = session.encrypt(&plaintext).unwrap();
            let tag = session.mac();

            prop_assert_eq!(&ciphertext[..], ref_ct);
            prop_assert_eq!(&tag.as_bytes()[..], ref_tag);
        }
    }
}
