//! # CLOAK AEAD
//!
//! Streaming `ChaCha20-Poly1305` authenticated encryption (RFC 8439).
//!
//! This crate provides:
//! - A portable `ChaCha20` keystream engine and `Poly1305` one-time
//!   authenticator
//! - A streaming AEAD session: encrypt/decrypt in arbitrary chunks, then
//!   finalize to a 128-bit tag
//! - A narrow kernel capability contract for accelerated backends, plus a
//!   bundled portable kernel, both producing bit-identical output
//! - Constant-time tag verification
//!
//! ## Cryptographic Suite
//!
//! | Function | Algorithm | Security Level |
//! |----------|-----------|----------------|
//! | Stream Cipher | ChaCha20 | 256-bit key |
//! | MAC | Poly1305 | 128-bit tag |
//! | AEAD Composition | RFC 8439 | IND-CCA2 |
//!
//! ## Usage
//!
//! ```ignore
//! use cloak_aead::{AeadSession, ChaCha20Poly1305};
//!
//! let mut seal = ChaCha20Poly1305::new(&key, &nonce, b"header")?;
//! let ciphertext = seal.encrypt(b"secret")?;
//! let tag = seal.mac();
//!
//! let mut open = ChaCha20Poly1305::new(&key, &nonce, b"header")?;
//! let plaintext = open.decrypt(&ciphertext)?;
//! assert!(open.verify(&tag));
//! ```
//!
//! Nonce uniqueness per key is a caller invariant: reusing a nonce under
//! the same key forfeits both confidentiality and integrity. The session
//! holds no key material beyond its own lifetime; all key-derived state is
//! zeroized on drop.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod chacha;
pub mod constant_time;
pub mod error;
pub mod kernel;
pub mod material;
pub mod poly1305;
pub mod session;

pub use error::AeadError;
pub use kernel::{AeadKernel, CONTEXT_LEN, KernelSession, SoftKernel};
pub use material::{Key, Nonce, Tag};
pub use session::{AeadSession, ChaCha20Poly1305};

/// Key size (32 bytes / 256 bits)
pub const KEY_SIZE: usize = 32;

/// Nonce size (12 bytes / 96 bits)
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (16 bytes / 128 bits)
pub const TAG_SIZE: usize = 16;
