//! `ChaCha20` stream cipher engine (RFC 8439).
//!
//! Owns the 16-word parameter block and a 64-byte keystream buffer, and
//! XORs caller data against the keystream on demand. Encrypt and decrypt
//! are the same operation.
//!
//! State layout: words 0-3 are the "expand 32-byte k" constants, words
//! 4-11 the key (little-endian), word 12 the 32-bit block counter, words
//! 13-15 the nonce. The counter wraps modulo 2^32; a caller exceeding 2^32
//! blocks under one nonce silently wraps, which is a limit of the
//! construction itself.

use crate::error::AeadError;
use crate::{KEY_SIZE, NONCE_SIZE};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Keystream block size (64 bytes).
pub const BLOCK_SIZE: usize = 64;

/// "expand 32-byte k", as four little-endian words.
const SIGMA: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

const ROUNDS: usize = 20;

#[inline]
fn load32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// The basic operation of the `ChaCha` algorithm: mixes four words of the
/// state in place.
#[inline]
fn quarter_round(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] = (state[d] ^ state[a]).rotate_left(16);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_left(12);
    state[a] = state[a].wrapping_add(state[b]);
    state[d] = (state[d] ^ state[a]).rotate_left(8);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_left(7);
}

/// `ChaCha20` keystream engine.
///
/// Produces 64-byte keystream blocks with an incrementing block counter
/// and transforms caller data byte-wise against them.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ChaCha20 {
    /// Parameter block: constants, key, counter, nonce.
    state: [u32; 16],
    /// Current keystream block.
    keystream: [u8; BLOCK_SIZE],
    /// Consumed bytes of the current block, 0..=64.
    cursor: usize,
}

impl ChaCha20 {
    /// Create an engine over `key` and `nonce`, starting at
    /// `initial_counter`.
    ///
    /// The AEAD construction reserves counter 0 for deriving the Poly1305
    /// one-time key; data blocks start at counter 1.
    ///
    /// # Errors
    ///
    /// Returns `AeadError::InvalidKeyLength` / `AeadError::InvalidNonceLength`
    /// if `key` is not 32 bytes or `nonce` is not 12 bytes.
    pub fn new(key: &[u8], nonce: &[u8], initial_counter: u32) -> Result<Self, AeadError> {
        if key.len() != KEY_SIZE {
            return Err(AeadError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: key.len(),
            });
        }
        if nonce.len() != NONCE_SIZE {
            return Err(AeadError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: nonce.len(),
            });
        }

        let mut state = [0u32; 16];
        state[..4].copy_from_slice(&SIGMA);
        for i in 0..8 {
            state[4 + i] = load32(key, i * 4);
        }
        state[12] = initial_counter;
        for i in 0..3 {
            state[13 + i] = load32(nonce, i * 4);
        }

        Ok(Self {
            state,
            keystream: [0u8; BLOCK_SIZE],
            cursor: 0,
        })
    }

    /// Run the block function: copy the parameter block, mix it for ten
    /// double rounds (column then diagonal), add the pre-mix state back in
    /// word-wise, serialize little-endian into the keystream buffer, and
    /// advance the block counter (wrapping).
    fn generate_block(&mut self) {
        let mut mix = self.state;

        for _ in 0..ROUNDS / 2 {
            quarter_round(&mut mix, 0, 4, 8, 12);
            quarter_round(&mut mix, 1, 5, 9, 13);
            quarter_round(&mut mix, 2, 6, 10, 14);
            quarter_round(&mut mix, 3, 7, 11, 15);

            quarter_round(&mut mix, 0, 5, 10, 15);
            quarter_round(&mut mix, 1, 6, 11, 12);
            quarter_round(&mut mix, 2, 7, 8, 13);
            quarter_round(&mut mix, 3, 4, 9, 14);
        }

        for (i, word) in mix.iter().enumerate() {
            let sum = word.wrapping_add(self.state[i]);
            self.keystream[i * 4..i * 4 + 4].copy_from_slice(&sum.to_le_bytes());
        }

        self.state[12] = self.state[12].wrapping_add(1);
    }

    /// XOR `data` against the keystream, generating new blocks as the
    /// cursor crosses a 64-byte boundary. Encrypt and decrypt are this
    /// same operation.
    ///
    /// # Errors
    ///
    /// Returns `AeadError::EmptyInput` for zero-length `data`; the raw
    /// engine keeps this defensive check, callers that accept empty chunks
    /// skip the call instead.
    pub fn transform(&mut self, data: &[u8]) -> Result<Vec<u8>, AeadError> {
        if data.is_empty() {
            return Err(AeadError::EmptyInput);
        }

        let mut output = data.to_vec();
        self.xor_in_place(&mut output);
        Ok(output)
    }

    /// In-place variant of [`transform`](Self::transform) without the
    /// empty-input guard; a zero-length slice is a no-op.
    pub(crate) fn xor_in_place(&mut self, data: &mut [u8]) {
        for byte in data {
            if self.cursor == 0 || self.cursor == BLOCK_SIZE {
                self.generate_block();
                self.cursor = 0;
            }
            *byte ^= self.keystream[self.cursor];
            self.cursor += 1;
        }
    }

    /// Serialized engine state size.
    pub(crate) const SNAPSHOT_LEN: usize = 16 * 4 + BLOCK_SIZE + 4;

    /// Serialize the full working state (parameter words, keystream
    /// buffer, cursor) into `out`, little-endian throughout.
    pub(crate) fn snapshot_into(&self, out: &mut [u8]) {
        for (i, word) in self.state.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
        }
        out[64..64 + BLOCK_SIZE].copy_from_slice(&self.keystream);
        out[128..132].copy_from_slice(&(self.cursor as u32).to_le_bytes());
    }

    /// Rebuild an engine from a snapshot produced by `snapshot_into`.
    pub(crate) fn from_snapshot(bytes: &[u8]) -> Self {
        let mut state = [0u32; 16];
        for (i, word) in state.iter_mut().enumerate() {
            *word = load32(bytes, i * 4);
        }
        let mut keystream = [0u8; BLOCK_SIZE];
        keystream.copy_from_slice(&bytes[64..64 + BLOCK_SIZE]);
        let cursor = load32(bytes, 128) as usize;
        Self {
            state,
            keystream,
            cursor,
        }
    }
}
