//! Streaming `ChaCha20-Poly1305` AEAD session.
//!
//! The session derives the Poly1305 one-time key from `ChaCha20` block
//! zero, authenticates the associated data up front, streams plaintext or
//! ciphertext through both engines in arbitrary chunks, and finalizes to a
//! 16-byte tag over `aad || pad || ciphertext || pad || lengths`.
//!
//! Streaming is exact: any chunking of the input produces the same
//! ciphertext and the same tag as a single call over the concatenation.

use crate::chacha::ChaCha20;
use crate::constant_time;
use crate::error::AeadError;
use crate::material::Tag;
use crate::poly1305::Poly1305;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 16-byte zero block for boundary padding.
const ZERO_PAD: [u8; 16] = [0u8; 16];

/// Streaming AEAD contract.
///
/// Implemented by the portable session and by kernel-driven sessions; the
/// backend is selected by the caller, and every implementation produces
/// bit-identical ciphertext and tags for identical inputs.
pub trait AeadSession {
    /// Encrypt the next plaintext chunk, returning ciphertext of the same
    /// length.
    ///
    /// # Errors
    ///
    /// Returns `AeadError::Finalized` once `mac` has been called.
    fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, AeadError>;

    /// Decrypt the next ciphertext chunk, returning plaintext of the same
    /// length.
    ///
    /// # Errors
    ///
    /// Returns `AeadError::Finalized` once `mac` has been called.
    fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, AeadError>;

    /// Finalize the session and return the authentication tag.
    ///
    /// The first call absorbs the padding and length trailer and freezes
    /// the MAC state; later calls return the same tag.
    fn mac(&mut self) -> Tag;

    /// Verify a candidate tag in constant time.
    ///
    /// A mismatch is a normal outcome, reported as `false`.
    fn verify(&mut self, candidate: &Tag) -> bool;
}

/// Portable streaming `ChaCha20-Poly1305` session.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ChaCha20Poly1305 {
    cipher: ChaCha20,
    auth: Poly1305,
    /// Associated data length in bytes.
    #[zeroize(skip)]
    aad_len: u64,
    /// Cumulative ciphertext length in bytes, identical whether driven
    /// through encrypt or decrypt.
    #[zeroize(skip)]
    data_len: u64,
    /// Tag cached by the first `mac` call; the session is terminal once
    /// this is set.
    #[zeroize(skip)]
    tag: Option<Tag>,
}

impl ChaCha20Poly1305 {
    /// Create a session.
    ///
    /// Block counter 0 keys the authenticator: one 64-byte keystream block
    /// is generated, its leading 32 bytes become the Poly1305 one-time key
    /// and the trailing 32 are discarded. Data blocks start at counter 1.
    /// The associated data is absorbed immediately and zero-padded to the
    /// next 16-byte boundary.
    ///
    /// # Errors
    ///
    /// Returns `AeadError::InvalidKeyLength` / `AeadError::InvalidNonceLength`
    /// on bad material lengths and `AeadError::InvalidAssociatedData` if
    /// `aad` is empty.
    pub fn new(key: &[u8], nonce: &[u8], aad: &[u8]) -> Result<Self, AeadError> {
        if aad.is_empty() {
            return Err(AeadError::InvalidAssociatedData);
        }

        let mut cipher = ChaCha20::new(key, nonce, 0)?;
        let block = cipher.transform(&[0u8; 64])?;
        let mut auth = Poly1305::new(&block[..32])?;

        auth.absorb(aad);
        if aad.len() & 0xf != 0 {
            auth.absorb(&ZERO_PAD[..16 - (aad.len() & 0xf)]);
        }

        Ok(Self {
            cipher,
            auth,
            aad_len: aad.len() as u64,
            data_len: 0,
            tag: None,
        })
    }

    fn seal_chunk(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, AeadError> {
        if self.tag.is_some() {
            return Err(AeadError::Finalized);
        }
        if plaintext.is_empty() {
            return Ok(Vec::new());
        }

        let mut ciphertext = plaintext.to_vec();
        self.seal_in_place(&mut ciphertext);
        Ok(ciphertext)
    }

    fn open_chunk(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, AeadError> {
        if self.tag.is_some() {
            return Err(AeadError::Finalized);
        }
        if ciphertext.is_empty() {
            return Ok(Vec::new());
        }

        let mut plaintext = ciphertext.to_vec();
        self.open_in_place(&mut plaintext);
        Ok(plaintext)
    }

    /// Encrypt `data` in place and authenticate the resulting ciphertext.
    pub(crate) fn seal_in_place(&mut self, data: &mut [u8]) {
        self.cipher.xor_in_place(data);
        self.auth.absorb(data);
        self.data_len += data.len() as u64;
    }

    /// Authenticate `data` as wire-format ciphertext, then decrypt it in
    /// place. The tag covers the ciphertext, so the absorb comes first.
    pub(crate) fn open_in_place(&mut self, data: &mut [u8]) {
        self.auth.absorb(data);
        self.cipher.xor_in_place(data);
        self.data_len += data.len() as u64;
    }

    // Context snapshot layout, offsets derived from the component sizes
    // rather than hard-coded addresses. The blob is opaque to callers and
    // backend-specific; this is the portable layout.
    pub(crate) const CIPHER_OFFSET: usize = 0;
    pub(crate) const AUTH_OFFSET: usize = Self::CIPHER_OFFSET + ChaCha20::SNAPSHOT_LEN;
    pub(crate) const AAD_LEN_OFFSET: usize = Self::AUTH_OFFSET + Poly1305::SNAPSHOT_LEN;
    pub(crate) const DATA_LEN_OFFSET: usize = Self::AAD_LEN_OFFSET + 8;
    /// Serialized session state size.
    pub(crate) const SNAPSHOT_LEN: usize = Self::DATA_LEN_OFFSET + 8;

    /// Serialize the full working state (both engines plus the accumulated
    /// lengths) into `out`. Everything a backend multiplexing several
    /// sessions over one workspace needs to checkpoint is included.
    pub(crate) fn snapshot_into(&self, out: &mut [u8]) {
        self.cipher
            .snapshot_into(&mut out[Self::CIPHER_OFFSET..Self::AUTH_OFFSET]);
        self.auth
            .snapshot_into(&mut out[Self::AUTH_OFFSET..Self::AAD_LEN_OFFSET]);
        out[Self::AAD_LEN_OFFSET..Self::DATA_LEN_OFFSET]
            .copy_from_slice(&self.aad_len.to_le_bytes());
        out[Self::DATA_LEN_OFFSET..Self::SNAPSHOT_LEN]
            .copy_from_slice(&self.data_len.to_le_bytes());
    }

    /// Rebuild a session from a snapshot produced by `snapshot_into`.
    /// Snapshots are only taken of unfinalized sessions.
    pub(crate) fn from_snapshot(bytes: &[u8]) -> Self {
        let mut aad_len = [0u8; 8];
        aad_len.copy_from_slice(&bytes[Self::AAD_LEN_OFFSET..Self::DATA_LEN_OFFSET]);
        let mut data_len = [0u8; 8];
        data_len.copy_from_slice(&bytes[Self::DATA_LEN_OFFSET..Self::SNAPSHOT_LEN]);

        Self {
            cipher: ChaCha20::from_snapshot(&bytes[Self::CIPHER_OFFSET..Self::AUTH_OFFSET]),
            auth: Poly1305::from_snapshot(&bytes[Self::AUTH_OFFSET..Self::AAD_LEN_OFFSET]),
            aad_len: u64::from_le_bytes(aad_len),
            data_len: u64::from_le_bytes(data_len),
            tag: None,
        }
    }

    fn finalize(&mut self) -> Tag {
        if let Some(tag) = self.tag {
            return tag;
        }

        if self.data_len & 0xf != 0 {
            self.auth.absorb(&ZERO_PAD[..16 - (self.data_len & 0xf) as usize]);
        }

        // Length trailer: aad_len and data_len, each a little-endian
        // 32-bit word with a hard zero high word. Lengths of 2^32 bytes or
        // more truncate, matching the construction this replaces.
        let mut trailer = [0u8; 16];
        trailer[..4].copy_from_slice(&(self.aad_len as u32).to_le_bytes());
        trailer[8..12].copy_from_slice(&(self.data_len as u32).to_le_bytes());
        self.auth.absorb(&trailer);

        let tag = Tag::from_bytes(self.auth.finish());
        self.tag = Some(tag);
        tag
    }
}

impl AeadSession for ChaCha20Poly1305 {
    fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, AeadError> {
        self.seal_chunk(plaintext)
    }

    fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, AeadError> {
        self.open_chunk(ciphertext)
    }

    fn mac(&mut self) -> Tag {
        self.finalize()
    }

    fn verify(&mut self, candidate: &Tag) -> bool {
        let tag = self.finalize();
        constant_time::verify_16(tag.as_bytes(), candidate.as_bytes())
    }
}
