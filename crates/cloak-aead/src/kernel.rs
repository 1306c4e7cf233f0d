//! Backend capability contract and kernel-driven sessions.
//!
//! An accelerated backend (for example a compiled module executing in a
//! bounded linear memory) is reduced to four primitive operations over an
//! opaque per-session context blob. The core stays backend-agnostic: it
//! chunks arbitrarily long inputs through a bounded staging buffer,
//! copies results back out, and carries the context across calls, so a
//! kernel multiplexed between sessions never leaks intermediate state
//! from one into another.
//!
//! Kernels are explicitly constructed, caller-owned handles; there is no
//! process-wide shared instance.

use crate::constant_time;
use crate::error::AeadError;
use crate::material::Tag;
use crate::session::{AeadSession, ChaCha20Poly1305};
use crate::TAG_SIZE;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Serialized session context size in bytes.
///
/// Computed from the component state layout: `ChaCha20` parameter words,
/// keystream buffer and cursor; Poly1305 limbs, partial-block buffer and
/// flags; and the two accumulated lengths.
pub const CONTEXT_LEN: usize = ChaCha20Poly1305::SNAPSHOT_LEN;

/// Default staging capacity for chunked copy-in/copy-out, sized to the
/// data region a single 64 KiB linear-memory page leaves free next to the
/// context and scratch areas.
pub const DEFAULT_STAGING_LEN: usize = 0xF000;

/// The capability contract an execution backend must satisfy.
///
/// All four operations act on a caller-provided context blob; the kernel
/// itself holds no per-session state between calls. Any backend with
/// equivalent 32-bit arithmetic semantics (the portable [`SoftKernel`], a
/// compiled module, ...) is interchangeable, and every implementation must
/// produce bit-identical ciphertext and tags.
pub trait AeadKernel {
    /// Initialize a fresh session context in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns the same validation errors as session construction:
    /// `InvalidKeyLength`, `InvalidNonceLength`, `InvalidAssociatedData`.
    fn init(
        &mut self,
        ctx: &mut [u8; CONTEXT_LEN],
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
    ) -> Result<(), AeadError>;

    /// Encrypt `data` in place, advancing the context.
    fn encrypt(&mut self, ctx: &mut [u8; CONTEXT_LEN], data: &mut [u8]);

    /// Authenticate and decrypt `data` in place, advancing the context.
    fn decrypt(&mut self, ctx: &mut [u8; CONTEXT_LEN], data: &mut [u8]);

    /// Finalize the context and write the 16-byte tag to `mac_out`.
    fn finish(&mut self, ctx: &mut [u8; CONTEXT_LEN], mac_out: &mut [u8; TAG_SIZE]);
}

/// Portable kernel: executes the engines directly over the serialized
/// context.
///
/// This is the reference implementation of the capability contract; an
/// accelerated kernel replaces the arithmetic, never the semantics.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftKernel;

impl SoftKernel {
    /// Create a portable kernel handle.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AeadKernel for SoftKernel {
    fn init(
        &mut self,
        ctx: &mut [u8; CONTEXT_LEN],
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
    ) -> Result<(), AeadError> {
        let session = ChaCha20Poly1305::new(key, nonce, aad)?;
        session.snapshot_into(ctx);
        Ok(())
    }

    fn encrypt(&mut self, ctx: &mut [u8; CONTEXT_LEN], data: &mut [u8]) {
        if data.is_empty() {
            return;
        }
        let mut session = ChaCha20Poly1305::from_snapshot(ctx);
        session.seal_in_place(data);
        session.snapshot_into(ctx);
    }

    fn decrypt(&mut self, ctx: &mut [u8; CONTEXT_LEN], data: &mut [u8]) {
        if data.is_empty() {
            return;
        }
        let mut session = ChaCha20Poly1305::from_snapshot(ctx);
        session.open_in_place(data);
        session.snapshot_into(ctx);
    }

    fn finish(&mut self, ctx: &mut [u8; CONTEXT_LEN], mac_out: &mut [u8; TAG_SIZE]) {
        let mut session = ChaCha20Poly1305::from_snapshot(ctx);
        let tag = session.mac();
        mac_out.copy_from_slice(tag.as_bytes());
        session.snapshot_into(ctx);
    }
}

/// AEAD session driven through a kernel backend.
///
/// Owns the kernel handle, the session's context blob, and a bounded
/// staging buffer. Inputs longer than the staging capacity are processed
/// in staging-sized slices; the chunking is invisible in the output.
pub struct KernelSession<K: AeadKernel> {
    kernel: K,
    /// Opaque serialized session state, round-trips through
    /// `snapshot`/`restore` exactly.
    ctx: [u8; CONTEXT_LEN],
    staging: Vec<u8>,
    tag: Option<Tag>,
}

impl<K: AeadKernel> Drop for KernelSession<K> {
    fn drop(&mut self) {
        // The context blob and staging buffer both carry key-derived
        // material.
        self.ctx.zeroize();
        self.staging.zeroize();
    }
}

impl<K: AeadKernel> ZeroizeOnDrop for KernelSession<K> {}

impl<K: AeadKernel> KernelSession<K> {
    /// Create a session over `kernel` with the default staging capacity.
    ///
    /// # Errors
    ///
    /// Returns `AeadError::InvalidKeyLength` / `AeadError::InvalidNonceLength`
    /// on bad material lengths and `AeadError::InvalidAssociatedData` if
    /// `aad` is empty.
    pub fn new(kernel: K, key: &[u8], nonce: &[u8], aad: &[u8]) -> Result<Self, AeadError> {
        Self::with_staging_capacity(kernel, key, nonce, aad, DEFAULT_STAGING_LEN)
    }

    /// Create a session with an explicit staging capacity.
    ///
    /// The capacity only bounds how much data is handed to the kernel per
    /// call; it never affects the ciphertext or tag. A capacity of zero is
    /// raised to one byte.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_staging_capacity(
        mut kernel: K,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        capacity: usize,
    ) -> Result<Self, AeadError> {
        let mut ctx = [0u8; CONTEXT_LEN];
        kernel.init(&mut ctx, key, nonce, aad)?;
        Ok(Self {
            kernel,
            ctx,
            staging: vec![0u8; capacity.max(1)],
            tag: None,
        })
    }

    /// Copy out the session's context snapshot.
    ///
    /// The blob is opaque and backend-specific; it is only meaningful to
    /// [`restore`](Self::restore) with a kernel of the same backend. Take
    /// snapshots before finalizing.
    #[must_use]
    pub fn snapshot(&self) -> [u8; CONTEXT_LEN] {
        self.ctx
    }

    /// Rebuild a session around `kernel` from a snapshot.
    #[must_use]
    pub fn restore(kernel: K, snapshot: &[u8; CONTEXT_LEN]) -> Self {
        Self {
            kernel,
            ctx: *snapshot,
            staging: vec![0u8; DEFAULT_STAGING_LEN],
            tag: None,
        }
    }

    fn crypt(&mut self, data: &[u8], decrypting: bool) -> Vec<u8> {
        let mut output = Vec::with_capacity(data.len());
        let capacity = self.staging.len();
        for chunk in data.chunks(capacity) {
            let staged = &mut self.staging[..chunk.len()];
            staged.copy_from_slice(chunk);
            if decrypting {
                self.kernel.decrypt(&mut self.ctx, staged);
            } else {
                self.kernel.encrypt(&mut self.ctx, staged);
            }
            output.extend_from_slice(staged);
        }
        output
    }
}

impl<K: AeadKernel> AeadSession for KernelSession<K> {
    fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, AeadError> {
        if self.tag.is_some() {
            return Err(AeadError::Finalized);
        }
        if plaintext.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.crypt(plaintext, false))
    }

    fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, AeadError> {
        if self.tag.is_some() {
            return Err(AeadError::Finalized);
        }
        if ciphertext.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.crypt(ciphertext, true))
    }

    fn mac(&mut self) -> Tag {
        if let Some(tag) = self.tag {
            return tag;
        }
        let mut mac_out = [0u8; TAG_SIZE];
        self.kernel.finish(&mut self.ctx, &mut mac_out);
        let tag = Tag::from_bytes(mac_out);
        self.tag = Some(tag);
        tag
    }

    fn verify(&mut self, candidate: &Tag) -> bool {
        let tag = self.mac();
        constant_time::verify_16(tag.as_bytes(), candidate.as_bytes())
    }
}
