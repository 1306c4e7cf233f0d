//! Poly1305 one-time authenticator (RFC 8439).
//!
//! Accumulator arithmetic in redundant radix 2^13: the 130-bit running sum
//! and the clamped multiplier each live in ten 16-bit limbs, so the
//! schoolbook 10x10 product stays inside 32-bit intermediates. The carry
//! released at limb index 4 mid-multiplication is what keeps the partial
//! sums in range; it is part of the multiply, not an independent step.
//!
//! The one-time key MUST never authenticate more than one message.

use crate::error::AeadError;
use crate::{KEY_SIZE, TAG_SIZE};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Authenticator block size (16 bytes).
pub const BLOCK_SIZE: usize = 16;

/// Limb width in bits.
const LIMB_BITS: u32 = 13;

/// Low 13 bits of a limb.
const LIMB_MASK: u16 = 0x1fff;

#[inline]
fn load16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Poly1305 engine.
///
/// Absorbs 16-byte blocks into the accumulator and finalizes into a
/// 16-byte tag. Finalization consumes the accumulator: the padding block
/// it absorbs cannot be un-absorbed, so finalize exactly once per message.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Poly1305 {
    /// Accumulator, ten 13-bit limbs.
    h: [u16; 10],
    /// Clamped multiplier, ten 13-bit limbs.
    r: [u16; 10],
    /// Additive key half, eight 16-bit words.
    s: [u16; 8],
    /// Partial-block assembly buffer.
    buffer: [u8; BLOCK_SIZE],
    /// Bytes currently held in `buffer`, 0..16.
    buffered: usize,
    /// Set for the trailing short block: drops the implicit 2^128 bit.
    final_block: bool,
}

impl Poly1305 {
    /// Create an engine from a 32-byte one-time key: the first half is
    /// clamped into the multiplier `r`, the second half kept as the
    /// additive word array `s`.
    ///
    /// # Errors
    ///
    /// Returns `AeadError::InvalidKeyLength` if the key is not 32 bytes.
    pub fn new(one_time_key: &[u8]) -> Result<Self, AeadError> {
        if one_time_key.len() != KEY_SIZE {
            return Err(AeadError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: one_time_key.len(),
            });
        }

        let mut t = [0u16; 8];
        for i in 0..8 {
            t[i] = load16(one_time_key, i * 2);
        }

        // Clamp while re-windowing 16-bit words into 13-bit limbs. The
        // masks fold in the required zero bits: the top nibble of key
        // bytes 3, 7, 11, 15 and the low two bits of bytes 4, 8, 12.
        let r = [
            t[0] & 0x1fff,
            ((t[0] >> 13) | (t[1] << 3)) & 0x1fff,
            ((t[1] >> 10) | (t[2] << 6)) & 0x1f03,
            ((t[2] >> 7) | (t[3] << 9)) & 0x1fff,
            ((t[3] >> 4) | (t[4] << 12)) & 0x00ff,
            (t[4] >> 1) & 0x1ffe,
            ((t[4] >> 14) | (t[5] << 2)) & 0x1fff,
            ((t[5] >> 11) | (t[6] << 5)) & 0x1f81,
            ((t[6] >> 8) | (t[7] << 8)) & 0x1fff,
            (t[7] >> 5) & 0x007f,
        ];

        let mut s = [0u16; 8];
        for i in 0..8 {
            s[i] = load16(one_time_key, 16 + i * 2);
        }

        Ok(Self {
            h: [0u16; 10],
            r,
            s,
            buffer: [0u8; BLOCK_SIZE],
            buffered: 0,
            final_block: false,
        })
    }

    /// Accumulate one 16-byte block: add its 130-bit little-endian value
    /// (implicit high bit unless this is the final block) into `h`, then
    /// multiply `h` by `r` modulo 2^130 - 5.
    fn accumulate(&mut self, block: &[u8]) {
        debug_assert_eq!(block.len(), BLOCK_SIZE);

        let hibit: u16 = if self.final_block { 0 } else { 1 << 11 };

        let mut t = [0u16; 8];
        for i in 0..8 {
            t[i] = load16(block, i * 2);
        }

        let h = &mut self.h;
        h[0] += t[0] & LIMB_MASK;
        h[1] += ((t[0] >> 13) | (t[1] << 3)) & LIMB_MASK;
        h[2] += ((t[1] >> 10) | (t[2] << 6)) & LIMB_MASK;
        h[3] += ((t[2] >> 7) | (t[3] << 9)) & LIMB_MASK;
        h[4] += ((t[3] >> 4) | (t[4] << 12)) & LIMB_MASK;
        h[5] += (t[4] >> 1) & LIMB_MASK;
        h[6] += ((t[4] >> 14) | (t[5] << 2)) & LIMB_MASK;
        h[7] += ((t[5] >> 11) | (t[6] << 5)) & LIMB_MASK;
        h[8] += ((t[6] >> 8) | (t[7] << 8)) & LIMB_MASK;
        h[9] += (t[7] >> 5) | hibit;

        // h *= r (mod 2^130 - 5). Off-diagonal limbs wrap past 2^130, so
        // they re-enter scaled by 5. Releasing the carry after the fifth
        // partial product keeps every d[i] below 2^32.
        let mut d = [0u32; 10];
        let mut carry: u32 = 0;
        for i in 0..10 {
            d[i] = carry;
            for j in 0..10 {
                let factor = if j <= i {
                    self.r[i - j]
                } else {
                    5 * self.r[i + 10 - j]
                };
                d[i] += u32::from(self.h[j]) * u32::from(factor);
                if j == 4 {
                    carry = d[i] >> LIMB_BITS;
                    d[i] &= u32::from(LIMB_MASK);
                }
            }
            carry += d[i] >> LIMB_BITS;
            d[i] &= u32::from(LIMB_MASK);
        }

        // Fold the top carry back in at 5x and settle the low limbs.
        carry = carry * 5 + d[0];
        d[0] = carry & u32::from(LIMB_MASK);
        carry >>= LIMB_BITS;
        d[1] += carry;

        for i in 0..10 {
            self.h[i] = d[i] as u16;
        }
    }

    /// Absorb `data`, carrying a short tail across calls in the internal
    /// buffer. Every complete 16-byte block is accumulated immediately.
    pub fn absorb(&mut self, data: &[u8]) {
        let mut input = data;

        if self.buffered > 0 {
            let want = (BLOCK_SIZE - self.buffered).min(input.len());
            self.buffer[self.buffered..self.buffered + want].copy_from_slice(&input[..want]);
            self.buffered += want;
            input = &input[want..];
            if self.buffered < BLOCK_SIZE {
                return;
            }
            let block = self.buffer;
            self.accumulate(&block);
            self.buffered = 0;
        }

        let mut blocks = input.chunks_exact(BLOCK_SIZE);
        for block in blocks.by_ref() {
            self.accumulate(block);
        }

        let tail = blocks.remainder();
        if !tail.is_empty() {
            self.buffer[..tail.len()].copy_from_slice(tail);
            self.buffered = tail.len();
        }
    }

    /// Finalize into the 16-byte tag.
    ///
    /// Pads a trailing short block with a single `1` byte then zeros (with
    /// the implicit high bit dropped), propagates carries, reduces modulo
    /// 2^130 - 5 with a mask select instead of a data-dependent branch,
    /// repacks into eight 16-bit words, and adds the second key half with
    /// carry.
    pub fn finish(&mut self) -> [u8; TAG_SIZE] {
        if self.buffered > 0 {
            self.buffer[self.buffered] = 1;
            for byte in &mut self.buffer[self.buffered + 1..] {
                *byte = 0;
            }
            self.final_block = true;
            let block = self.buffer;
            self.accumulate(&block);
            self.buffered = 0;
        }

        let h = &mut self.h;

        let mut c = h[1] >> LIMB_BITS;
        h[1] &= LIMB_MASK;
        for i in 2..10 {
            h[i] += c;
            c = h[i] >> LIMB_BITS;
            h[i] &= LIMB_MASK;
        }
        h[0] += c * 5;
        c = h[0] >> LIMB_BITS;
        h[0] &= LIMB_MASK;
        h[1] += c;
        c = h[1] >> LIMB_BITS;
        h[1] &= LIMB_MASK;
        h[2] += c;

        // g = h + 5 - 2^130; keep whichever of h/g did not underflow,
        // selected by mask so the comparison outcome stays out of the
        // branch predictor.
        let mut g = [0u16; 10];
        g[0] = h[0] + 5;
        c = g[0] >> LIMB_BITS;
        g[0] &= LIMB_MASK;
        for i in 1..10 {
            g[i] = h[i] + c;
            c = g[i] >> LIMB_BITS;
            g[i] &= LIMB_MASK;
        }
        g[9] = g[9].wrapping_sub(1 << 13);

        let mut mask = (g[9] >> 15).wrapping_sub(1);
        for limb in &mut g {
            *limb &= mask;
        }
        mask = !mask;
        for i in 0..10 {
            h[i] = (h[i] & mask) | g[i];
        }

        // Repack ten 13-bit limbs into eight 16-bit words.
        h[0] |= h[1] << 13;
        h[1] = (h[1] >> 3) | (h[2] << 10);
        h[2] = (h[2] >> 6) | (h[3] << 7);
        h[3] = (h[3] >> 9) | (h[4] << 4);
        h[4] = (h[4] >> 12) | (h[5] << 1) | (h[6] << 14);
        h[5] = (h[6] >> 2) | (h[7] << 11);
        h[6] = (h[7] >> 5) | (h[8] << 8);
        h[7] = (h[8] >> 8) | (h[9] << 5);

        // tag = (h + s) mod 2^128, word-wise with carry.
        let mut f = u32::from(h[0]) + u32::from(self.s[0]);
        h[0] = f as u16;
        for i in 1..8 {
            f = u32::from(h[i]) + u32::from(self.s[i]) + (f >> 16);
            h[i] = f as u16;
        }

        let mut tag = [0u8; TAG_SIZE];
        for i in 0..8 {
            tag[i * 2..i * 2 + 2].copy_from_slice(&h[i].to_le_bytes());
        }
        tag
    }

    /// Serialized engine state size.
    pub(crate) const SNAPSHOT_LEN: usize = 10 * 2 + 10 * 2 + 8 * 2 + BLOCK_SIZE + 4 + 1;

    /// Serialize the full working state into `out`, little-endian limbs
    /// first, then the partial buffer, fill count, and final-block flag.
    pub(crate) fn snapshot_into(&self, out: &mut [u8]) {
        for (i, limb) in self.h.iter().enumerate() {
            out[i * 2..i * 2 + 2].copy_from_slice(&limb.to_le_bytes());
        }
        for (i, limb) in self.r.iter().enumerate() {
            out[20 + i * 2..20 + i * 2 + 2].copy_from_slice(&limb.to_le_bytes());
        }
        for (i, word) in self.s.iter().enumerate() {
            out[40 + i * 2..40 + i * 2 + 2].copy_from_slice(&word.to_le_bytes());
        }
        out[56..72].copy_from_slice(&self.buffer);
        out[72..76].copy_from_slice(&(self.buffered as u32).to_le_bytes());
        out[76] = u8::from(self.final_block);
    }

    /// Rebuild an engine from a snapshot produced by `snapshot_into`.
    pub(crate) fn from_snapshot(bytes: &[u8]) -> Self {
        let mut h = [0u16; 10];
        let mut r = [0u16; 10];
        let mut s = [0u16; 8];
        for i in 0..10 {
            h[i] = load16(bytes, i * 2);
            r[i] = load16(bytes, 20 + i * 2);
        }
        for i in 0..8 {
            s[i] = load16(bytes, 40 + i * 2);
        }
        let mut buffer = [0u8; BLOCK_SIZE];
        buffer.copy_from_slice(&bytes[56..72]);
        let buffered =
            u32::from_le_bytes([bytes[72], bytes[73], bytes[74], bytes[75]]) as usize;
        let final_block = bytes[76] != 0;
        Self {
            h,
            r,
            s,
            buffer,
            buffered,
            final_block,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_hex(hex: &str) -> Vec<u8> {
        hex::decode(hex).unwrap()
    }

    #[test]
    fn test_tag_rfc8439_2_5_2() {
        // RFC 8439 Section 2.5.2
        let key = decode_hex(
            "85d6be7857556d337f4452fe42d506a80103808afb0db2fd4abff6af4149f51b",
        );
        let msg = b"Cryptographic Forum Research Group";

        let mut engine = Poly1305::new(&key).unwrap();
        engine.absorb(msg);
        let tag = engine.finish();

        assert_eq!(tag.to_vec(), decode_hex("a8061dc1305136c6c22b8baf0c0127a9"));
    }

    #[test]
    fn test_clamping_masks_key_bits() {
        // An all-ones first half must clamp down to the permitted pattern.
        let key = [0xffu8; 32];
        let engine = Poly1305::new(&key).unwrap();

        assert_eq!(engine.r[2], 0x1f03);
        assert_eq!(engine.r[4], 0x00ff);
        assert_eq!(engine.r[5], 0x1ffe);
        assert_eq!(engine.r[7], 0x1f81);
        assert_eq!(engine.r[9], 0x007f);
    }

    #[test]
    fn test_absorb_chunking_matches_one_shot() {
        let key = decode_hex(
            "85d6be7857556d337f4452fe42d506a80103808afb0db2fd4abff6af4149f51b",
        );
        let msg: Vec<u8> = (0..77u8).collect();

        let mut whole = Poly1305::new(&key).unwrap();
        whole.absorb(&msg);
        let expected = whole.finish();

        // splits landing inside, at, and across block boundaries
        let mut chunked = Poly1305::new(&key).unwrap();
        chunked.absorb(&msg[..1]);
        chunked.absorb(&msg[1..16]);
        chunked.absorb(&msg[16..47]);
        chunked.absorb(&msg[47..]);
        assert_eq!(chunked.finish(), expected);
    }

    #[test]
    fn test_short_message_padding() {
        // A 3-byte message exercises the 0x01-then-zeros pad and the
        // dropped high bit on the final block.
        let key = [0x02u8; 32];

        let mut engine = Poly1305::new(&key).unwrap();
        engine.absorb(&[0xde, 0xad, 0xbe]);
        let short = engine.finish();

        // Explicitly padding to 16 bytes is NOT equivalent: the padded
        // variant is a full block and keeps its implicit high bit.
        let mut full = Poly1305::new(&key).unwrap();
        let mut padded = [0u8; 16];
        padded[..3].copy_from_slice(&[0xde, 0xad, 0xbe]);
        padded[3] = 1;
        full.absorb(&padded);
        assert_ne!(full.finish(), short);
    }

    #[test]
    fn test_rejects_short_key() {
        assert!(matches!(
            Poly1305::new(&[0u8; 16]),
            Err(AeadError::InvalidKeyLength {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_snapshot_roundtrip_with_partial_block() {
        let key = decode_hex(
            "85d6be7857556d337f4452fe42d506a80103808afb0db2fd4abff6af4149f51b",
        );
        let mut engine = Poly1305::new(&key).unwrap();
        engine.absorb(&[0x11u8; 21]);

        let mut snap = [0u8; Poly1305::SNAPSHOT_LEN];
        engine.snapshot_into(&mut snap);
        let mut restored = Poly1305::from_snapshot(&snap);

        engine.absorb(&[0x22u8; 40]);
        restored.absorb(&[0x22u8; 40]);
        assert_eq!(engine.finish(), restored.finish());
    }
}
