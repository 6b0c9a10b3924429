//! String-to-integer conversion for a single k-mer
//!
//! Nucleotides map to 2-bit codes (A=0, C=1, G=2, T=3, either case) and a
//! k-mer packs into a `u64` with the first base in the most significant
//! occupied group. Widths above [`MAX_K`] do not fit a 64-bit word and are
//! rejected up front wherever a width enters the crate.

use crate::error::{KmerError, Result};

/// Largest k-mer width representable in a 64-bit word (2 bits per base)
pub const MAX_K: usize = 32;

/// ASCII to 2-bit base codes; 0xFF marks an unencodable byte
static BASE_CODES: [u8; 256] = {
    let mut table = [0xFF; 256];
    table[b'A' as usize] = 0;
    table[b'a' as usize] = 0;
    table[b'C' as usize] = 1;
    table[b'c' as usize] = 1;
    table[b'G' as usize] = 2;
    table[b'g' as usize] = 2;
    table[b'T' as usize] = 3;
    table[b't' as usize] = 3;
    table
};

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Validates a k-mer width, failing fast on widths that do not fit a word
///
/// # Returns
///
/// * `Ok(())` for `1..=32`
/// * `Err(KmerError::UnsupportedK)` otherwise
pub fn check_k(k: usize) -> Result<()> {
    if k == 0 || k > MAX_K {
        return Err(KmerError::UnsupportedK(k).into());
    }
    Ok(())
}

/// Packs a nucleotide string into a 2-bit integer k-mer
///
/// Scans left to right, shifting the accumulator two bits per base. The
/// first unrecognized byte aborts the whole k-mer and discards any
/// accumulated progress: the result is `None`, never a partial value.
/// Encoding is case-insensitive. The window must be at most [`MAX_K`]
/// bases; longer input is a caller error.
///
/// # Examples
///
/// ```
/// use kfset::kmer;
///
/// assert_eq!(kmer::encode(b"ACGT"), Some(0b0001_1011));
/// assert_eq!(kmer::encode(b"acgt"), Some(0b0001_1011));
/// assert_eq!(kmer::encode(b"ACNT"), None);
/// ```
#[must_use]
pub fn encode(seq: &[u8]) -> Option<u64> {
    debug_assert!(seq.len() <= MAX_K);
    let mut x = 0u64;
    for &b in seq {
        let code = BASE_CODES[b as usize];
        if code > 3 {
            return None;
        }
        x = (x << 2) | u64::from(code);
    }
    Some(x)
}

/// Unpacks a 2-bit integer k-mer, appending `k` bases to `out`
///
/// Extracts the low two bits at a time and restores the original left-to-
/// right orientation. Output is always exactly `k` uppercase bases, so a
/// round trip through [`encode`] is case-normalizing.
///
/// # Examples
///
/// ```
/// use kfset::kmer;
///
/// let x = kmer::encode(b"gattaca").unwrap();
/// let mut out = Vec::new();
/// kmer::decode(7, x, &mut out);
/// assert_eq!(out, b"GATTACA");
/// ```
pub fn decode(k: usize, x: u64, out: &mut Vec<u8>) {
    debug_assert!(k <= MAX_K);
    let start = out.len();
    out.resize(start + k, 0);
    let mut x = x;
    for i in (0..k).rev() {
        out[start + i] = BASES[(x & 3) as usize];
        x >>= 2;
    }
}
