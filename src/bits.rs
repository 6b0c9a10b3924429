//! Word-parallel operations over 2-bit packed k-mers
//!
//! Every function in this module treats a `u64` as 32 two-bit groups and
//! computes its result with whole-word masks and shifts instead of
//! per-base loops. Functions taking a width `k` expect the packed value to
//! occupy the low `2k` bits; mixing values of different widths in one call
//! is a caller error and is not checked.

const M1: u64 = 0x5555_5555_5555_5555;
const M2: u64 = 0x3333_3333_3333_3333;
const M3: u64 = 0x0F0F_0F0F_0F0F_0F0F;
const M4: u64 = 0x00FF_00FF_00FF_00FF;
const M5: u64 = 0x0000_FFFF_0000_FFFF;
const M6: u64 = 0x0000_0000_FFFF_FFFF;

/// Counts the set bits in a 64-bit word
///
/// Divide-and-conquer mask reduction: adjacent bits are summed into 2-bit
/// fields, then 4-bit, and so on up to the full word. Result is in [0, 64].
#[must_use]
pub fn popcount(x: u64) -> u32 {
    let x = (x & M1) + ((x >> 1) & M1);
    let x = (x & M2) + ((x >> 2) & M2);
    let x = (x & M3) + ((x >> 4) & M3);
    let x = (x & M4) + ((x >> 8) & M4);
    let x = (x & M5) + ((x >> 16) & M5);
    let x = (x & M6) + ((x >> 32) & M6);
    x as u32
}

/// Reverses the order of all 32 two-bit groups in a word
///
/// Pairwise swaps at widths 2, 4, 8, 16 and 32 bits. This is a full-word
/// operation, independent of any k-mer width: the groups that held the
/// first base end up at the top of the word.
#[must_use]
pub fn bit_pair_reverse(x: u64) -> u64 {
    let x = ((x >> 2) & M2) | ((x & M2) << 2);
    let x = ((x >> 4) & M3) | ((x & M3) << 4);
    let x = ((x >> 8) & M4) | ((x & M4) << 8);
    let x = ((x >> 16) & M5) | ((x & M5) << 16);
    ((x >> 32) & M6) | ((x & M6) << 32)
}

/// Computes the reverse complement of a packed k-mer
///
/// Invariant this relies on: under the A=00, C=01, G=10, T=11 encoding the
/// bitwise complement of every base code is its Watson-Crick partner
/// (00↔11, 01↔10). Complementing the whole word therefore complements all
/// bases at once, [`bit_pair_reverse`] restores base order, and the final
/// shift right-aligns the `k` meaningful groups. No lookup table needed.
///
/// # Examples
///
/// ```
/// use kfset::{bits, kmer};
///
/// let x = kmer::encode(b"AC").unwrap();
/// let rc = bits::reverse_complement(2, x);
/// assert_eq!(rc, kmer::encode(b"GT").unwrap());
/// ```
#[must_use]
pub fn reverse_complement(k: usize, x: u64) -> u64 {
    debug_assert!(k >= 1 && k <= 32);
    bit_pair_reverse(!x) >> (64 - 2 * k)
}

/// Counts the 2-bit groups in which two packed k-mers differ
///
/// XOR exposes differing bits; folding each group's high bit into its low
/// bit and masking leaves one set bit per differing group, which
/// [`popcount`] then counts. Differing groups, not differing raw bits.
#[must_use]
pub fn hamming_distance(x: u64, y: u64) -> u32 {
    let z = x ^ y;
    popcount((z | (z >> 1)) & M1)
}

/// Returns the 0-based index of the highest set bit
///
/// Range-halving comparisons against 0xFFFFFFFF, 0xFFFF, 0xFF, 0xF and 0x3
/// accumulate the index five bits at a time, with the final bit read off
/// directly. Policy for the degenerate input: `most_significant_bit(0)`
/// returns 0, the same index as input 1. Callers that can see a zero word
/// must treat it specially, as [`common_prefix_len`] does.
#[must_use]
pub fn most_significant_bit(x: u64) -> u32 {
    let mut r = u32::from(x > 0xFFFF_FFFF) << 5;
    let mut x = x >> r;
    let s = u32::from(x > 0xFFFF) << 4;
    x >>= s;
    r |= s;
    let s = u32::from(x > 0xFF) << 3;
    x >>= s;
    r |= s;
    let s = u32::from(x > 0xF) << 2;
    x >>= s;
    r |= s;
    let s = u32::from(x > 0x3) << 1;
    x >>= s;
    r |= s;
    r | (x as u32 >> 1)
}

/// Returns the length of the common prefix of two width-`k` k-mers
///
/// Equal inputs share all `k` bases. Otherwise the highest differing bit is
/// located, converted to a base position from the front of the k-mer, and
/// subtracted from `k`. The group index is `msb / 2 + 1`; the rounding here
/// is load-bearing, an off-by-one silently corrupts prefix comparisons.
///
/// # Examples
///
/// ```
/// use kfset::{bits, kmer};
///
/// let x = kmer::encode(b"ACGT").unwrap();
/// let y = kmer::encode(b"ACGA").unwrap();
/// assert_eq!(bits::common_prefix_len(4, x, y), 3);
/// ```
#[must_use]
pub fn common_prefix_len(k: usize, x: u64, y: u64) -> usize {
    if x == y {
        return k;
    }
    let group = most_significant_bit(x ^ y) as usize / 2 + 1;
    k - group
}
