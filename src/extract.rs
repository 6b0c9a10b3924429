//! Sliding-window k-mer extraction over a nucleotide sequence

use crate::error::Result;
use crate::{bits, kmer};

/// Lazy iterator over the packed k-mers of a sequence
///
/// Slides a width-`k` window across the sequence one base at a time and
/// yields each window that [`kmer::encode`] accepts. Windows containing an
/// unencodable byte produce no output for that offset; the scan simply
/// moves on. The all-`A` k-mer packs to 0 and is yielded like any other.
///
/// With [`both_strands`](Self::both_strands) enabled, every encoded k-mer
/// is immediately followed by its reverse complement, interleaved per
/// offset in the same single pass.
///
/// # Examples
///
/// ```
/// use kfset::{kmer, KmerIter};
///
/// let kmers: Vec<u64> = KmerIter::new(2, b"ACGTN").unwrap().collect();
/// assert_eq!(kmers, vec![
///     kmer::encode(b"AC").unwrap(),
///     kmer::encode(b"CG").unwrap(),
///     kmer::encode(b"GT").unwrap(),
/// ]);
/// ```
pub struct KmerIter<'a> {
    k: usize,
    seq: &'a [u8],
    offset: usize,
    both_strands: bool,
    pending: Option<u64>,
}

impl<'a> KmerIter<'a> {
    /// Creates an iterator over the width-`k` windows of `seq`
    ///
    /// # Returns
    ///
    /// * `Ok(KmerIter)` - for widths in `1..=32`
    /// * `Err(KmerError::UnsupportedK)` - for any other width
    pub fn new(k: usize, seq: &'a [u8]) -> Result<Self> {
        kmer::check_k(k)?;
        Ok(Self {
            k,
            seq,
            offset: 0,
            both_strands: false,
            pending: None,
        })
    }

    /// Interleaves the reverse complement after each yielded k-mer
    #[must_use]
    pub fn both_strands(mut self) -> Self {
        self.both_strands = true;
        self
    }
}

impl Iterator for KmerIter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if let Some(rc) = self.pending.take() {
            return Some(rc);
        }
        while self.offset + self.k <= self.seq.len() {
            let window = &self.seq[self.offset..self.offset + self.k];
            self.offset += 1;
            if let Some(x) = kmer::encode(window) {
                if self.both_strands {
                    self.pending = Some(bits::reverse_complement(self.k, x));
                }
                return Some(x);
            }
        }
        None
    }
}
