//! Writing sorted k-mer frequency sets
//!
//! A write is one pass over an ascending `(kmer, count)` stream. The
//! reserved metadata (format tag, schema version, K) is merged with any
//! caller-supplied entries and fully validated before a sink is opened, so
//! a metadata conflict can never leave a half-created container behind.
//! Each record lands as `(delta from previous kmer, count)` through the
//! variable-length codec.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::container::{self, MetaValue, Metadata};
use crate::error::{HeaderError, Result, WriteError};
use crate::{kmer, varint};
use crate::{FORMAT_TAG, FORMAT_VERSION, META_K, META_TYPE, META_VERSION};

/// Writer for one k-mer frequency set
///
/// Records are pushed in strictly ascending k-mer order; the first record
/// may carry any value (including 0) and every later record must be
/// greater than its predecessor. An out-of-order push is a caller error
/// and fails immediately.
///
/// # Examples
///
/// ```
/// use kfset::FreqSetWriter;
///
/// let mut writer = FreqSetWriter::new(Vec::new(), 3, None).unwrap();
/// writer.push(0, 5).unwrap();
/// writer.push(2, 1).unwrap();
/// let bytes = writer.finish().unwrap();
/// assert!(!bytes.is_empty());
/// ```
#[derive(Debug)]
pub struct FreqSetWriter<W: Write> {
    inner: W,
    prev: u64,
    started: bool,
}

impl FreqSetWriter<BufWriter<File>> {
    /// Creates a frequency-set container at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - destination of the container file
    /// * `k` - shared k-mer width for every record, in `1..=32`
    /// * `extra` - caller metadata merged next to the reserved entries
    pub fn create<P: AsRef<Path>>(path: P, k: usize, extra: Option<&Metadata>) -> Result<Self> {
        // metadata is built and checked before the file exists
        let metadata = build_metadata(k, extra)?;
        let inner = container::make(path, &metadata)?;
        Ok(Self {
            inner,
            prev: 0,
            started: false,
        })
    }
}

impl<W: Write> FreqSetWriter<W> {
    /// Wraps an arbitrary sink, writing the container header immediately
    ///
    /// See [`create`](FreqSetWriter::create) for the file-backed variant.
    pub fn new(mut inner: W, k: usize, extra: Option<&Metadata>) -> Result<Self> {
        let metadata = build_metadata(k, extra)?;
        container::write_header(&mut inner, &metadata)?;
        Ok(Self {
            inner,
            prev: 0,
            started: false,
        })
    }

    /// Appends one `(kmer, count)` record
    ///
    /// # Returns
    ///
    /// * `Ok(())` - the record was encoded and written
    /// * `Err(WriteError::OutOfOrderRecord)` - the k-mer does not exceed
    ///   the previous one
    pub fn push(&mut self, kmer: u64, count: u64) -> Result<()> {
        if self.started && kmer <= self.prev {
            return Err(WriteError::OutOfOrderRecord {
                prev: self.prev,
                got: kmer,
            }
            .into());
        }
        varint::write_uint(&mut self.inner, kmer - self.prev)?;
        varint::write_uint(&mut self.inner, count)?;
        self.prev = kmer;
        self.started = true;
        Ok(())
    }

    /// Appends every record of an ordered stream
    pub fn write_records<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        for (kmer, count) in records {
            self.push(kmer, count)?;
        }
        Ok(())
    }

    /// Flushes and returns the underlying sink
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Writes a whole frequency set to `path` in one call
///
/// Convenience wrapper around [`FreqSetWriter`] for the common case of a
/// fully materialized or already-ordered record source.
pub fn write<P, I>(path: P, k: usize, records: I, extra: Option<&Metadata>) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (u64, u64)>,
{
    let mut writer = FreqSetWriter::create(path, k, extra)?;
    writer.write_records(records)?;
    writer.finish()?;
    Ok(())
}

fn build_metadata(k: usize, extra: Option<&Metadata>) -> Result<Metadata> {
    kmer::check_k(k)?;
    let mut metadata = Metadata::new();
    metadata.insert(META_TYPE, MetaValue::Text(FORMAT_TAG.to_string()));
    metadata.insert(META_VERSION, MetaValue::Uint(FORMAT_VERSION));
    metadata.insert(META_K, MetaValue::Uint(k as u64));
    if let Some(extra) = extra {
        for (key, value) in extra.iter() {
            if metadata.contains_key(key) {
                return Err(HeaderError::ReservedKeyConflict(key.to_string()).into());
            }
            metadata.insert(key, value.clone());
        }
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_push_enforces_ascending_order() {
        let mut writer = FreqSetWriter::new(Vec::new(), 3, None).unwrap();
        writer.push(1, 10).unwrap();
        writer.push(5, 2).unwrap();
        let err = writer.push(5, 3).unwrap_err();
        assert!(matches!(
            err,
            Error::WriteError(WriteError::OutOfOrderRecord { prev: 5, got: 5 })
        ));
    }

    #[test]
    fn test_first_record_may_be_zero() {
        let mut writer = FreqSetWriter::new(Vec::new(), 3, None).unwrap();
        writer.push(0, 7).unwrap();
    }

    #[test]
    fn test_duplicate_leading_zero_rejected() {
        let mut writer = FreqSetWriter::new(Vec::new(), 3, None).unwrap();
        writer.push(0, 7).unwrap();
        let err = writer.push(0, 8).unwrap_err();
        assert!(matches!(
            err,
            Error::WriteError(WriteError::OutOfOrderRecord { prev: 0, got: 0 })
        ));
    }

    #[test]
    fn test_reserved_key_conflict_before_sink_bytes() {
        let mut extra = Metadata::new();
        extra.insert("K", MetaValue::Uint(5));
        let err = FreqSetWriter::new(Vec::new(), 3, Some(&extra)).unwrap_err();
        assert!(matches!(
            err,
            Error::HeaderError(HeaderError::ReservedKeyConflict(key)) if key == "K"
        ));
    }

    #[test]
    fn test_unsupported_k_rejected() {
        assert!(FreqSetWriter::new(Vec::new(), 0, None).is_err());
        assert!(FreqSetWriter::new(Vec::new(), 33, None).is_err());
        assert!(FreqSetWriter::new(Vec::new(), 32, None).is_ok());
    }

    #[test]
    fn test_extra_metadata_merged() {
        let mut extra = Metadata::new();
        extra.insert("source", MetaValue::Text("reads.fq".to_string()));
        let metadata = build_metadata(4, Some(&extra)).unwrap();
        assert_eq!(metadata.len(), 4);
        assert_eq!(metadata.text("source"), Some("reads.fq"));
        assert_eq!(metadata.uint("K"), Some(4));
        assert_eq!(metadata.text("type"), Some(crate::FORMAT_TAG));
    }

    #[test]
    fn test_empty_set_is_header_only() {
        let writer = FreqSetWriter::new(Vec::new(), 3, None).unwrap();
        let bytes = writer.finish().unwrap();

        let mut header = Vec::new();
        container::write_header(&mut header, &build_metadata(3, None).unwrap()).unwrap();
        assert_eq!(bytes, header);
    }
}
