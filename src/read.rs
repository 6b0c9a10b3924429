//! Reading sorted k-mer frequency sets
//!
//! A read is one sequential pass: the container is probed against the
//! frequency-set metadata shape, the reserved values are validated, and a
//! lazy [`RecordIter`] reconstructs absolute k-mers from the stored deltas
//! via a running prefix sum. Nothing is decoded until the caller pulls;
//! abandoning the iterator drops the source and releases the file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::container::{self, Metadata};
use crate::error::{HeaderError, ReadError, Result};
use crate::{kmer, varint};
use crate::{FORMAT_TAG, FORMAT_VERSION, KFSET_SHAPE, META_K, META_TYPE, META_VERSION};

/// Lazy iterator over the `(kmer, count)` records of a frequency set
///
/// Each pull decodes one delta and one count from the source. A clean end
/// of stream at a record boundary terminates the iterator; a stream ending
/// inside a record, or any other decode fault, yields a single fatal
/// `Err` and the iterator fuses. A partial record is never yielded.
#[derive(Debug)]
pub struct RecordIter<R: Read> {
    inner: R,
    total: u64,
    done: bool,
}

impl<R: Read> RecordIter<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            total: 0,
            done: false,
        }
    }

    fn pull(&mut self) -> Result<Option<(u64, u64)>> {
        let Some(delta) = varint::read_uint(&mut self.inner)? else {
            return Ok(None);
        };
        self.total = self
            .total
            .checked_add(delta)
            .ok_or(ReadError::DeltaOverflow)?;
        let Some(count) = varint::read_uint(&mut self.inner)? else {
            return Err(ReadError::PartialRecord.into());
        };
        Ok(Some((self.total, count)))
    }
}

impl<R: Read> Iterator for RecordIter<R> {
    type Item = Result<(u64, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.pull() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Opens a frequency set from any positioned source
///
/// The source must start at the container header. See [`read`] for the
/// file-backed variant.
pub fn read_from<R: Read>(inner: R) -> Result<(Metadata, RecordIter<R>)> {
    let (metadata, source) = container::probe_from(inner, KFSET_SHAPE)?;
    validate(&metadata)?;
    Ok((metadata, RecordIter::new(source)))
}

/// Opens the frequency set at `path`
///
/// # Returns
///
/// The recovered metadata and a lazy record stream. Records decode on
/// demand; dropping the iterator abandons the rest of the stream.
pub fn read<P: AsRef<Path>>(path: P) -> Result<(Metadata, RecordIter<BufReader<File>>)> {
    let (metadata, source) = container::probe(path, KFSET_SHAPE)?;
    validate(&metadata)?;
    Ok((metadata, RecordIter::new(source)))
}

/// Reads only the k-mer width of the frequency set at `path`
///
/// Probes the metadata header and never touches the record stream.
pub fn probe_k<P: AsRef<Path>>(path: P) -> Result<usize> {
    let (metadata, _) = container::probe(path, KFSET_SHAPE)?;
    validate(&metadata)
}

/// Checks the reserved metadata values, returning the validated K
///
/// The container probe has already guaranteed presence and kind of the
/// reserved keys; this checks their values.
fn validate(metadata: &Metadata) -> Result<usize> {
    match metadata.text(META_TYPE) {
        Some(FORMAT_TAG) => {}
        Some(other) => return Err(HeaderError::FormatTagMismatch(other.to_string()).into()),
        None => return Err(HeaderError::MissingField(META_TYPE.to_string()).into()),
    }
    match metadata.uint(META_VERSION) {
        Some(FORMAT_VERSION) => {}
        Some(other) => return Err(HeaderError::UnsupportedSchemaVersion(other).into()),
        None => return Err(HeaderError::MissingField(META_VERSION.to_string()).into()),
    }
    let k = metadata
        .uint(META_K)
        .ok_or_else(|| HeaderError::MissingField(META_K.to_string()))? as usize;
    kmer::check_k(k)?;
    Ok(k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MetaValue;
    use crate::error::{Error, WriteError};
    use crate::write::FreqSetWriter;

    fn sample_bytes(k: usize, records: &[(u64, u64)], extra: Option<&Metadata>) -> Vec<u8> {
        let mut writer = FreqSetWriter::new(Vec::new(), k, extra).unwrap();
        writer.write_records(records.iter().copied()).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let bytes = sample_bytes(3, &[(0, 5), (2, 1), (7, 9)], None);
        let (metadata, records) = read_from(bytes.as_slice()).unwrap();
        assert_eq!(metadata.uint(META_K), Some(3));
        assert_eq!(metadata.text(META_TYPE), Some(FORMAT_TAG));
        assert_eq!(metadata.uint(META_VERSION), Some(FORMAT_VERSION));

        let records = records.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records, vec![(0, 5), (2, 1), (7, 9)]);
    }

    #[test]
    fn test_roundtrip_empty_set() {
        let bytes = sample_bytes(5, &[], None);
        let (metadata, mut records) = read_from(bytes.as_slice()).unwrap();
        assert_eq!(metadata.uint(META_K), Some(5));
        assert!(records.next().is_none());
    }

    #[test]
    fn test_roundtrip_extra_metadata() {
        let mut extra = Metadata::new();
        extra.insert("source", MetaValue::Text("reads.fq".to_string()));
        let bytes = sample_bytes(4, &[(3, 2)], Some(&extra));
        let (metadata, _) = read_from(bytes.as_slice()).unwrap();
        assert_eq!(metadata.text("source"), Some("reads.fq"));
    }

    #[test]
    fn test_prefix_sum_reconstruction() {
        // widely spaced k-mers exercise multi-byte deltas
        let records = [(7u64, 1u64), (1 << 20, 2), (1 << 40, 3), (u64::MAX, 4)];
        let bytes = sample_bytes(32, &records, None);
        let (_, iter) = read_from(bytes.as_slice()).unwrap();
        let restored = iter.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(restored, records);
    }

    #[test]
    fn test_truncated_stream_is_fatal_and_fuses() {
        let mut bytes = sample_bytes(3, &[(0, 5), (2, 1)], None);
        // drop the final count, leaving a dangling delta
        bytes.truncate(bytes.len() - 1);
        let (_, mut records) = read_from(bytes.as_slice()).unwrap();

        assert_eq!(records.next().unwrap().unwrap(), (0, 5));
        let err = records.next().unwrap().unwrap_err();
        assert!(matches!(err, Error::ReadError(ReadError::PartialRecord)));
        assert!(records.next().is_none());
    }

    #[test]
    fn test_foreign_container_rejected() {
        let mut metadata = Metadata::new();
        metadata.insert(META_TYPE, MetaValue::Text("unitig index".to_string()));
        metadata.insert(META_VERSION, MetaValue::Uint(FORMAT_VERSION));
        metadata.insert(META_K, MetaValue::Uint(9));
        let mut bytes = Vec::new();
        container::write_header(&mut bytes, &metadata).unwrap();

        let err = read_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            Error::HeaderError(HeaderError::FormatTagMismatch(_))
        ));
    }

    #[test]
    fn test_future_schema_version_rejected() {
        let mut metadata = Metadata::new();
        metadata.insert(META_TYPE, MetaValue::Text(FORMAT_TAG.to_string()));
        metadata.insert(META_VERSION, MetaValue::Uint(FORMAT_VERSION + 1));
        metadata.insert(META_K, MetaValue::Uint(9));
        let mut bytes = Vec::new();
        container::write_header(&mut bytes, &metadata).unwrap();

        let err = read_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            Error::HeaderError(HeaderError::UnsupportedSchemaVersion(_))
        ));
    }

    #[test]
    fn test_oversized_k_rejected() {
        let mut metadata = Metadata::new();
        metadata.insert(META_TYPE, MetaValue::Text(FORMAT_TAG.to_string()));
        metadata.insert(META_VERSION, MetaValue::Uint(FORMAT_VERSION));
        metadata.insert(META_K, MetaValue::Uint(48));
        let mut bytes = Vec::new();
        container::write_header(&mut bytes, &metadata).unwrap();

        assert!(read_from(bytes.as_slice()).is_err());
    }

    #[test]
    fn test_max_kmer_roundtrip_via_writer() {
        // u64::MAX as a later record must survive the delta encoding
        let mut writer = FreqSetWriter::new(Vec::new(), 32, None).unwrap();
        writer.push(u64::MAX - 1, 1).unwrap();
        writer.push(u64::MAX, 2).unwrap();
        let err = writer.push(u64::MAX, 3).unwrap_err();
        assert!(matches!(
            err,
            Error::WriteError(WriteError::OutOfOrderRecord { .. })
        ));
        let bytes = writer.finish().unwrap();

        let (_, iter) = read_from(bytes.as_slice()).unwrap();
        let restored = iter.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(restored, vec![(u64::MAX - 1, 1), (u64::MAX, 2)]);
    }
}
