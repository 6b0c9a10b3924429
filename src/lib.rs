//! # kfset
//!
//! A compact binary format for sorted k-mer frequency sets.
//!
//! DNA k-mers (K ≤ 32) are packed two bits per base into a `u64` and
//! manipulated with word-parallel bit operations ([`bits`]). Sorted
//! `(kmer, count)` multisets are persisted as delta + variable-length
//! encoded records behind a metadata header ([`write()`], [`read()`]).
//!
//! ## Quick start
//!
//! ```
//! use kfset::{read_from, FreqSetWriter};
//!
//! // Write an ascending (kmer, count) stream to any `io::Write` sink
//! let mut writer = FreqSetWriter::new(Vec::new(), 3, None).unwrap();
//! writer.write_records([(0, 5), (2, 1), (7, 9)]).unwrap();
//! let bytes = writer.finish().unwrap();
//!
//! // Read it back: metadata header plus a lazy record stream
//! let (metadata, records) = read_from(bytes.as_slice()).unwrap();
//! assert_eq!(metadata.uint("K"), Some(3));
//! let records = records.collect::<kfset::Result<Vec<_>>>().unwrap();
//! assert_eq!(records, vec![(0, 5), (2, 1), (7, 9)]);
//! ```

pub mod bits;
pub mod container;
mod error;
mod extract;
pub mod kmer;
pub mod varint;

mod read;
mod write;

pub use container::{MetaKind, MetaValue, Metadata};
pub use error::{Error, HeaderError, KmerError, ReadError, Result, WriteError};
pub use extract::KmerIter;
pub use read::{probe_k, read, read_from, RecordIter};
pub use write::{write, FreqSetWriter};

/// Magic bytes opening every container produced by this crate
pub const CONTAINER_MAGIC: &[u8; 7] = b"KFSFILE";

/// On-disk container layout version
pub const CONTAINER_VERSION: u8 = 1;

/// Value of the reserved `type` metadata field in every frequency set
pub const FORMAT_TAG: &str = "k-mer frequency set";

/// Schema version stored in the reserved `version` metadata field.
/// Bumped on any incompatible change to the record encoding.
pub const FORMAT_VERSION: u64 = 1;

/// Reserved metadata key holding the format tag
pub const META_TYPE: &str = "type";

/// Reserved metadata key holding the schema version
pub const META_VERSION: &str = "version";

/// Reserved metadata key holding the shared k-mer width
pub const META_K: &str = "K";

/// Metadata shape every frequency set container must satisfy:
/// presence and kind of the reserved keys.
pub const KFSET_SHAPE: &[(&str, MetaKind)] = &[
    (META_TYPE, MetaKind::Text),
    (META_VERSION, MetaKind::Uint),
    (META_K, MetaKind::Uint),
];
