use crate::container::MetaKind;

/// Custom Result type for kfset operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the kfset library, encompassing all possible error
/// cases that can occur while packing k-mers or moving frequency sets on and
/// off disk.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Errors related to container and metadata headers
    #[error("Error processing header: {0}")]
    HeaderError(#[from] HeaderError),

    /// Errors related to k-mer configuration
    #[error("Error with k-mer width: {0}")]
    KmerError(#[from] KmerError),

    /// Errors that occur during write operations
    #[error("Error writing frequency set: {0}")]
    WriteError(#[from] WriteError),

    /// Errors that occur during read operations
    #[error("Error reading frequency set: {0}")]
    ReadError(#[from] ReadError),

    /// Standard I/O errors
    #[error("Error with IO: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors specific to processing and validating container headers
#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    /// The magic number in the header does not match the expected value
    #[error("Invalid magic number: {0:?}")]
    InvalidMagicNumber([u8; 7]),

    /// The container layout version is not supported
    #[error("Invalid container version: {0}")]
    InvalidContainerVersion(u8),

    /// A metadata key required by the expected shape is absent
    #[error("Missing required metadata field: {0}")]
    MissingField(String),

    /// A metadata key is present but holds a value of the wrong kind
    #[error("Metadata field `{key}` has kind {found:?}, expected {expected:?}")]
    FieldKindMismatch {
        key: String,
        expected: MetaKind,
        found: MetaKind,
    },

    /// A caller-supplied metadata key collides with a reserved key
    #[error("Metadata key `{0}` is reserved")]
    ReservedKeyConflict(String),

    /// The reserved `type` field does not carry the frequency-set tag
    #[error("Unexpected format tag: `{0}`")]
    FormatTagMismatch(String),

    /// The reserved `version` field carries an unknown schema version
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchemaVersion(u64),

    /// A metadata key or text value is not valid UTF-8
    #[error("Metadata entry is not valid UTF-8")]
    InvalidEntryEncoding,

    /// A metadata value carries an unknown kind tag
    #[error("Unknown metadata value tag: {0}")]
    UnknownValueTag(u8),
}

/// Errors related to k-mer configuration
#[derive(thiserror::Error, Debug)]
pub enum KmerError {
    /// The requested k-mer width does not fit a 64-bit word
    #[error("Unsupported k-mer width: {0} - expecting 1..=32")]
    UnsupportedK(usize),
}

/// Errors that can occur while writing a frequency set
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    /// A record violated the strictly-ascending k-mer invariant
    ///
    /// Records must arrive sorted by k-mer with no duplicates; this is a
    /// caller error and the write is aborted immediately.
    #[error("Record out of order: k-mer {got} after {prev}, records must be strictly ascending")]
    OutOfOrderRecord { prev: u64, got: u64 },
}

/// Errors that can occur while reading a frequency set
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// End of stream was reached in the middle of a variable-length value
    #[error("Truncated value at end of stream")]
    TruncatedValue,

    /// A variable-length value does not fit in 64 bits
    #[error("Value exceeds 64-bit range")]
    ValueOverflow,

    /// End of stream was reached after a delta but before its count
    #[error("Partial record at end of stream (missing count)")]
    PartialRecord,

    /// Accumulating deltas overflowed the 64-bit k-mer space
    #[error("Delta accumulation overflows 64-bit k-mer space")]
    DeltaOverflow,
}
