//! Named storage with a recoverable metadata header
//!
//! A container is a byte stream opened by [`make`] and reopened by
//! [`probe`]: a fixed [`ContainerHeader`] prelude followed by a small set
//! of typed key/value metadata entries, then whatever body the caller
//! writes. `probe` validates the actual metadata against an expected shape
//! (presence and kind of each required key) before handing the positioned
//! source back to the caller. The returned handles own the underlying file;
//! dropping them releases it.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use bytemuck::{Pod, Zeroable};

use crate::error::{HeaderError, Result};
use crate::{CONTAINER_MAGIC, CONTAINER_VERSION};

const TAG_UINT: u8 = 0;
const TAG_TEXT: u8 = 1;

/// Fixed prelude of every container file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Zeroable, Pod)]
#[repr(C)]
pub struct ContainerHeader {
    /// File magic number
    magic: [u8; 7],
    /// Container layout version
    pub version: u8,
    /// Number of metadata entries that follow the prelude
    pub n_entries: u32,
    /// Reserved for future use
    reserved: [u8; 4],
}

impl ContainerHeader {
    fn new(n_entries: u32) -> Self {
        Self {
            magic: *CONTAINER_MAGIC,
            version: CONTAINER_VERSION,
            n_entries,
            reserved: [0; 4],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header: Self = bytemuck::pod_read_unaligned(bytes);
        if header.magic != *CONTAINER_MAGIC {
            return Err(HeaderError::InvalidMagicNumber(header.magic).into());
        }
        if header.version != CONTAINER_VERSION {
            return Err(HeaderError::InvalidContainerVersion(header.version).into());
        }
        Ok(header)
    }
}

/// The kind of a metadata value, used to express expected shapes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetaKind {
    Uint,
    Text,
}

/// A typed metadata value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetaValue {
    Uint(u64),
    Text(String),
}

impl MetaValue {
    #[must_use]
    pub fn kind(&self) -> MetaKind {
        match self {
            Self::Uint(_) => MetaKind::Uint,
            Self::Text(_) => MetaKind::Text,
        }
    }
}

/// An ordered key to value mapping persisted in the container header
///
/// Keys are kept sorted so a metadata mapping always serializes to the
/// same bytes regardless of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<String, MetaValue>,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        self.entries.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(key)
    }

    /// Returns the value under `key` if it is an unsigned integer
    #[must_use]
    pub fn uint(&self, key: &str) -> Option<u64> {
        match self.entries.get(key) {
            Some(MetaValue::Uint(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value under `key` if it is text
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(MetaValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write_entries<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (key, value) in &self.entries {
            writer.write_u16::<LittleEndian>(key.len() as u16)?;
            writer.write_all(key.as_bytes())?;
            match value {
                MetaValue::Uint(v) => {
                    writer.write_u8(TAG_UINT)?;
                    writer.write_u64::<LittleEndian>(*v)?;
                }
                MetaValue::Text(s) => {
                    writer.write_u8(TAG_TEXT)?;
                    writer.write_u32::<LittleEndian>(s.len() as u32)?;
                    writer.write_all(s.as_bytes())?;
                }
            }
        }
        Ok(())
    }

    fn read_entries<R: Read>(reader: &mut R, n_entries: u32) -> Result<Self> {
        let mut metadata = Self::new();
        for _ in 0..n_entries {
            let key_len = reader.read_u16::<LittleEndian>()? as usize;
            let mut key = vec![0u8; key_len];
            reader.read_exact(&mut key)?;
            let key =
                String::from_utf8(key).map_err(|_| HeaderError::InvalidEntryEncoding)?;
            let value = match reader.read_u8()? {
                TAG_UINT => MetaValue::Uint(reader.read_u64::<LittleEndian>()?),
                TAG_TEXT => {
                    let len = reader.read_u32::<LittleEndian>()? as usize;
                    let mut text = vec![0u8; len];
                    reader.read_exact(&mut text)?;
                    MetaValue::Text(
                        String::from_utf8(text)
                            .map_err(|_| HeaderError::InvalidEntryEncoding)?,
                    )
                }
                tag => return Err(HeaderError::UnknownValueTag(tag).into()),
            };
            metadata.insert(key, value);
        }
        Ok(metadata)
    }
}

/// Writes the container header (prelude plus metadata entries) to a sink
pub fn write_header<W: Write>(writer: &mut W, metadata: &Metadata) -> Result<()> {
    let header = ContainerHeader::new(metadata.len() as u32);
    writer.write_all(header.as_bytes())?;
    metadata.write_entries(writer)
}

/// Creates a container file at `path`, embedding `metadata` as its header
///
/// # Returns
///
/// A buffered sink positioned just past the header, ready for the body.
pub fn make<P: AsRef<Path>>(path: P, metadata: &Metadata) -> Result<BufWriter<File>> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_header(&mut writer, metadata)?;
    Ok(writer)
}

/// Reads the container header from a source and validates its shape
///
/// `shape` lists the keys that must be present and the kind each must
/// carry; anything beyond the shape is passed through untouched.
///
/// # Returns
///
/// The recovered metadata and the source positioned at the first body byte.
pub fn probe_from<R: Read>(
    mut reader: R,
    shape: &[(&str, MetaKind)],
) -> Result<(Metadata, R)> {
    let mut prelude = [0u8; std::mem::size_of::<ContainerHeader>()];
    reader.read_exact(&mut prelude)?;
    let header = ContainerHeader::from_bytes(&prelude)?;

    let metadata = Metadata::read_entries(&mut reader, header.n_entries)?;
    for &(key, expected) in shape {
        match metadata.get(key) {
            None => return Err(HeaderError::MissingField(key.to_string()).into()),
            Some(value) if value.kind() != expected => {
                return Err(HeaderError::FieldKindMismatch {
                    key: key.to_string(),
                    expected,
                    found: value.kind(),
                }
                .into());
            }
            Some(_) => {}
        }
    }
    Ok((metadata, reader))
}

/// Opens the container at `path` and validates its metadata shape
pub fn probe<P: AsRef<Path>>(
    path: P,
    shape: &[(&str, MetaKind)],
) -> Result<(Metadata, BufReader<File>)> {
    probe_from(BufReader::new(File::open(path)?), shape)
}
