//! Entries of the `RECORD` file.
//!
//! <https://www.python.org/dev/peps/pep-0376/#record>
//!
//! ```csv
//! tqdm/cli.py,sha256=x_c8nmc4Huc-lKEsAXj78ZiyqSJ9hJ71j7vltY67icw,10509
//! tqdm-4.62.3.dist-info/RECORD,,
//! ```

use std::{
    fmt::{Display, Formatter},
    io::{self, Read, Write},
    num::ParseIntError,
    str::FromStr,
};

use miette::Diagnostic;
use thiserror::Error;

use crate::hashing::{HashAlgorithm, copy_with_hashing};

#[derive(Debug, Error, Diagnostic)]
pub enum InvalidRecordError {
    #[error("expected 3 elements in a RECORD row, found {0}")]
    FieldCount(usize),

    #[error("RECORD row has an empty path")]
    EmptyPath,

    #[error("hash '{hash}' of '{path}' is not of the form 'algorithm=digest'")]
    MalformedHash { path: String, hash: String },

    #[error("size '{size}' of '{path}' is not a non-negative integer")]
    InvalidSize {
        path: String,
        size: String,
        #[source]
        source: ParseIntError,
    },

    #[error("'{path}' must either have both a hash and a size or neither")]
    HashWithoutSize { path: String },

    #[error("failed to read RECORD")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error, Diagnostic)]
pub enum ValidateRecordError {
    #[error("cannot validate '{path}', unsupported hash algorithm '{algorithm}'")]
    UnsupportedAlgorithm { path: String, algorithm: String },

    #[error("failed to read the contents of '{path}'")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// A hash of a file, as it appears in a `RECORD` entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash {
    /// The name of the algorithm, e.g. `sha256`.
    pub algorithm: String,
    /// URL-safe base64 encoded digest without padding.
    pub value: String,
}

impl Hash {
    pub fn new(algorithm: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            value: value.into(),
        }
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.algorithm, self.value)
    }
}

/// A single line of a `RECORD` file.
///
/// A hash and a size are either both present or both absent. The latter is
/// used for files that are not verified, like the `RECORD` itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordEntry {
    path: String,
    hash: Option<Hash>,
    size: Option<u64>,
}

impl RecordEntry {
    /// A record of an installed file with a known hash and size.
    pub fn new(path: impl Into<String>, hash: Hash, size: u64) -> Self {
        Self {
            path: path.into(),
            hash: Some(hash),
            size: Some(size),
        }
    }

    /// A record without hash and size, its content is never verified.
    pub fn unhashed(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hash: None,
            size: None,
        }
    }

    /// Reconstruct a record from the three raw elements of a `RECORD` row.
    pub fn from_elements(path: &str, hash: &str, size: &str) -> Result<Self, InvalidRecordError> {
        if path.is_empty() {
            return Err(InvalidRecordError::EmptyPath);
        }

        let hash = if hash.is_empty() {
            None
        } else {
            match hash.split_once('=') {
                Some((algorithm, value)) if !algorithm.is_empty() && !value.is_empty() => {
                    Some(Hash::new(algorithm, value))
                }
                _ => {
                    return Err(InvalidRecordError::MalformedHash {
                        path: path.to_string(),
                        hash: hash.to_string(),
                    });
                }
            }
        };

        let size = if size.is_empty() {
            None
        } else {
            Some(
                u64::from_str(size).map_err(|source| InvalidRecordError::InvalidSize {
                    path: path.to_string(),
                    size: size.to_string(),
                    source,
                })?,
            )
        };

        if hash.is_some() != size.is_some() {
            return Err(InvalidRecordError::HashWithoutSize {
                path: path.to_string(),
            });
        }

        Ok(Self {
            path: path.to_string(),
            hash,
            size,
        })
    }

    /// Reconstruct a record from a row of raw elements, which must have
    /// exactly three elements.
    pub fn from_row<S: AsRef<str>>(row: &[S]) -> Result<Self, InvalidRecordError> {
        match row {
            [path, hash, size] => Self::from_elements(path.as_ref(), hash.as_ref(), size.as_ref()),
            _ => Err(InvalidRecordError::FieldCount(row.len())),
        }
    }

    /// The three elements of the `RECORD` row of this entry.
    pub fn to_row(&self) -> [String; 3] {
        [
            self.path.clone(),
            self.hash.as_ref().map(Hash::to_string).unwrap_or_default(),
            self.size.map(|size| size.to_string()).unwrap_or_default(),
        ]
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn hash(&self) -> Option<&Hash> {
        self.hash.as_ref()
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Returns a copy of this record with a different path.
    pub fn with_path(self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self
        }
    }

    /// Check whether `contents` matches the hash and size of this record.
    /// Records without a hash are always valid.
    pub fn validate(&self, contents: &mut dyn Read) -> Result<bool, ValidateRecordError> {
        let (Some(hash), Some(size)) = (&self.hash, self.size) else {
            return Ok(true);
        };

        let algorithm = HashAlgorithm::from_str(&hash.algorithm).map_err(|_| {
            ValidateRecordError::UnsupportedAlgorithm {
                path: self.path.clone(),
                algorithm: hash.algorithm.clone(),
            }
        })?;

        let copied = copy_with_hashing(contents, &mut io::sink(), algorithm).map_err(|source| {
            ValidateRecordError::Io {
                path: self.path.clone(),
                source,
            }
        })?;

        Ok(copied.size == size && copied.digest == hash.value)
    }
}

impl Display for RecordEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer
            .write_record(self.to_row())
            .map_err(|_| std::fmt::Error)?;
        let line = writer.into_inner().map_err(|_| std::fmt::Error)?;
        let line = String::from_utf8_lossy(&line);
        f.write_str(line.trim_end_matches('\n'))
    }
}

/// Read the raw rows of a `RECORD` file, without interpreting them.
///
/// Absolute paths are made relative, some wheels (e.g. selenium) contain them.
pub fn read_record_rows<R: Read>(
    reader: R,
) -> impl Iterator<Item = Result<Vec<String>, InvalidRecordError>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .escape(Some(b'"'))
        .from_reader(reader)
        .into_records()
        .map(|row| -> Result<Vec<String>, InvalidRecordError> {
            let mut fields = row?.iter().map(str::to_string).collect::<Vec<_>>();
            if let Some(path) = fields.first_mut() {
                if path.starts_with('/') {
                    *path = path.trim_start_matches('/').to_string();
                }
            }
            Ok(fields)
        })
}

/// Read all entries of a `RECORD` file.
pub fn parse_record_file(reader: impl Read) -> Result<Vec<RecordEntry>, InvalidRecordError> {
    read_record_rows(reader)
        .map(|row| RecordEntry::from_row(&row?))
        .collect()
}

/// Write `records` as a `RECORD` file.
pub fn write_record_file<'a>(
    writer: impl Write,
    records: impl IntoIterator<Item = &'a RecordEntry>,
) -> io::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer.flush()
}
