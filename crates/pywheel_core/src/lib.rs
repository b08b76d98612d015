//! The filesystem agnostic core of the pywheel installer.
//!
//! A wheel is installed by [`install`]: it reads the `WHEEL` descriptor from a
//! [`WheelSource`], places every file of the archive into a [`Scheme`] of a
//! [`WheelDestination`] and hands the collected [`RecordEntry`]s back to the
//! destination so it can persist the `RECORD` manifest.
//!
//! Nothing in this crate touches the filesystem or an archive format, see the
//! `pywheel_fs` crate for implementations of the capabilities.

pub mod consts;
pub mod destination;
pub mod hashing;
pub mod install;
pub mod metadata;
pub mod record;
pub mod scheme;
pub mod source;
pub mod wheel_filename;

pub use destination::WheelDestination;
pub use hashing::{HashAlgorithm, HashedCopy, copy_with_hashing};
pub use install::{InstallError, InstallStage, install};
pub use metadata::{Metadata, parse_metadata};
pub use record::{
    Hash, InvalidRecordError, RecordEntry, ValidateRecordError, parse_record_file,
    read_record_rows, write_record_file,
};
pub use scheme::{InvalidWheelSourceError, Scheme, resolve, resolve_destination};
pub use source::{WheelContent, WheelSource};
pub use wheel_filename::{InvalidFilenameError, WheelFilename, canonicalize_name};
