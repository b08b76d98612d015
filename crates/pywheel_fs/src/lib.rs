//! Filesystem implementations of the capabilities used by `pywheel_core`.
//!
//! - [`UnpackedWheelSource`] reads a wheel that has already been extracted to
//!   a directory.
//! - [`SchemeDictionaryDestination`] installs into a directory per scheme and
//!   writes the `RECORD` file.

mod atomic_write;
mod destination;
mod paths;
mod scheme_dictionary;
mod source;

pub use atomic_write::atomic_write_sync;
pub use destination::SchemeDictionaryDestination;
pub use scheme_dictionary::{SchemeDictionary, SchemeDictionaryError};
pub use source::{SourceError, UnpackedWheelSource};
