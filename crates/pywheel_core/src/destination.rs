//! The capability of writing the files of a wheel.

use std::io::{self, Read};

use crate::{record::RecordEntry, scheme::Scheme};

/// Receives the files of a wheel during installation.
pub trait WheelDestination {
    /// Write the contents of `stream` into the directory of `scheme` and
    /// return the record describing what was written.
    ///
    /// `path` is the path of the file inside the wheel. Files from the `.data`
    /// directory keep their `{data_dir}/{scheme}/` prefix, mapping them to a
    /// location below the scheme directory is up to the destination.
    fn write_file(
        &mut self,
        scheme: Scheme,
        path: &str,
        stream: &mut dyn Read,
    ) -> io::Result<RecordEntry>;

    /// Called once after every file has been written.
    ///
    /// `scheme` is the root scheme of the wheel and `records` contains the
    /// records returned by [`Self::write_file`] in the order the files were
    /// written. The destination persists them as the `RECORD` file.
    fn finalize_installation(&mut self, scheme: Scheme, records: Vec<RecordEntry>)
    -> io::Result<()>;
}
