//! The capability of reading the contents of a wheel.

use std::io::{self, Read};

use crate::consts::{DATA_DIR_SUFFIX, DIST_INFO_SUFFIX};

/// A single file of a wheel.
pub struct WheelContent<'a> {
    /// The raw elements of the `RECORD` row describing this file.
    pub record: Vec<String>,
    /// The contents of the file.
    pub stream: Box<dyn Read + 'a>,
}

impl std::fmt::Debug for WheelContent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WheelContent")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

/// Lazily yields every file of a wheel.
pub type WheelContents<'a> = Box<dyn Iterator<Item = io::Result<WheelContent<'a>>> + 'a>;

/// Provides the contents of a wheel to the installer.
///
/// Implementations decide how the wheel is stored, the installer only relies
/// on the directory names and the streams returned here.
pub trait WheelSource {
    /// The (escaped) distribution name, as used in the `.dist-info` directory.
    fn distribution(&self) -> &str;

    /// The version of the distribution.
    fn version(&self) -> &str;

    /// Name of the `.dist-info` directory.
    fn dist_info_dir(&self) -> String {
        format!("{}-{}{DIST_INFO_SUFFIX}", self.distribution(), self.version())
    }

    /// Name of the `.data` directory.
    fn data_dir(&self) -> String {
        format!("{}-{}{DATA_DIR_SUFFIX}", self.distribution(), self.version())
    }

    /// Read a file from the `.dist-info` directory.
    fn read_dist_info(&self, filename: &str) -> io::Result<String>;

    /// Returns every file of the wheel together with its `RECORD` row.
    ///
    /// The `RECORD` file itself is included.
    fn get_contents(&self) -> io::Result<WheelContents<'_>>;

    /// Human readable name of the source used in error messages.
    fn name(&self) -> String {
        format!("{}-{}", self.distribution(), self.version())
    }
}
