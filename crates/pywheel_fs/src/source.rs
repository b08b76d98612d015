use std::{
    io,
    path::{Path, PathBuf},
    str::FromStr,
};

use miette::Diagnostic;
use pywheel_core::{
    InvalidRecordError, ValidateRecordError, WheelContent, WheelFilename, WheelSource,
    canonicalize_name,
    consts::{DIST_INFO_SUFFIX, RECORD_FILE_NAME},
    parse_record_file, read_record_rows,
    source::WheelContents,
};
use thiserror::Error;

use crate::paths::relative_wheel_path;

#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    #[error("failed to read the wheel directory {}", .0.display())]
    ReadDir(PathBuf, #[source] io::Error),

    #[error("missing .dist-info directory in {}", .0.display())]
    MissingDistInfo(PathBuf),

    #[error("found multiple .dist-info directories in {}: {}", .0.display(), .1.join(", "))]
    MultipleDistInfo(PathBuf, Vec<String>),

    #[error("'{0}' is not a valid .dist-info directory name")]
    #[diagnostic(help("expected '{{distribution}}-{{version}}.dist-info'"))]
    InvalidDistInfoName(String),

    #[error("failed to read {}", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidRecord(#[from] InvalidRecordError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validate(#[from] ValidateRecordError),

    #[error("the contents of '{0}' do not match its hash or size in RECORD")]
    HashMismatch(String),
}

/// A wheel that has been extracted into a directory.
#[derive(Debug, Clone)]
pub struct UnpackedWheelSource {
    root: PathBuf,
    distribution: String,
    version: String,
}

impl UnpackedWheelSource {
    /// Open the wheel extracted at `root` by looking for its `.dist-info`
    /// directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let root = root.into();
        let mut candidates = dist_info_candidates(&root)?;
        let dist_info = match candidates.len() {
            0 => return Err(SourceError::MissingDistInfo(root)),
            1 => candidates.remove(0),
            _ => {
                candidates.sort();
                return Err(SourceError::MultipleDistInfo(root, candidates));
            }
        };
        let (distribution, version) = split_dist_info(&dist_info)
            .ok_or_else(|| SourceError::InvalidDistInfoName(dist_info.clone()))?;

        let source = Self {
            distribution: distribution.to_string(),
            version: version.to_string(),
            root,
        };

        // Directories named after the wheel they were extracted from should
        // agree with the metadata inside.
        if let Some(filename) = source
            .root
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| WheelFilename::from_str(name).ok())
        {
            if canonicalize_name(&filename.distribution) != canonicalize_name(&source.distribution)
                || filename.version != source.version
            {
                tracing::warn!(
                    "{} contains {dist_info}, which does not match the wheel filename",
                    source.root.display()
                );
            }
        }

        Ok(source)
    }

    /// Open the wheel extracted at `root`, using `filename` to locate the
    /// `.dist-info` directory.
    ///
    /// The directory is matched by normalized name, so `My.Pkg-1.0-*.whl`
    /// finds `my_pkg-1.0.dist-info`. The distribution name is taken from the
    /// directory, which is what the paths inside the wheel use.
    pub fn from_filename(
        root: impl Into<PathBuf>,
        filename: &WheelFilename,
    ) -> Result<Self, SourceError> {
        let root = root.into();
        let expected = canonicalize_name(&filename.distribution);

        let found = dist_info_candidates(&root)?
            .iter()
            .filter_map(|name| split_dist_info(name))
            .find(|(distribution, version)| {
                *version == filename.version && canonicalize_name(distribution) == expected
            })
            .map(|(distribution, version)| (distribution.to_string(), version.to_string()));

        let Some((distribution, version)) = found else {
            return Err(SourceError::MissingDistInfo(root));
        };

        Ok(Self {
            distribution,
            version,
            root,
        })
    }

    /// The directory the wheel was extracted to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_file(&self) -> PathBuf {
        self.root
            .join(self.dist_info_dir())
            .join(RECORD_FILE_NAME)
    }

    /// Check the contents of every file against the hash and size in the
    /// wheel's `RECORD`.
    pub fn validate_record(&self) -> Result<(), SourceError> {
        let record_file = self.record_file();
        let file = fs_err::File::open(&record_file)
            .map_err(|err| SourceError::Io(record_file.clone(), err))?;

        for record in parse_record_file(file)? {
            if record.hash().is_none() {
                continue;
            }

            let path = self.root.join(
                relative_wheel_path(record.path())
                    .map_err(|err| SourceError::Io(record_file.clone(), err))?,
            );
            let mut file =
                fs_err::File::open(&path).map_err(|err| SourceError::Io(path.clone(), err))?;
            if !record.validate(&mut file)? {
                return Err(SourceError::HashMismatch(record.path().to_string()));
            }
        }

        Ok(())
    }
}

impl WheelSource for UnpackedWheelSource {
    fn distribution(&self) -> &str {
        &self.distribution
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn read_dist_info(&self, filename: &str) -> io::Result<String> {
        fs_err::read_to_string(self.root.join(self.dist_info_dir()).join(filename))
    }

    fn get_contents(&self) -> io::Result<WheelContents<'_>> {
        let rows = read_record_rows(fs_err::File::open(self.record_file())?);

        Ok(Box::new(rows.map(move |row| {
            let record = row.map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

            let stream: Box<dyn io::Read> = match record.first() {
                Some(path) if !path.is_empty() => {
                    let file_path = self.root.join(relative_wheel_path(path)?);
                    Box::new(fs_err::File::open(file_path)?)
                }
                // Let the installer reject the row.
                _ => Box::new(io::empty()),
            };

            Ok(WheelContent { record, stream })
        })))
    }
}

/// The names of the top-level `.dist-info` directories of an unpacked wheel.
fn dist_info_candidates(root: &Path) -> Result<Vec<String>, SourceError> {
    let read_dir = |err| SourceError::ReadDir(root.to_path_buf(), err);

    let mut candidates = Vec::new();
    for entry in fs_err::read_dir(root).map_err(read_dir)? {
        let entry = entry.map_err(read_dir)?;
        if !entry.file_type().map_err(read_dir)?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(DIST_INFO_SUFFIX) {
            candidates.push(name);
        }
    }

    Ok(candidates)
}

/// Split `{distribution}-{version}.dist-info` into its name and version.
fn split_dist_info(name: &str) -> Option<(&str, &str)> {
    name.strip_suffix(DIST_INFO_SUFFIX)
        .and_then(|stem| stem.split_once('-'))
        .filter(|(distribution, version)| !distribution.is_empty() && !version.is_empty())
}
