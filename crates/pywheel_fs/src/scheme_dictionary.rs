use std::{
    collections::{BTreeMap, HashMap},
    io::Read,
    path::{Path, PathBuf},
    str::FromStr,
};

use miette::Diagnostic;
use pywheel_core::Scheme;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SchemeDictionaryError {
    #[error("failed to read the scheme file {}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse the scheme file {}", .0.display())]
    #[diagnostic(help(
        "the scheme file is a JSON object mapping scheme names to directories, e.g. the output of `python -c 'import json, sysconfig; print(json.dumps(sysconfig.get_paths()))'`"
    ))]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("no directory is configured for the {0} scheme")]
    MissingScheme(Scheme),
}

/// The directory each [`Scheme`] is installed into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemeDictionary {
    directories: BTreeMap<Scheme, PathBuf>,
}

impl SchemeDictionary {
    /// Read a scheme dictionary from a JSON object.
    ///
    /// Keys that are not scheme names are ignored, so the output of
    /// `sysconfig.get_paths()` can be used directly. Without a `headers` key
    /// the headers are placed in `{include}/{distribution}`.
    pub fn from_json(
        reader: impl Read,
        distribution: &str,
    ) -> Result<Self, serde_json::Error> {
        let paths: HashMap<String, PathBuf> = serde_json::from_reader(reader)?;

        let mut schemes = Self::default();
        for (name, path) in &paths {
            match Scheme::from_str(name) {
                Ok(scheme) => schemes.insert(scheme, path),
                Err(_) => tracing::trace!("ignoring unknown scheme '{name}' in scheme file"),
            }
        }

        if schemes.get(Scheme::Headers).is_none() {
            if let Some(include) = paths.get("include") {
                schemes.insert(Scheme::Headers, include.join(distribution));
            }
        }

        Ok(schemes)
    }

    /// Read a scheme dictionary from a JSON file, see [`Self::from_json`].
    pub fn from_path(path: &Path, distribution: &str) -> Result<Self, SchemeDictionaryError> {
        let file = fs_err::File::open(path)
            .map_err(|err| SchemeDictionaryError::Io(path.to_path_buf(), err))?;
        Self::from_json(file, distribution)
            .map_err(|err| SchemeDictionaryError::Parse(path.to_path_buf(), err))
    }

    pub fn insert(&mut self, scheme: Scheme, directory: impl Into<PathBuf>) {
        self.directories.insert(scheme, directory.into());
    }

    pub fn with(mut self, scheme: Scheme, directory: impl Into<PathBuf>) -> Self {
        self.insert(scheme, directory);
        self
    }

    pub fn get(&self, scheme: Scheme) -> Option<&Path> {
        self.directories.get(&scheme).map(PathBuf::as_path)
    }

    /// Like [`Self::get`] but fails if the scheme is not configured.
    pub fn directory(&self, scheme: Scheme) -> Result<&Path, SchemeDictionaryError> {
        self.get(scheme)
            .ok_or(SchemeDictionaryError::MissingScheme(scheme))
    }

    /// Returns the schemes that do not have a directory.
    pub fn missing(&self) -> Vec<Scheme> {
        use strum::IntoEnumIterator;
        Scheme::iter()
            .filter(|scheme| !self.directories.contains_key(scheme))
            .collect()
    }

    /// Overrides the directories of `self` with the ones of `other`.
    pub fn merge(mut self, other: SchemeDictionary) -> Self {
        self.directories.extend(other.directories);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Scheme, &Path)> {
        self.directories
            .iter()
            .map(|(scheme, path)| (*scheme, path.as_path()))
    }
}
