use miette::Diagnostic;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

/// The installation scheme a file of a wheel is placed in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Scheme {
    Purelib,
    Platlib,
    Headers,
    Scripts,
    Data,
}

/// The wheel cannot be installed because of its contents.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
#[error("invalid wheel {source_name}: {reason}")]
pub struct InvalidWheelSourceError {
    /// Name of the offending source, e.g. `{distribution}-{version}`.
    pub source_name: String,
    pub reason: String,
}

impl InvalidWheelSourceError {
    pub fn new(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Determine the scheme `path` belongs to.
///
/// Files outside of `data_dir` go to `root_scheme`, files inside of it go to
/// the scheme named by the subdirectory of `data_dir` they live in.
pub fn resolve(
    path: &str,
    data_dir: &str,
    root_scheme: Scheme,
) -> Result<Scheme, InvalidWheelSourceError> {
    resolve_destination(path, data_dir, root_scheme).map(|(scheme, _)| scheme)
}

/// Like [`resolve`] but also returns the path relative to the scheme
/// directory, that is `path` without its `{data_dir}/{scheme}/` prefix.
pub fn resolve_destination<'p>(
    path: &'p str,
    data_dir: &str,
    root_scheme: Scheme,
) -> Result<(Scheme, &'p str), InvalidWheelSourceError> {
    let Some(inside) = path
        .strip_prefix(data_dir)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return Ok((root_scheme, path));
    };

    let invalid = || {
        InvalidWheelSourceError::new(
            data_dir
                .strip_suffix(crate::consts::DATA_DIR_SUFFIX)
                .unwrap_or(data_dir),
            format!("{path} is not contained in a valid .data subdirectory."),
        )
    };

    let (scheme_name, relative) = inside.split_once('/').ok_or_else(invalid)?;
    let scheme = scheme_name.parse::<Scheme>().map_err(|_| invalid())?;
    if relative.is_empty() {
        return Err(invalid());
    }

    Ok((scheme, relative))
}
