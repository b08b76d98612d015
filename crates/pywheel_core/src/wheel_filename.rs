//! Parsing of wheel filenames as described by PEP 427:
//! `{distribution}-{version}(-{build tag})?-{python tag}-{abi tag}-{platform tag}.whl`

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

use crate::consts::{DATA_DIR_SUFFIX, DIST_INFO_SUFFIX, WHEEL_EXTENSION};

#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
#[error("'{filename}' is not a valid wheel filename: {reason}")]
pub struct InvalidFilenameError {
    pub filename: String,
    pub reason: String,
}

/// The components of a wheel filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WheelFilename {
    pub distribution: String,
    pub version: String,
    pub build_tag: Option<String>,
    /// The `python-abi-platform` compatibility tag, e.g. `py3-none-any`.
    pub compatibility_tag: String,
}

impl WheelFilename {
    /// The name of the `.dist-info` directory inside the wheel.
    pub fn dist_info_dir(&self) -> String {
        format!(
            "{}-{}{DIST_INFO_SUFFIX}",
            escape_component(&self.distribution),
            self.version
        )
    }

    /// The name of the `.data` directory inside the wheel.
    pub fn data_dir(&self) -> String {
        format!(
            "{}-{}{DATA_DIR_SUFFIX}",
            escape_component(&self.distribution),
            self.version
        )
    }
}

impl FromStr for WheelFilename {
    type Err = InvalidFilenameError;

    fn from_str(filename: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| InvalidFilenameError {
            filename: filename.to_string(),
            reason: reason.to_string(),
        };

        let stem = filename
            .len()
            .checked_sub(WHEEL_EXTENSION.len())
            .filter(|&split| filename.is_char_boundary(split))
            .map(|split| filename.split_at(split))
            .filter(|(_, extension)| extension.eq_ignore_ascii_case(WHEEL_EXTENSION))
            .map(|(stem, _)| stem)
            .ok_or_else(|| invalid("must end with '.whl'"))?;

        let fields = stem.split('-').collect_vec();
        if let Some(field) = fields
            .iter()
            .find(|field| field.is_empty() || field.contains(char::is_whitespace))
        {
            return Err(if field.is_empty() {
                invalid("contains an empty component")
            } else {
                invalid("contains whitespace")
            });
        }

        let (distribution, version, build_tag, tag) = match fields.as_slice() {
            [distribution, version, python, abi, platform] => {
                (distribution, version, None, [python, abi, platform])
            }
            [distribution, version, build, python, abi, platform] => {
                if !build.starts_with(|c: char| c.is_ascii_digit()) {
                    return Err(invalid("the build tag must start with a digit"));
                }
                (
                    distribution,
                    version,
                    Some(build.to_string()),
                    [python, abi, platform],
                )
            }
            _ => {
                return Err(invalid(
                    "expected '{distribution}-{version}(-{build tag})?-{python tag}-{abi tag}-{platform tag}'",
                ));
            }
        };

        Ok(Self {
            distribution: distribution.to_string(),
            version: version.to_string(),
            build_tag,
            compatibility_tag: tag.iter().join("-"),
        })
    }
}

impl Display for WheelFilename {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.distribution, self.version)?;
        if let Some(build_tag) = &self.build_tag {
            write!(f, "-{build_tag}")?;
        }
        write!(f, "-{}{WHEEL_EXTENSION}", self.compatibility_tag)
    }
}

/// Normalize a distribution name as described by PEP 503: runs of `-`, `_`
/// and `.` become a single `-` and the name is lowercased.
pub fn canonicalize_name(name: &str) -> String {
    replace_separator_runs(name, '-').to_ascii_lowercase()
}

/// Escape a distribution name for use in `.dist-info` and `.data` directory
/// names, runs of `-`, `_` and `.` become a single `_`.
fn escape_component(name: &str) -> String {
    replace_separator_runs(name, '_')
}

fn replace_separator_runs(name: &str, replacement: char) -> String {
    let mut result = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                result.push(replacement);
                in_separator = true;
            }
        } else {
            result.push(c);
            in_separator = false;
        }
    }
    result
}
