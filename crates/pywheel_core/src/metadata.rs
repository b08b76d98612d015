//! Parsing of `Key: value` metadata files such as `WHEEL` and `METADATA`.
//!
//! > {distribution}-{version}.dist-info/WHEEL is metadata about the archive
//! > itself in the same basic key: value format
//!
//! The format is the RFC822 header syntax. Parsing is permissive: lines that
//! cannot be understood are dropped instead of failing the whole file, wheels
//! in the wild rely on that.

use std::fmt::{Display, Formatter};

/// An ordered multi-map of metadata headers with case-insensitive keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    headers: Vec<(String, String)>,
}

impl Metadata {
    /// Returns the value of the first header named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).next()
    }

    /// Returns the values of all headers named `key`, in file order.
    pub fn get_all<'a, 'k>(
        &'a self,
        key: &'k str,
    ) -> impl Iterator<Item = &'a str> + use<'a, 'k> {
        self.headers
            .iter()
            .filter(move |(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over all headers with the casing of the original file.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl Display for Metadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (name, value) in &self.headers {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

/// Parse the headers of a metadata file. This never fails.
pub fn parse_metadata(contents: &str) -> Metadata {
    let mut headers: Vec<(String, String)> = Vec::new();

    // Whether the last header is still open for continuation lines.
    let mut open = false;

    for line in contents.lines() {
        // A blank line separates the headers from the body, which we ignore.
        if line.is_empty() {
            break;
        }

        if line.starts_with([' ', '\t']) {
            match headers.last_mut() {
                Some((_, value)) if open => {
                    value.push('\n');
                    value.push_str(line);
                }
                _ => tracing::trace!("dropping metadata continuation line without a header"),
            }
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            tracing::trace!("dropping malformed metadata line '{line}'");
            open = false;
            continue;
        };

        if name.is_empty() || name.contains(char::is_whitespace) {
            tracing::trace!("dropping metadata line with invalid header name '{name}'");
            open = false;
            continue;
        }

        headers.push((
            name.to_string(),
            value.trim_start_matches([' ', '\t']).to_string(),
        ));
        open = true;
    }

    Metadata { headers }
}
