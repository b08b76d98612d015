use std::{
    io,
    path::{Component, Path, PathBuf},
};

use itertools::Itertools;

/// Convert a `/` separated path from a wheel into a relative [`PathBuf`].
///
/// Paths that are absolute or that escape their base directory through `..`
/// are rejected.
pub(crate) fn relative_wheel_path(path: &str) -> io::Result<PathBuf> {
    let relative = Path::new(path);
    let is_safe = !path.is_empty()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if !is_safe {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{path}' is not a relative path inside of the wheel"),
        ));
    }
    Ok(relative.to_path_buf())
}

/// Render a relative path with `/` separators, as used in `RECORD` files.
pub(crate) fn to_record_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .join("/")
}
