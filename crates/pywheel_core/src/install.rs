//! Installing a wheel from a [`WheelSource`] into a [`WheelDestination`].
//!
//! See: <https://packaging.python.org/en/latest/specifications/binary-distribution-format/#installing-a-wheel-distribution-1-0-py32-none-any-whl>

use std::io;

use indexmap::IndexMap;
use miette::Diagnostic;
use strum::Display;
use thiserror::Error;

use crate::{
    consts::{RECORD_FILE_NAME, SUPPORTED_WHEEL_VERSION, WHEEL_FILE_NAME},
    destination::WheelDestination,
    metadata::parse_metadata,
    record::{InvalidRecordError, RecordEntry},
    scheme::{InvalidWheelSourceError, Scheme, resolve},
    source::{WheelContent, WheelSource},
};

/// The steps of an installation, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum InstallStage {
    ReadingDescriptor,
    Installing,
    WritingExtraMetadata,
    Finalized,
}

#[derive(Debug, Error, Diagnostic)]
pub enum InstallError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidWheelSource(#[from] InvalidWheelSourceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidRecord(#[from] InvalidRecordError),

    #[error("failed to read '{0}' from the .dist-info directory")]
    ReadDistInfo(String, #[source] io::Error),

    #[error("failed to read the contents of the wheel")]
    ReadContents(#[source] io::Error),

    #[error("failed to write '{path}' to the {scheme} scheme")]
    WriteFile {
        scheme: Scheme,
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to finalize the installation")]
    Finalize(#[source] io::Error),
}

/// Install the wheel described by `source` into `destination`.
///
/// `additional_metadata` maps file names to contents of files that are added
/// to the `.dist-info` directory, e.g. `INSTALLER`. The first error aborts the
/// installation, cleaning up what was already written is up to the
/// destination.
pub fn install<S, D>(
    source: &S,
    destination: &mut D,
    additional_metadata: &IndexMap<String, Vec<u8>>,
) -> Result<(), InstallError>
where
    S: WheelSource + ?Sized,
    D: WheelDestination + ?Sized,
{
    let _span = tracing::info_span!("install", wheel = %source.name()).entered();

    let root_scheme = process_wheel_file(source)?;

    if let Some(filename) = additional_metadata
        .keys()
        .find(|filename| filename.eq_ignore_ascii_case(RECORD_FILE_NAME))
    {
        return Err(InvalidWheelSourceError::new(
            source.name(),
            format!("additional metadata cannot contain {filename}, it is generated during installation"),
        )
        .into());
    }

    let dist_info_dir = source.dist_info_dir();
    let data_dir = source.data_dir();
    let record_file_path = format!("{dist_info_dir}/{RECORD_FILE_NAME}");
    let mut written_records = Vec::new();

    tracing::debug!(stage = %InstallStage::Installing, "installing into {root_scheme}");
    for content in source.get_contents().map_err(InstallError::ReadContents)? {
        let WheelContent { record, mut stream } = content.map_err(InstallError::ReadContents)?;
        let source_record = RecordEntry::from_row(&record)?;
        let path = source_record.path();

        // The RECORD is written by the destination, based on what we install.
        if path == record_file_path {
            tracing::debug!("skipping {path}, it is generated during installation");
            continue;
        }

        let scheme = resolve(path, &data_dir, root_scheme)
            .map_err(|err| InvalidWheelSourceError::new(source.name(), err.reason))?;
        let record = destination
            .write_file(scheme, path, &mut stream)
            .map_err(|err| InstallError::WriteFile {
                scheme,
                path: path.to_string(),
                source: err,
            })?;
        tracing::trace!("installed {path} into {scheme}");
        written_records.push(record);
    }

    tracing::debug!(stage = %InstallStage::WritingExtraMetadata, "writing {} additional metadata files", additional_metadata.len());
    for (filename, contents) in additional_metadata {
        let path = format!("{dist_info_dir}/{filename}");
        let record = destination
            .write_file(root_scheme, &path, &mut contents.as_slice())
            .map_err(|err| InstallError::WriteFile {
                scheme: root_scheme,
                path: path.clone(),
                source: err,
            })?;
        written_records.push(record);
    }

    let installed = written_records.len();
    destination
        .finalize_installation(root_scheme, written_records)
        .map_err(InstallError::Finalize)?;
    tracing::info!(stage = %InstallStage::Finalized, "installed {installed} files");

    Ok(())
}

/// Read the `WHEEL` file and determine the scheme the root of the archive is
/// installed into.
fn process_wheel_file<S: WheelSource + ?Sized>(source: &S) -> Result<Scheme, InstallError> {
    tracing::debug!(stage = %InstallStage::ReadingDescriptor, "reading {WHEEL_FILE_NAME}");
    let contents = source
        .read_dist_info(WHEEL_FILE_NAME)
        .map_err(|err| InstallError::ReadDistInfo(WHEEL_FILE_NAME.to_string(), err))?;
    let metadata = parse_metadata(&contents);

    match metadata.get("Wheel-Version") {
        Some(SUPPORTED_WHEEL_VERSION) => {}
        Some(version) => {
            return Err(InvalidWheelSourceError::new(
                source.name(),
                format!(
                    "incompatible Wheel-Version {version}, only version {SUPPORTED_WHEEL_VERSION} is supported"
                ),
            )
            .into());
        }
        None => {
            return Err(InvalidWheelSourceError::new(
                source.name(),
                format!("{WHEEL_FILE_NAME} does not specify a Wheel-Version"),
            )
            .into());
        }
    }

    let root_is_purelib = metadata
        .get("Root-Is-Purelib")
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));

    Ok(if root_is_purelib {
        Scheme::Purelib
    } else {
        Scheme::Platlib
    })
}
