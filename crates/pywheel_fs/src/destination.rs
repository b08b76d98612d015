use std::{
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use pywheel_core::{
    Hash, HashAlgorithm, RecordEntry, Scheme, WheelDestination, copy_with_hashing,
    consts::{DATA_DIR_SUFFIX, DIST_INFO_SUFFIX, RECORD_FILE_NAME},
    resolve_destination, write_record_file,
};

use crate::{
    atomic_write::atomic_write_sync,
    paths::{relative_wheel_path, to_record_path},
    scheme_dictionary::SchemeDictionary,
};

/// Installs the files of a wheel into the directories of a
/// [`SchemeDictionary`].
#[derive(Debug, Clone)]
pub struct SchemeDictionaryDestination {
    schemes: SchemeDictionary,
    dist_info_dir: String,
    data_dir: String,
    hash_algorithm: HashAlgorithm,
    overwrite_existing: bool,
}

impl SchemeDictionaryDestination {
    /// A destination for the wheel of `distribution` (escaped, as in the
    /// `.dist-info` directory name) at `version`.
    pub fn new(schemes: SchemeDictionary, distribution: &str, version: &str) -> Self {
        Self {
            schemes,
            dist_info_dir: format!("{distribution}-{version}{DIST_INFO_SUFFIX}"),
            data_dir: format!("{distribution}-{version}{DATA_DIR_SUFFIX}"),
            hash_algorithm: HashAlgorithm::default(),
            overwrite_existing: false,
        }
    }

    /// The algorithm used for the hashes in the `RECORD` file.
    pub fn with_hash_algorithm(self, hash_algorithm: HashAlgorithm) -> Self {
        Self {
            hash_algorithm,
            ..self
        }
    }

    /// Whether existing files may be replaced. By default writing a file that
    /// already exists fails.
    pub fn with_overwrite_existing(self, overwrite_existing: bool) -> Self {
        Self {
            overwrite_existing,
            ..self
        }
    }

    pub fn schemes(&self) -> &SchemeDictionary {
        &self.schemes
    }

    fn scheme_directory(&self, scheme: Scheme) -> io::Result<&Path> {
        self.schemes
            .directory(scheme)
            .map_err(|err| io::Error::new(io::ErrorKind::NotFound, err))
    }

    /// Split a wheel path into its scheme and the path below the scheme
    /// directory, `scheme` is used for files outside of the `.data` directory.
    fn locate<'p>(&self, scheme: Scheme, path: &'p str) -> io::Result<(Scheme, &'p str)> {
        resolve_destination(path, &self.data_dir, scheme)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))
    }

    fn target_path(&self, scheme: Scheme, relative: &str) -> io::Result<PathBuf> {
        Ok(self
            .scheme_directory(scheme)?
            .join(relative_wheel_path(relative)?))
    }

    /// The path of an installed file as written to the `RECORD`, relative to
    /// the directory of `root_scheme`.
    fn record_path(&self, root_scheme: Scheme, path: &str) -> io::Result<String> {
        let (scheme, relative) = self.locate(root_scheme, path)?;
        if scheme == root_scheme {
            return Ok(relative.to_string());
        }

        let root = self.scheme_directory(root_scheme)?;
        let target = self.target_path(scheme, relative)?;
        let relative = pathdiff::diff_paths(&target, root).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "cannot express {} relative to {}",
                    target.display(),
                    root.display()
                ),
            )
        })?;
        Ok(to_record_path(&relative))
    }
}

impl WheelDestination for SchemeDictionaryDestination {
    fn write_file(
        &mut self,
        scheme: Scheme,
        path: &str,
        stream: &mut dyn Read,
    ) -> io::Result<RecordEntry> {
        let (located, relative) = self.locate(scheme, path)?;
        if located != scheme {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{path} belongs to the {located} scheme, not to {scheme}"),
            ));
        }

        let target = self.target_path(scheme, relative)?;
        if let Some(parent) = target.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let file = if self.overwrite_existing {
            fs_err::File::create(&target)?
        } else {
            fs_err::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)?
        };

        let mut writer = BufWriter::new(file);
        let copied = copy_with_hashing(stream, &mut writer, self.hash_algorithm)?;
        writer.flush()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if scheme == Scheme::Scripts {
                fs_err::set_permissions(&target, std::fs::Permissions::from_mode(0o755))?;
            }
        }

        tracing::debug!("wrote {} ({} bytes)", target.display(), copied.size);

        Ok(RecordEntry::new(
            path,
            Hash::new(copied.algorithm.to_string(), copied.digest),
            copied.size,
        ))
    }

    fn finalize_installation(
        &mut self,
        scheme: Scheme,
        records: Vec<RecordEntry>,
    ) -> io::Result<()> {
        let record_file_path = format!("{}/{RECORD_FILE_NAME}", self.dist_info_dir);

        let mut entries = records
            .into_iter()
            .map(|record| {
                let path = self.record_path(scheme, record.path())?;
                Ok(record.with_path(path))
            })
            .collect::<io::Result<Vec<_>>>()?;
        entries.push(RecordEntry::unhashed(record_file_path.as_str()));

        let mut contents = Vec::new();
        write_record_file(&mut contents, &entries)?;

        let target = self.target_path(scheme, &record_file_path)?;
        if let Some(parent) = target.parent() {
            fs_err::create_dir_all(parent)?;
        }
        atomic_write_sync(&target, contents)?;

        tracing::info!(
            "wrote {} with {} entries",
            target.display(),
            entries.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pywheel_core::parse_record_file;

    use super::*;

    fn destination(root: &Path) -> SchemeDictionaryDestination {
        SchemeDictionaryDestination::new(
            SchemeDictionary::default()
                .with(Scheme::Purelib, root.join("lib"))
                .with(Scheme::Platlib, root.join("lib"))
                .with(Scheme::Headers, root.join("include").join("pkg"))
                .with(Scheme::Scripts, root.join("bin"))
                .with(Scheme::Data, root),
            "pkg",
            "1.0",
        )
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut destination = destination(dir.path());

        let record = destination
            .write_file(Scheme::Purelib, "pkg/__init__.py", &mut b"x = 1\n".as_slice())
            .unwrap();

        assert_eq!(
            fs_err::read_to_string(dir.path().join("lib/pkg/__init__.py")).unwrap(),
            "x = 1\n"
        );
        assert_eq!(record.path(), "pkg/__init__.py");
        assert_eq!(record.size(), Some(6));
        assert_eq!(
            record.hash(),
            Some(&Hash::new("sha256", HashAlgorithm::Sha256.digest(b"x = 1\n")))
        );
    }

    #[test]
    fn test_data_files_are_placed_below_their_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let mut destination = destination(dir.path());

        let record = destination
            .write_file(
                Scheme::Data,
                "pkg-1.0.data/data/share/pkg/a.txt",
                &mut b"data".as_slice(),
            )
            .unwrap();

        assert_eq!(record.path(), "pkg-1.0.data/data/share/pkg/a.txt");
        assert_eq!(
            fs_err::read_to_string(dir.path().join("share/pkg/a.txt")).unwrap(),
            "data"
        );
    }

    #[test]
    fn test_rejects_scheme_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut destination = destination(dir.path());
        let err = destination
            .write_file(
                Scheme::Purelib,
                "pkg-1.0.data/scripts/run",
                &mut b"".as_slice(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!dir.path().join("bin").exists());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut destination = destination(dir.path());
        destination
            .write_file(Scheme::Purelib, "a.py", &mut b"1".as_slice())
            .unwrap();

        let err = destination
            .write_file(Scheme::Purelib, "a.py", &mut b"2".as_slice())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        let mut destination = destination.with_overwrite_existing(true);
        destination
            .write_file(Scheme::Purelib, "a.py", &mut b"2".as_slice())
            .unwrap();
        assert_eq!(
            fs_err::read_to_string(dir.path().join("lib/a.py")).unwrap(),
            "2"
        );
    }

    #[test]
    fn test_rejects_paths_outside_of_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let mut destination = destination(dir.path());
        let err = destination
            .write_file(Scheme::Purelib, "../escape.py", &mut b"".as_slice())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!dir.path().join("escape.py").exists());
    }

    #[test]
    fn test_missing_scheme_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut destination = SchemeDictionaryDestination::new(
            SchemeDictionary::default().with(Scheme::Purelib, dir.path()),
            "pkg",
            "1.0",
        );
        let err = destination
            .write_file(Scheme::Scripts, "pkg-1.0.data/scripts/run", &mut b"".as_slice())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_scripts_are_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut destination = destination(dir.path());
        destination
            .write_file(
                Scheme::Scripts,
                "pkg-1.0.data/scripts/run",
                &mut b"#!/bin/sh\n".as_slice(),
            )
            .unwrap();

        let mode = fs_err::metadata(dir.path().join("bin/run"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn test_finalize_writes_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut destination = destination(dir.path()).with_hash_algorithm(HashAlgorithm::Sha512);

        let mut records = Vec::new();
        for (scheme, path, contents) in [
            (Scheme::Purelib, "pkg/__init__.py", "x = 1\n"),
            (Scheme::Purelib, "run", "root level\n"),
            (Scheme::Scripts, "pkg-1.0.data/scripts/run", "#!/bin/sh\n"),
            (Scheme::Headers, "pkg-1.0.data/headers/pkg.h", "int x;\n"),
            (Scheme::Purelib, "pkg-1.0.dist-info/INSTALLER", "pywheel"),
        ] {
            records.push(
                destination
                    .write_file(scheme, path, &mut contents.as_bytes())
                    .unwrap(),
            );
        }

        destination
            .finalize_installation(Scheme::Purelib, records)
            .unwrap();

        let record_file =
            fs_err::File::open(dir.path().join("lib/pkg-1.0.dist-info/RECORD")).unwrap();
        let entries = parse_record_file(record_file).unwrap();
        assert_eq!(
            entries.iter().map(RecordEntry::path).collect::<Vec<_>>(),
            vec![
                "pkg/__init__.py",
                "run",
                "../bin/run",
                "../include/pkg/pkg.h",
                "pkg-1.0.dist-info/INSTALLER",
                "pkg-1.0.dist-info/RECORD",
            ]
        );
        assert_matches!(entries[0].hash(), Some(Hash { algorithm, .. }) if algorithm == "sha512");
        assert_eq!(entries[5], RecordEntry::unhashed("pkg-1.0.dist-info/RECORD"));

        // Every hashed entry matches the file on disk.
        let lib = dir.path().join("lib");
        for entry in &entries[..5] {
            let mut file = fs_err::File::open(lib.join(entry.path())).unwrap();
            assert!(entry.validate(&mut file).unwrap(), "{}", entry.path());
        }
    }
}
