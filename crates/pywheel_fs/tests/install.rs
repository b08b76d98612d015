use std::path::Path;

use assert_matches::assert_matches;
use indexmap::IndexMap;
use pywheel_core::{HashAlgorithm, InstallError, RecordEntry, Scheme, install, parse_record_file};
use pywheel_fs::{SchemeDictionary, SchemeDictionaryDestination, UnpackedWheelSource};

/// Extracts a small wheel into `root`, with a `RECORD` listing real hashes.
fn unpack_wheel(root: &Path, wheel_file: &str) {
    unpack_wheel_with(root, wheel_file, &[]);
}

fn unpack_wheel_with(root: &Path, wheel_file: &str, extra_files: &[(&str, &str)]) {
    let files = [
        ("demo/__init__.py", "from demo.core import run\n"),
        ("demo/core.py", "def run():\n    return 42\n"),
        ("demo-0.1.dist-info/METADATA", "Metadata-Version: 2.1\nName: demo\nVersion: 0.1\n"),
        ("demo-0.1.dist-info/WHEEL", wheel_file),
        ("demo-0.1.data/scripts/demo", "#!python\nimport demo\ndemo.run()\n"),
        ("demo-0.1.data/data/share/demo/config.toml", "answer = 42\n"),
    ];

    let mut record = String::new();
    for &(path, contents) in files.iter().chain(extra_files) {
        let target = root.join(path);
        fs_err::create_dir_all(target.parent().unwrap()).unwrap();
        fs_err::write(&target, contents).unwrap();
        record.push_str(&format!(
            "{path},sha256={},{}\n",
            HashAlgorithm::Sha256.digest(contents.as_bytes()),
            contents.len()
        ));
    }
    record.push_str("demo-0.1.dist-info/RECORD,,\n");
    fs_err::write(root.join("demo-0.1.dist-info/RECORD"), record).unwrap();
}

fn schemes(prefix: &Path) -> SchemeDictionary {
    let site_packages = prefix.join("lib/python3.12/site-packages");
    SchemeDictionary::default()
        .with(Scheme::Purelib, &site_packages)
        .with(Scheme::Platlib, &site_packages)
        .with(Scheme::Headers, prefix.join("include/demo"))
        .with(Scheme::Scripts, prefix.join("bin"))
        .with(Scheme::Data, prefix)
}

#[test]
fn install_unpacked_wheel() {
    let wheel = tempfile::tempdir().unwrap();
    let prefix = tempfile::tempdir().unwrap();
    unpack_wheel(
        wheel.path(),
        "Wheel-Version: 1.0\nGenerator: hand\nRoot-Is-Purelib: true\nTag: py3-none-any\n",
    );

    let source = UnpackedWheelSource::open(wheel.path()).unwrap();
    source.validate_record().unwrap();

    let mut destination = SchemeDictionaryDestination::new(schemes(prefix.path()), "demo", "0.1");
    let additional_metadata = IndexMap::from([
        ("INSTALLER".to_string(), b"pywheel\n".to_vec()),
        ("REQUESTED".to_string(), Vec::new()),
    ]);
    install(&source, &mut destination, &additional_metadata).unwrap();

    let site_packages = prefix.path().join("lib/python3.12/site-packages");
    assert_eq!(
        fs_err::read_to_string(site_packages.join("demo/core.py")).unwrap(),
        "def run():\n    return 42\n"
    );
    assert_eq!(
        fs_err::read_to_string(prefix.path().join("bin/demo")).unwrap(),
        "#!python\nimport demo\ndemo.run()\n"
    );
    assert_eq!(
        fs_err::read_to_string(prefix.path().join("share/demo/config.toml")).unwrap(),
        "answer = 42\n"
    );
    assert_eq!(
        fs_err::read_to_string(site_packages.join("demo-0.1.dist-info/INSTALLER")).unwrap(),
        "pywheel\n"
    );

    let record_file = site_packages.join("demo-0.1.dist-info/RECORD");
    let entries = parse_record_file(fs_err::File::open(&record_file).unwrap()).unwrap();
    assert_eq!(
        entries.iter().map(RecordEntry::path).collect::<Vec<_>>(),
        vec![
            "demo/__init__.py",
            "demo/core.py",
            "demo-0.1.dist-info/METADATA",
            "demo-0.1.dist-info/WHEEL",
            "../../../bin/demo",
            "../../../share/demo/config.toml",
            "demo-0.1.dist-info/INSTALLER",
            "demo-0.1.dist-info/REQUESTED",
            "demo-0.1.dist-info/RECORD",
        ]
    );

    // The installed RECORD describes the installed files.
    for entry in entries.iter().filter(|entry| entry.hash().is_some()) {
        let mut file = fs_err::File::open(site_packages.join(entry.path())).unwrap();
        assert!(entry.validate(&mut file).unwrap(), "{}", entry.path());
    }
}

#[test]
fn root_and_data_files_with_the_same_name() {
    let wheel = tempfile::tempdir().unwrap();
    let prefix = tempfile::tempdir().unwrap();
    unpack_wheel_with(
        wheel.path(),
        "Wheel-Version: 1.0\nRoot-Is-Purelib: true\n",
        &[
            ("helper.sh", "echo root\n"),
            ("demo-0.1.data/scripts/helper.sh", "echo scripts\n"),
        ],
    );

    let source = UnpackedWheelSource::open(wheel.path()).unwrap();
    let mut destination =
        SchemeDictionaryDestination::new(schemes(prefix.path()), "demo", "0.1");
    install(&source, &mut destination, &IndexMap::new()).unwrap();

    let site_packages = prefix.path().join("lib/python3.12/site-packages");
    let entries = parse_record_file(
        fs_err::File::open(site_packages.join("demo-0.1.dist-info/RECORD")).unwrap(),
    )
    .unwrap();
    let paths = entries.iter().map(RecordEntry::path).collect::<Vec<_>>();
    assert!(paths.contains(&"helper.sh"));
    assert!(paths.contains(&"../../../bin/helper.sh"));

    assert_eq!(
        fs_err::read_to_string(site_packages.join("helper.sh")).unwrap(),
        "echo root\n"
    );
    assert_eq!(
        fs_err::read_to_string(prefix.path().join("bin/helper.sh")).unwrap(),
        "echo scripts\n"
    );
}

#[test]
fn platlib_wheel_goes_to_platlib() {
    let wheel = tempfile::tempdir().unwrap();
    let prefix = tempfile::tempdir().unwrap();
    unpack_wheel(
        wheel.path(),
        "Wheel-Version: 1.0\nRoot-Is-Purelib: false\nTag: cp312-cp312-linux_x86_64\n",
    );

    let schemes = schemes(prefix.path()).with(Scheme::Platlib, prefix.path().join("lib64"));
    let mut destination = SchemeDictionaryDestination::new(schemes, "demo", "0.1");
    let source = UnpackedWheelSource::open(wheel.path()).unwrap();
    install(&source, &mut destination, &IndexMap::new()).unwrap();

    assert!(prefix.path().join("lib64/demo/core.py").is_file());
    assert!(prefix.path().join("lib64/demo-0.1.dist-info/RECORD").is_file());
    assert!(!prefix.path().join("lib/python3.12/site-packages/demo").exists());
}

#[test]
fn unsupported_wheel_version_installs_nothing() {
    let wheel = tempfile::tempdir().unwrap();
    let prefix = tempfile::tempdir().unwrap();
    unpack_wheel(wheel.path(), "Wheel-Version: 2.0\nRoot-Is-Purelib: true\n");

    let mut destination = SchemeDictionaryDestination::new(schemes(prefix.path()), "demo", "0.1");
    let source = UnpackedWheelSource::open(wheel.path()).unwrap();
    let result = install(&source, &mut destination, &IndexMap::new());

    assert_matches!(result, Err(InstallError::InvalidWheelSource(_)));
    assert!(fs_err::read_dir(prefix.path()).unwrap().next().is_none());
}

#[test]
fn existing_files_abort_the_installation() {
    let wheel = tempfile::tempdir().unwrap();
    let prefix = tempfile::tempdir().unwrap();
    unpack_wheel(wheel.path(), "Wheel-Version: 1.0\nRoot-Is-Purelib: true\n");

    let source = UnpackedWheelSource::open(wheel.path()).unwrap();
    install(
        &source,
        &mut SchemeDictionaryDestination::new(schemes(prefix.path()), "demo", "0.1"),
        &IndexMap::new(),
    )
    .unwrap();

    let result = install(
        &source,
        &mut SchemeDictionaryDestination::new(schemes(prefix.path()), "demo", "0.1"),
        &IndexMap::new(),
    );
    assert_matches!(result, Err(InstallError::WriteFile { scheme: Scheme::Purelib, path, .. }) if path == "demo/__init__.py");

    install(
        &source,
        &mut SchemeDictionaryDestination::new(schemes(prefix.path()), "demo", "0.1").with_overwrite_existing(true),
        &IndexMap::new(),
    )
    .unwrap();
}
