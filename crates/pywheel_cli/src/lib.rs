//! # pywheel CLI
//!
//! Installs a wheel that was extracted to a directory into the directories of
//! a Python environment.
#![deny(clippy::dbg_macro, clippy::unwrap_used)]

use std::{env, path::PathBuf};

use clap::Parser;
use indexmap::IndexMap;
use miette::IntoDiagnostic;
use pywheel_core::{
    HashAlgorithm, Scheme, WheelSource,
    consts::{INSTALLER_FILE_NAME, REQUESTED_FILE_NAME},
};
use pywheel_fs::{SchemeDictionary, SchemeDictionaryDestination, UnpackedWheelSource};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "pywheel", version, about = "Install Python wheels into a scheme of directories")]
pub struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global_options: GlobalOptions,
}

#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Increase logging verbosity (-v for warnings, -vv for info, -vvv for debug, -vvvv for trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (quiet mode)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    quiet: u8,
}

impl Args {
    fn log_level_filter(&self) -> LevelFilter {
        match (self.global_options.quiet, self.global_options.verbose) {
            // Quiet mode overrides verbose
            (q, _) if q > 0 => LevelFilter::OFF,
            (_, 0) => LevelFilter::ERROR,
            (_, 1) => LevelFilter::WARN,
            (_, 2) => LevelFilter::INFO,
            (_, 3) => LevelFilter::DEBUG,
            (_, _) => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
pub enum Command {
    Install(InstallArgs),
}

/// Install an unpacked wheel.
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Directory the wheel was extracted to
    wheel_dir: PathBuf,

    /// JSON file mapping scheme names to directories, e.g. the output of
    /// `sysconfig.get_paths()`
    #[arg(long, env = "PYWHEEL_SCHEME_FILE")]
    scheme_file: Option<PathBuf>,

    /// Directory for pure Python modules
    #[arg(long, env = "PYWHEEL_PURELIB")]
    purelib: Option<PathBuf>,

    /// Directory for platform specific modules
    #[arg(long, env = "PYWHEEL_PLATLIB")]
    platlib: Option<PathBuf>,

    /// Directory for C headers
    #[arg(long, env = "PYWHEEL_HEADERS")]
    headers: Option<PathBuf>,

    /// Directory for scripts
    #[arg(long, env = "PYWHEEL_SCRIPTS")]
    scripts: Option<PathBuf>,

    /// Directory for data files
    #[arg(long, env = "PYWHEEL_DATA")]
    data: Option<PathBuf>,

    /// Hash algorithm used in the installed RECORD
    #[arg(long, default_value_t = HashAlgorithm::Sha256, env = "PYWHEEL_HASH_ALGORITHM")]
    hash_algorithm: HashAlgorithm,

    /// Contents of the INSTALLER file
    #[arg(long, default_value = "pywheel", env = "PYWHEEL_INSTALLER")]
    installer: String,

    /// Mark the distribution as explicitly requested by writing a REQUESTED file
    #[arg(long)]
    requested: bool,

    /// Replace files that already exist
    #[arg(long, env = "PYWHEEL_OVERWRITE")]
    overwrite: bool,

    /// Check the files of the wheel against its RECORD before installing
    #[arg(long)]
    validate_record: bool,
}

impl InstallArgs {
    /// The scheme directories from the scheme file, overridden by the
    /// individual flags.
    fn scheme_dictionary(&self, distribution: &str) -> miette::Result<SchemeDictionary> {
        let base = match &self.scheme_file {
            Some(path) => SchemeDictionary::from_path(path, distribution)?,
            None => SchemeDictionary::default(),
        };

        let mut overrides = SchemeDictionary::default();
        for (scheme, directory) in [
            (Scheme::Purelib, &self.purelib),
            (Scheme::Platlib, &self.platlib),
            (Scheme::Headers, &self.headers),
            (Scheme::Scripts, &self.scripts),
            (Scheme::Data, &self.data),
        ] {
            if let Some(directory) = directory {
                overrides.insert(scheme, directory);
            }
        }

        Ok(base.merge(overrides))
    }

    fn additional_metadata(&self) -> IndexMap<String, Vec<u8>> {
        let mut metadata = IndexMap::new();
        metadata.insert(
            INSTALLER_FILE_NAME.to_string(),
            format!("{}\n", self.installer).into_bytes(),
        );
        if self.requested {
            metadata.insert(REQUESTED_FILE_NAME.to_string(), Vec::new());
        }
        metadata
    }
}

pub fn execute() -> miette::Result<()> {
    let args = Args::parse();
    setup_logging(&args)?;

    match args.command {
        Command::Install(args) => install(args),
    }
}

fn install(args: InstallArgs) -> miette::Result<()> {
    let source = UnpackedWheelSource::open(&args.wheel_dir)?;
    if args.validate_record {
        source.validate_record()?;
        tracing::info!("{} matches its RECORD", args.wheel_dir.display());
    }

    let schemes = args.scheme_dictionary(source.distribution())?;
    let missing = schemes.missing();
    if !missing.is_empty() {
        // Files are only written to the schemes a wheel uses.
        tracing::debug!(
            "no directory configured for: {}",
            missing
                .iter()
                .map(|scheme| scheme.as_ref())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let mut destination =
        SchemeDictionaryDestination::new(schemes, source.distribution(), source.version())
        .with_hash_algorithm(args.hash_algorithm)
        .with_overwrite_existing(args.overwrite);

    pywheel_core::install(&source, &mut destination, &args.additional_metadata())?;

    eprintln!(
        "Installed {}-{}",
        source.distribution(),
        source.version()
    );
    Ok(())
}

fn setup_logging(args: &Args) -> miette::Result<()> {
    use tracing_subscriber::{
        EnvFilter, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
    };

    let (level_filter, pywheel_level) = match args.log_level_filter() {
        LevelFilter::OFF => (LevelFilter::OFF, LevelFilter::OFF),
        LevelFilter::ERROR => (LevelFilter::ERROR, LevelFilter::WARN),
        LevelFilter::WARN => (LevelFilter::WARN, LevelFilter::INFO),
        LevelFilter::INFO => (LevelFilter::INFO, LevelFilter::DEBUG),
        LevelFilter::DEBUG => (LevelFilter::DEBUG, LevelFilter::TRACE),
        LevelFilter::TRACE => (LevelFilter::TRACE, LevelFilter::TRACE),
    };

    let directives = format!(
        "pywheel={pywheel_level},pywheel_cli={pywheel_level},pywheel_core={pywheel_level},pywheel_fs={pywheel_level}"
    );

    // CLI flags take precedence, otherwise RUST_LOG overrides our directives.
    let cli_verbosity_set = args.global_options.verbose > 0 || args.global_options.quiet > 0;
    let env_directives = env::var("RUST_LOG").unwrap_or_default();
    let final_directives = if cli_verbosity_set || env_directives.is_empty() {
        directives
    } else {
        format!("{directives},{env_directives}")
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .parse(&final_directives)
        .into_diagnostic()?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(pywheel_level >= LevelFilter::DEBUG)
        .without_time();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
    Ok(())
}
