/// The only `Wheel-Version` this installer understands.
pub const SUPPORTED_WHEEL_VERSION: &str = "1.0";

/// Name of the wheel descriptor inside the `.dist-info` directory.
pub const WHEEL_FILE_NAME: &str = "WHEEL";
pub const RECORD_FILE_NAME: &str = "RECORD";
pub const INSTALLER_FILE_NAME: &str = "INSTALLER";
pub const REQUESTED_FILE_NAME: &str = "REQUESTED";

pub const WHEEL_EXTENSION: &str = ".whl";
pub const DIST_INFO_SUFFIX: &str = ".dist-info";
pub const DATA_DIR_SUFFIX: &str = ".data";

/// Size of the buffer used when streaming file contents to a destination.
pub const COPY_CHUNK_SIZE: usize = 64 * 1024;
