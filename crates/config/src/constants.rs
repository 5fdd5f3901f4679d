//! Default locations and environment variable names

pub const DEFAULT_DB_PATH: &str = "/var/lib/bpi/bpi.sqlite";
pub const DEFAULT_BLOBSTORE_PATH: &str = "/var/lib/bpi/blobs";

pub const CONFIG_DIR_NAME: &str = "bpi";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_OUTPUT: &str = "BPI_OUTPUT";
pub const ENV_COLOR: &str = "BPI_COLOR";
pub const ENV_DB_PATH: &str = "BPI_DB_PATH";
pub const ENV_BLOBSTORE_PATH: &str = "BPI_BLOBSTORE_PATH";
pub const ENV_INSTALLER_MAX_ATTEMPTS: &str = "BPI_INSTALLER_MAX_ATTEMPTS";
