//! System-wide constants, configuration keys, and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Default base directory for glancepub data when `$HOME` is unusable.
pub const SYSTEM_DATA_DIR: &str = "/var/lib/glancepub";

/// Per-user data directory name, created under the home directory.
const USER_DATA_DIR_NAME: &str = ".glancepub";

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the data directory: `~/.glancepub` when the home directory is
/// known and writable, otherwise [`SYSTEM_DATA_DIR`]. Resolved once per
/// process.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(|| {
        ["HOME", "USERPROFILE"]
            .into_iter()
            .filter_map(std::env::var_os)
            .find(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(USER_DATA_DIR_NAME))
            .filter(|dir| std::fs::create_dir_all(dir).is_ok())
            .unwrap_or_else(|| PathBuf::from(SYSTEM_DATA_DIR))
    })
}

/// Returns the default root under which per-task working directories live.
pub fn default_working_root() -> PathBuf {
    data_dir().join("working")
}

/// Returns the default Glance publish directory.
pub fn default_publish_dir() -> PathBuf {
    data_dir().join("published").join("glance")
}

/// Unit type id of Glance disk images.
pub const IMAGE_TYPE_ID: &str = "glance_image";

/// Unit key field holding the image checksum.
pub const UNIT_KEY_IMAGE_CHECKSUM: &str = "image_checksum";

/// Distributor type id.
pub const WEB_DISTRIBUTOR_TYPE_ID: &str = "glance_web_distributor";

/// Plugin config key naming the Glance publish directory.
pub const CONFIG_KEY_GLANCE_PUBLISH_DIRECTORY: &str = "glance_publish_directory";

/// Plugin config key selecting how published filenames are derived.
pub const CONFIG_KEY_FILENAME_SCHEME: &str = "filename_scheme";

/// Plugin config key enabling MD5 verification of image files.
pub const CONFIG_KEY_VERIFY_CHECKSUM: &str = "verify_checksum";

/// Step type id of the root web publisher.
pub const PUBLISH_STEP_WEB_PUBLISHER: &str = "publish_to_web";

/// Step type id of the image linking step.
pub const PUBLISH_STEP_IMAGES: &str = "publish_images";

/// Step type id of the atomic directory publish step.
pub const PUBLISH_STEP_OVER_HTTP: &str = "publish_images_over_http";

/// Subdirectory of the working directory that holds web-servable files.
pub const WEB_DIR_NAME: &str = "web";

/// Subdirectory of the publish directory holding timestamped master trees.
pub const MASTER_DIR_NAME: &str = "master";

/// Name of the redirect listing written into the web directory.
pub const REDIRECT_FILE_NAME: &str = "redirect.json";

/// URL prefix under which published repositories are served.
pub const WEB_URL_PREFIX: &str = "/pulp/glance";

/// MD5 digest length in hex characters.
pub const MD5_HEX_LENGTH: usize = 32;
