//! Platform-specific directory paths.
//!
//! Uses XDG on Linux, standard locations on macOS/Windows.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "cc-auth";
const APPLICATION: &str = "cc-auth-demo";

/// Get project directories, or None if home directory cannot be determined.
fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Get the data directory for the demo certificate store.
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Get the cache directory for logs.
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Get the path to the certificate store, creating its directory.
pub fn certificates_db() -> Option<PathBuf> {
    let dir = data_dir()?;
    ensure_dir(&dir)?;
    Some(dir.join("certificates.db"))
}

/// Get the path to the log file, creating its directory.
pub fn log_file() -> Option<PathBuf> {
    let dir = cache_dir()?;
    ensure_dir(&dir)?;
    Some(dir.join("latest.log"))
}

fn ensure_dir(dir: &Path) -> Option<()> {
    fs::create_dir_all(dir).ok()
}
