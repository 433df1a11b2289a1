use std::path::{Path, PathBuf};

/// Directory the agency datasets are mounted under.
pub const DEFAULT_DATASET_DIR: &str = "/dataset";

/// `<dir>/agency-<id>.csv`
pub fn default_dataset_path(dir: impl AsRef<Path>, agency: &str) -> PathBuf {
    dir.as_ref().join(format!("agency-{agency}.csv"))
}
