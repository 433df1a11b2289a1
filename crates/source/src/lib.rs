mod config;
mod reader;

pub use config::{DEFAULT_DATASET_DIR, default_dataset_path};
pub use reader::BetSource;
