mod config;
pub mod logging;

pub use config::{
    DEFAULT_BATCH_MAX_AMOUNT, DEFAULT_BATCH_SLEEP_MS, DEFAULT_CONFIG_PATH, DEFAULT_LOOP_AMOUNT,
    DEFAULT_LOOP_PERIOD_MS, DEFAULT_SERVER_ADDRESS, PROGRAM_LOG_LEVEL, PROGRAM_NAME,
};

pub use logging::init;
