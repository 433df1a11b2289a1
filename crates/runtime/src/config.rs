pub const PROGRAM_NAME: &str = "agency";

/// Environment variable holding the log level.
pub const PROGRAM_LOG_LEVEL: &str = "CLI_LOG_LEVEL";

/// Config file read when none is given explicitly.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

pub const DEFAULT_SERVER_ADDRESS: &str = "server:12345";

/// Pause between `WIN` polls.
pub const DEFAULT_LOOP_PERIOD_MS: u64 = 5_000;

/// `0` keeps polling until results are ready.
pub const DEFAULT_LOOP_AMOUNT: u32 = 0;

pub const DEFAULT_BATCH_MAX_AMOUNT: usize = 100;

/// Pause after every dispatched batch.
pub const DEFAULT_BATCH_SLEEP_MS: u64 = 100;
