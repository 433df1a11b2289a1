mod batch;
mod bet;

pub use batch::{Batch, BatchError, BatchLimits, Batcher, DEFAULT_MAX_BATCH_KIB};
pub use bet::Bet;
