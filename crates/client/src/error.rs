use std::io;

use agency_model::BatchError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("{action} failed: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: io::Error,
    },

    /// Shutdown was requested; not a fault.
    #[error("client is no longer live")]
    NotLive,

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("could not read bets: {0}")]
    Source(#[source] io::Error),

    #[error("results still not ready after {attempts} polls")]
    ResultsUnavailable { attempts: u32 },
}

impl ClientError {
    pub(crate) fn io(action: &'static str, source: io::Error) -> Self {
        ClientError::Io { action, source }
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, ClientError::NotLive)
    }
}
