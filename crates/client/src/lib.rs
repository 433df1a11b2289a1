mod channel;
mod client;
pub mod config;
mod error;
pub mod observer;
mod shutdown;
mod token;

#[cfg(test)]
mod test_support;

pub use channel::Channel;
pub use client::{Client, RunSummary};
pub use config::{ClientConfig, ConnectionMode};
pub use error::ClientError;
pub use observer::{LogObserver, Observer, Phase, RunEvent};
pub use shutdown::ShutdownCoordinator;
pub use token::CancelToken;
