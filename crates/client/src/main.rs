use std::{process::ExitCode, sync::Arc};

use agency_client::{
    CancelToken, Client, ClientConfig, ClientError, LogObserver, Observer, ShutdownCoordinator,
};
use agency_runtime::logging;
use agency_source::BetSource;
use anyhow::Context;
use log::{error, info, warn};

fn main() -> ExitCode {
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            logging::init().ok();
            error!("action: config | result: fail | error: {err:#}");
            return ExitCode::from(2);
        }
    };

    logging::init_with_level(config.log_level).ok();

    match run(config) {
        Ok(code) => code,
        Err(err) => {
            error!("action: run | result: fail | error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: ClientConfig) -> anyhow::Result<ExitCode> {
    info!(
        "Starting agency client: id={}, server={}, dataset={}, batch_max_amount={}, batch_max_kib={}, connection={:?}",
        config.agency,
        config.server_address,
        config.dataset.display(),
        config.batch.max_count,
        config.batch.max_kib,
        config.connection,
    );

    let token = Arc::new(CancelToken::new());
    let observer: Arc<dyn Observer> = Arc::new(LogObserver::new(config.agency.as_str()));

    let shutdown = ShutdownCoordinator::spawn(Arc::clone(&token), Arc::clone(&observer))
        .context("Failed to register signal handlers")?;

    let mut source = BetSource::open(&config.dataset, config.agency.as_str())
        .with_context(|| format!("Failed to open dataset {}", config.dataset.display()))?;

    let mut client = Client::new(config, token, observer);
    let result = client.run(source.by_ref());

    if source.skipped() > 0 {
        warn!(
            "action: read_bets | result: partial | skipped_rows: {}",
            source.skipped()
        );
    }
    shutdown.stop();

    match result {
        Ok(summary) => {
            info!(
                "action: run | result: success | batches: {} | bets: {} | rejected: {} | winners: {}",
                summary.batches,
                summary.bets,
                summary.rejected,
                summary.winners.len()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(ClientError::NotLive) => {
            info!("action: run | result: stopped | reason: shutdown requested");
            Ok(ExitCode::SUCCESS)
        }
        // Already reported by the observer as a failed connect.
        Err(ClientError::Connect { .. }) => Ok(ExitCode::FAILURE),
        Err(err) => Err(err.into()),
    }
}
