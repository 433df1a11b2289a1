use std::{borrow::Cow, io, sync::Arc, time::Duration};

use agency_model::{Batch, Batcher, Bet};
use agency_protocol::{BatchReply, PollReply, Request, parse_winners};

use crate::{
    channel::Channel,
    config::{ClientConfig, ConnectionMode},
    error::ClientError,
    observer::{Observer, Phase, RunEvent},
    token::CancelToken,
};

/// Totals for a completed run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub bets: usize,
    /// Bets the aggregator refused with a `REJECTED` reply.
    pub rejected: usize,
    pub winners: Vec<String>,
}

/// Drives one submission run against the aggregator.
///
/// The run goes through batching and dispatch of every bet, the `END`
/// marker, polling until results are ready, and the winner query. Liveness
/// is checked whenever a phase starts; once the cancel token flips, the run
/// stops with [`ClientError::NotLive`]. Network failures seen after
/// cancellation are reported as `NotLive` too, since the coordinator closing
/// the stream is what caused them.
pub struct Client {
    config: ClientConfig,
    token: Arc<CancelToken>,
    observer: Arc<dyn Observer>,
    channel: Option<Channel>,
    phase: Phase,
}

impl Client {
    pub fn new(config: ClientConfig, token: Arc<CancelToken>, observer: Arc<dyn Observer>) -> Self {
        Self {
            config,
            token,
            observer,
            channel: None,
            phase: Phase::Init,
        }
    }

    /// Submits `bets` in order and returns the winners for this agency.
    pub fn run<I>(&mut self, bets: I) -> Result<RunSummary, ClientError>
    where
        I: IntoIterator<Item = io::Result<Bet>>,
    {
        self.phase = Phase::Init;
        let result = self.run_phases(bets);
        self.channel = None;

        if let Err(ClientError::NotLive) = &result {
            self.emit(RunEvent::Interrupted { phase: self.phase });
        }
        result
    }

    fn run_phases<I>(&mut self, bets: I) -> Result<RunSummary, ClientError>
    where
        I: IntoIterator<Item = io::Result<Bet>>,
    {
        self.enter(Phase::Init)?;
        let mut batcher = Batcher::new(self.config.batch)?;
        let mut summary = RunSummary::default();

        for row in bets {
            self.enter(Phase::Batching)?;
            let bet = row.map_err(ClientError::Source)?;
            if let Some(batch) = batcher.push(bet)? {
                self.dispatch(&batch, &mut summary)?;
            }
        }

        self.enter(Phase::Drain)?;
        if let Some(batch) = batcher.finish() {
            self.dispatch(&batch, &mut summary)?;
            self.enter(Phase::Drain)?;
        }
        let reply = self.exchange(&Request::End)?;
        self.emit(RunEvent::EndAcknowledged { reply });

        self.enter(Phase::Poll)?;
        self.await_results()?;

        self.enter(Phase::Query)?;
        let agency = self.config.agency.clone();
        let reply = self.exchange(&Request::Query { agency: &agency })?;
        summary.winners = parse_winners(&reply)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.emit(RunEvent::Winners {
            count: summary.winners.len(),
        });

        Ok(summary)
    }

    /// Sends one frozen batch, interprets the reply, then paces.
    fn dispatch(&mut self, batch: &Batch, summary: &mut RunSummary) -> Result<(), ClientError> {
        self.enter(Phase::Dispatch)?;

        let count = batch.count();
        self.emit(RunEvent::BatchSent {
            count,
            weight: batch.weight(),
        });

        let reply = self.exchange(&Request::Bets(Cow::Owned(batch.payload())))?;
        match BatchReply::parse(&reply) {
            BatchReply::Accepted => self.emit(RunEvent::BatchAccepted { count }),
            BatchReply::Rejected(rejected) => {
                summary.rejected += rejected;
                self.emit(RunEvent::BatchRejected { count, rejected });
            }
            BatchReply::Unexpected(reply) => {
                self.emit(RunEvent::BatchUnexpectedReply { count, reply })
            }
        }

        summary.batches += 1;
        summary.bets += count;

        self.pause(self.config.batch_sleep)
    }

    /// Polls with `WIN` until the aggregator answers `Y`.
    fn await_results(&mut self) -> Result<(), ClientError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let reply = self.exchange(&Request::Poll)?;
            if PollReply::parse(&reply) == PollReply::Ready {
                self.emit(RunEvent::ResultsReady { attempts: attempt });
                return Ok(());
            }
            self.emit(RunEvent::PollPending { attempt });

            if self.config.loop_amount != 0 && attempt >= self.config.loop_amount {
                return Err(ClientError::ResultsUnavailable { attempts: attempt });
            }

            self.pause(self.config.loop_period)?;
            self.enter(Phase::Poll)?;
        }
    }

    /// One half-duplex round trip, opening a connection when needed.
    fn exchange(&mut self, request: &Request<'_>) -> Result<String, ClientError> {
        let result = self.round_trip(&request.encode());

        if self.config.connection == ConnectionMode::PerExchange {
            self.channel = None;
        }
        result.map_err(|e| self.classify(e))
    }

    fn round_trip(&mut self, payload: &[u8]) -> Result<String, ClientError> {
        let channel = match self.channel.take() {
            Some(channel) => channel,
            None => {
                let channel =
                    match Channel::connect(&self.config.server_address, Arc::clone(&self.token)) {
                        Ok(channel) => channel,
                        Err(ClientError::Connect { addr, source }) if self.token.is_live() => {
                            self.emit(RunEvent::ConnectFailed {
                                addr: addr.clone(),
                                error: source.to_string(),
                            });
                            return Err(ClientError::Connect { addr, source });
                        }
                        Err(err) => return Err(err),
                    };
                self.emit(RunEvent::Connected {
                    addr: channel.addr().to_string(),
                });
                channel
            }
        };
        self.channel.insert(channel).exchange(payload)
    }

    /// A failure after cancellation is the shutdown itself, not a fault.
    fn classify(&self, err: ClientError) -> ClientError {
        if self.token.is_live() {
            err
        } else {
            ClientError::NotLive
        }
    }

    fn enter(&mut self, phase: Phase) -> Result<(), ClientError> {
        self.phase = phase;
        if self.token.is_live() {
            Ok(())
        } else {
            Err(ClientError::NotLive)
        }
    }

    fn pause(&self, duration: Duration) -> Result<(), ClientError> {
        if duration.is_zero() || self.token.sleep(duration) {
            Ok(())
        } else {
            Err(ClientError::NotLive)
        }
    }

    fn emit(&self, event: RunEvent) {
        self.observer.on_event(&event);
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
