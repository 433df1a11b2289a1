use std::{
    net::{Shutdown, TcpStream},
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::error::ClientError;

/// Liveness flag shared by the orchestrator and the shutdown coordinator.
///
/// The flag goes from live to cancelled once and never back. Alongside it
/// the token keeps a clone of the stream currently in use, so cancelling can
/// unblock a send or receive stuck on the network. Registering a stream and
/// cancelling both happen under the same lock: a stream is either shut down
/// by `cancel` or refused by `register`, never missed.
pub struct CancelToken {
    live: AtomicBool,
    stream: Mutex<Option<TcpStream>>,
    /// Dropped on cancel, which wakes every pending [`CancelToken::sleep`].
    wake_tx: Mutex<Option<Sender<()>>>,
    wake_rx: Receiver<()>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CancelToken {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = channel::bounded(0);
        Self {
            live: AtomicBool::new(true),
            stream: Mutex::new(None),
            wake_tx: Mutex::new(Some(wake_tx)),
            wake_rx,
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Flips the token and closes the registered stream, if any.
    ///
    /// Returns `true` for the call that performed the transition; later
    /// calls change nothing.
    pub fn cancel(&self) -> bool {
        if !self.live.swap(false, Ordering::AcqRel) {
            return false;
        }

        lock(&self.wake_tx).take();

        if let Some(stream) = lock(&self.stream).take() {
            // NotConnected just means the peer already went away.
            let _ = stream.shutdown(Shutdown::Both);
        }
        true
    }

    /// Remembers `stream` so a later cancel can close it.
    pub fn register(&self, stream: &TcpStream) -> Result<(), ClientError> {
        let handle = stream
            .try_clone()
            .map_err(|e| ClientError::io("register stream", e))?;

        let mut slot = lock(&self.stream);
        if !self.is_live() {
            let _ = handle.shutdown(Shutdown::Both);
            return Err(ClientError::NotLive);
        }
        *slot = Some(handle);
        Ok(())
    }

    pub fn release(&self) {
        lock(&self.stream).take();
    }

    /// Whether a stream is currently registered.
    pub fn has_stream(&self) -> bool {
        lock(&self.stream).is_some()
    }

    /// Sleeps for `duration` unless cancelled first.
    ///
    /// Returns whether the token is still live afterwards.
    pub fn sleep(&self, duration: Duration) -> bool {
        if !self.is_live() {
            return false;
        }
        match self.wake_rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => self.is_live(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
