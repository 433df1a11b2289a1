use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
};

use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::{Handle, Signals},
};

use crate::{
    observer::{Observer, RunEvent},
    token::CancelToken,
};

/// Signals that end the run early.
pub const SHUTDOWN_SIGNALS: [i32; 2] = [SIGTERM, SIGINT];

/// Watches for termination signals on its own thread and cancels the token.
///
/// The first signal flips the token, which also closes whatever connection
/// the orchestrator has open. Further signals are reported and ignored.
pub struct ShutdownCoordinator {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl ShutdownCoordinator {
    pub fn spawn(token: Arc<CancelToken>, observer: Arc<dyn Observer>) -> io::Result<Self> {
        let mut signals = Signals::new(SHUTDOWN_SIGNALS)?;
        let handle = signals.handle();

        let thread = thread::Builder::new()
            .name("shutdown".into())
            .spawn(move || {
                for signal in signals.forever() {
                    let first = token.cancel();
                    observer.on_event(&RunEvent::ShutdownRequested { signal, first });
                }
            })?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Stops listening and waits for the watcher thread.
    pub fn stop(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ShutdownCoordinator {
    fn drop(&mut self) {
        self.close();
    }
}
