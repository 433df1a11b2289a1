//! In-process stand-in for the aggregator, an observer that records events,
//! and a logger that keeps what it is given.

use std::{
    net::TcpListener,
    sync::{
        Arc, Mutex, Once,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use agency_protocol::codec::{read_frame, write_frame};
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::observer::{Observer, RunEvent};

/// What the fake peer does with one request.
pub enum Scripted {
    Reply(String),
    /// Keep the connection open without answering, then drop it.
    Hold(Duration),
    /// Close the connection without answering.
    Hangup,
}

pub fn reply(text: &str) -> Scripted {
    Scripted::Reply(text.to_string())
}

pub struct FakePeer {
    addr: String,
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
}

impl FakePeer {
    /// Serves connections one after another on a background thread,
    /// answering each frame with `script`.
    pub fn spawn<F>(mut script: F) -> Self
    where
        F: FnMut(&str) -> Scripted + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake peer");
        let addr = listener.local_addr().expect("local addr").to_string();
        let received = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&received);
        let accepted = Arc::clone(&connections);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                accepted.fetch_add(1, Ordering::SeqCst);

                while let Ok(frame) = read_frame(&mut stream) {
                    let msg = String::from_utf8_lossy(&frame).into_owned();
                    seen.lock().unwrap().push(msg.clone());

                    match script(&msg) {
                        Scripted::Reply(text) => {
                            if write_frame(&mut stream, text.as_bytes()).is_err() {
                                break;
                            }
                        }
                        Scripted::Hold(d) => {
                            thread::sleep(d);
                            break;
                        }
                        Scripted::Hangup => break,
                    }
                }
            }
        });

        Self {
            addr,
            received,
            connections,
        }
    }

    /// Peer that answers like the real aggregator: `ACK` for batches,
    /// `N` for the first `pending_polls` polls then `Y`, and `winners`
    /// for the query.
    pub fn aggregator(pending_polls: usize, winners: &'static str) -> Self {
        let mut polls = 0;
        Self::spawn(move |msg| match msg {
            "END\n" => reply("END ACK\n"),
            "WIN\n" => {
                polls += 1;
                if polls > pending_polls {
                    reply("Y\n")
                } else {
                    reply("N\n")
                }
            }
            m if m.starts_with("CON|") => reply(winners),
            _ => reply("ACK\n"),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Observer for RecordingObserver {
    fn on_event(&self, event: &RunEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Process-wide logger that stores every record. Tests share it, so each
/// one should filter on something unique to itself, such as its client id.
pub struct CapturedLog {
    lines: Mutex<Vec<(Level, String)>>,
}

impl CapturedLog {
    pub fn install() -> &'static CapturedLog {
        static CAPTURED: CapturedLog = CapturedLog {
            lines: Mutex::new(Vec::new()),
        };
        static INSTALL: Once = Once::new();

        INSTALL.call_once(|| {
            log::set_logger(&CAPTURED).expect("no other logger in test binary");
            log::set_max_level(LevelFilter::Trace);
        });
        &CAPTURED
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<(Level, String)> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, line)| line.contains(needle))
            .cloned()
            .collect()
    }
}

impl Log for CapturedLog {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.lines
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}
