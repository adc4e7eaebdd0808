//! # Session
//!
//! A session owns one [`NmeaReader`] and feeds it from a TCP data socket on a
//! dedicated worker thread. The thread is steered through a private control
//! channel that carries single-byte [`Command`]s:
//!
//! ```text
//!            START (session-begin, sink registered)
//!          ┌─────────────────────────────────────┐
//!          │                                     ▼
//!     ┌─────────┐                           ┌─────────┐
//!     │ STOPPED │                           │ STARTED │
//!     └─────────┘                           └─────────┘
//!          ▲                                     │
//!          └─────────────────────────────────────┘
//!            STOP (session-end, sink removed)
//!
//!     QUIT from either state: engine-off, the loop ends.
//! ```
//!
//! [`SessionState`] is the transition table on its own, usable without any
//! socket; [`run_session`] is the multiplexed loop; [`GpsSession`] is the
//! handle that connects, spawns and sends commands.

mod handle;
mod worker;

pub use handle::GpsSession;
pub use worker::run_session;

use std::{ops::ControlFlow, sync::Arc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::nmea_content::{FixSink, NmeaReader};

/// Control command, encoded as one byte on the control channel.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ends the session loop.
    Quit = 0,
    /// Begins delivering fixes.
    Start = 1,
    /// Stops delivering fixes.
    Stop = 2,
}

impl Command {
    /// Decodes a control byte. Unknown bytes yield [`None`].
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Command::Quit),
            1 => Some(Command::Start),
            2 => Some(Command::Stop),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Engine and session status reported to the [`StatusSink`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpsStatus {
    /// The session loop is running.
    EngineOn,
    /// The session loop is quitting.
    EngineOff,
    /// Fix delivery has begun.
    SessionBegin,
    /// Fix delivery has ended.
    SessionEnd,
}

/// Receives [`GpsStatus`] changes from the session thread.
pub trait StatusSink: Send + Sync {
    fn status(&self, status: GpsStatus);
}

impl<F> StatusSink for F
where
    F: Fn(GpsStatus) + Send + Sync,
{
    fn status(&self, status: GpsStatus) {
        self(status)
    }
}

/// Observers a session reports to.
#[derive(Clone)]
pub struct Callbacks {
    /// Receives fixes while the session is started.
    pub location: Arc<dyn FixSink>,
    /// Receives status changes, if present.
    pub status: Option<Arc<dyn StatusSink>>,
}

impl Callbacks {
    pub fn new(location: Arc<dyn FixSink>) -> Self {
        Callbacks {
            location,
            status: None,
        }
    }

    /// Adds a status observer.
    #[must_use]
    pub fn with_status(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = Some(status);
        self
    }
}

/// Lifecycle phase of a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Stopped,
    Started,
    /// Terminal; no further command is processed.
    Quit,
}

/// The session's state machine together with the reader it drives.
pub struct SessionState {
    phase: Phase,
    reader: NmeaReader,
    callbacks: Callbacks,
}

impl SessionState {
    pub fn new(reader: NmeaReader, callbacks: Callbacks) -> Self {
        SessionState {
            phase: Phase::Stopped,
            reader,
            callbacks,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn reader(&self) -> &NmeaReader {
        &self.reader
    }

    /// Signals that the loop is running. Called once, at loop entry.
    pub fn begin(&mut self) {
        info!("gps engine on");
        self.report(GpsStatus::EngineOn);
    }

    /// Applies one control byte.
    ///
    /// Returns [`ControlFlow::Break`] once the session has quit; bytes
    /// received after that are ignored.
    pub fn handle_command(&mut self, byte: u8) -> ControlFlow<()> {
        if self.phase == Phase::Quit {
            return ControlFlow::Break(());
        }

        match Command::from_byte(byte) {
            Some(Command::Quit) => {
                info!("gps thread quitting on demand");
                self.phase = Phase::Quit;
                self.report(GpsStatus::EngineOff);
                return ControlFlow::Break(());
            }
            Some(Command::Start) if self.phase == Phase::Stopped => {
                info!("gps session starting");
                self.phase = Phase::Started;
                self.report(GpsStatus::SessionBegin);
                self.reader
                    .set_sink(Some(Arc::clone(&self.callbacks.location)));
            }
            Some(Command::Stop) if self.phase == Phase::Started => {
                info!("gps session stopping");
                self.phase = Phase::Stopped;
                self.report(GpsStatus::SessionEnd);
                self.reader.set_sink(None);
            }
            Some(command) => debug!(?command, phase = ?self.phase, "command has no effect"),
            None => debug!(byte, "unknown gps command"),
        }

        ControlFlow::Continue(())
    }

    /// Feeds bytes received on the data socket to the reader.
    pub fn handle_data(&mut self, bytes: &[u8]) {
        self.reader.feed(bytes);
    }

    fn report(&self, status: GpsStatus) {
        match &self.callbacks.status {
            Some(sink) => sink.status(status),
            None => debug!(?status, "no status sink available"),
        }
    }
}
