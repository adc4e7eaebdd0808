use std::{
    io::Write,
    net::TcpStream,
    os::unix::net::UnixStream,
    thread::{self, JoinHandle},
};

use tracing::{debug, info};

use crate::{
    config::SessionConfig,
    error::SessionError,
    nmea_content::NmeaReader,
    session::{Callbacks, Command, SessionState, run_session},
};

/// Name of the session worker thread.
pub const THREAD_NAME: &str = "gps_state_thread";

/// Handle to a running session thread.
///
/// The thread starts in the stopped phase; fixes reach the location sink only
/// between [`GpsSession::start`] and [`GpsSession::stop`]. Dropping the handle
/// closes the control channel, which ends the thread with
/// [`SessionError::ControlClosed`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use nmea0183_relay::{
///     config::SessionConfig,
///     nmea_content::FixRecord,
///     session::{Callbacks, GpsSession},
/// };
///
/// let callbacks = Callbacks::new(Arc::new(|fix: &FixRecord| println!("{fix:?}")));
/// let session = GpsSession::connect(&SessionConfig::default(), callbacks)?;
/// session.start()?;
/// // ...
/// session.quit()?;
/// session.join()?;
/// # Ok::<(), nmea0183_relay::error::SessionError>(())
/// ```
pub struct GpsSession {
    control: UnixStream,
    thread: Option<JoinHandle<Result<(), SessionError>>>,
}

impl GpsSession {
    /// Connects to the sentence server and spawns the session thread.
    ///
    /// # Errors
    ///
    /// [`SessionError::Connect`] when every attempt was refused, or
    /// [`SessionError::Io`] when the control channel or the thread cannot be
    /// created.
    pub fn connect(config: &SessionConfig, callbacks: Callbacks) -> Result<Self, SessionError> {
        let data = connect_data(config)?;
        Self::spawn(data, callbacks)
    }

    /// Spawns the session thread over an already connected data socket.
    pub fn spawn(data: TcpStream, callbacks: Callbacks) -> Result<Self, SessionError> {
        data.set_nonblocking(true)?;
        let data = mio::net::TcpStream::from_std(data);

        let (control, worker_control) = UnixStream::pair()?;
        worker_control.set_nonblocking(true)?;
        let worker_control = mio::net::UnixStream::from_std(worker_control);

        let state = SessionState::new(NmeaReader::new(), callbacks);
        let thread = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || run_session(state, worker_control, data))?;

        debug!("gps state initialized");
        Ok(GpsSession {
            control,
            thread: Some(thread),
        })
    }

    /// Begins fix delivery.
    pub fn start(&self) -> Result<(), SessionError> {
        self.send(Command::Start)
    }

    /// Ends fix delivery.
    pub fn stop(&self) -> Result<(), SessionError> {
        self.send(Command::Stop)
    }

    /// Asks the thread to end, without waiting for it.
    pub fn quit(&self) -> Result<(), SessionError> {
        self.send(Command::Quit)
    }

    /// Waits for the session thread and returns how it ended.
    pub fn join(mut self) -> Result<(), SessionError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| SessionError::Panicked)?,
            None => Ok(()),
        }
    }

    fn send(&self, command: Command) -> Result<(), SessionError> {
        debug!(?command, "sending command");
        // `write_all` retries on interruption.
        (&self.control).write_all(&[command.as_byte()])?;
        Ok(())
    }
}

fn connect_data(config: &SessionConfig) -> Result<TcpStream, SessionError> {
    let address = config.address();
    let attempts = config.connect_attempts();

    for attempt in 1..=attempts {
        match TcpStream::connect(address) {
            Ok(stream) => {
                info!(%address, "connected to sentence server");
                return Ok(stream);
            }
            Err(error) => debug!(%address, attempt, %error, "connection attempt failed"),
        }
    }

    Err(SessionError::Connect { address, attempts })
}
