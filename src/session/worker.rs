use std::{
    io::{ErrorKind, Read},
    ops::ControlFlow,
};

use mio::{
    Events, Interest, Poll, Token,
    event::Event,
    net::{TcpStream, UnixStream},
};
use tracing::{debug, error, trace, warn};

use crate::{error::SessionError, session::SessionState};

const CONTROL: Token = Token(0);
const DATA: Token = Token(1);

/// Size of the receive buffer used to drain the data socket.
const READ_CHUNK: usize = 128;

/// Runs a session until it quits or one of its descriptors fails.
///
/// `control` and `data` must be in non-blocking mode. Each readiness event
/// drains its descriptor until it would block: every pending control byte is
/// applied in order, every received data byte is fed to the reader.
///
/// # Errors
///
/// * [`SessionError::ControlClosed`] when the control channel reaches EOF.
/// * [`SessionError::Hangup`] when the data socket reaches EOF.
/// * [`SessionError::Descriptor`] when the poller flags an error condition.
/// * [`SessionError::Io`] on any other I/O failure.
///
/// No reconnection is attempted.
pub fn run_session(
    mut state: SessionState,
    mut control: UnixStream,
    mut data: TcpStream,
) -> Result<(), SessionError> {
    let mut poll = Poll::new()?;
    poll.registry()
        .register(&mut control, CONTROL, Interest::READABLE)?;
    poll.registry()
        .register(&mut data, DATA, Interest::READABLE)?;

    let mut events = Events::with_capacity(2);
    state.begin();

    loop {
        if let Err(error) = poll.poll(&mut events, None) {
            if error.kind() == ErrorKind::Interrupted {
                continue;
            }
            error!(%error, "poll failed");
            return Err(error.into());
        }

        trace!(count = events.iter().count(), "gps thread received events");

        for event in events.iter() {
            match event.token() {
                CONTROL => {
                    check(event, "control channel")?;
                    if drain_control(&mut control, &mut state)?.is_break() {
                        return Ok(());
                    }
                }
                DATA => {
                    check(event, "data socket")?;
                    drain_data(&mut data, &mut state)?;
                }
                token => warn!(?token, "event for unknown token"),
            }
        }
    }
}

fn check(event: &Event, descriptor: &'static str) -> Result<(), SessionError> {
    if event.is_error() {
        error!(descriptor, "error condition after poll");
        return Err(SessionError::Descriptor(descriptor));
    }
    Ok(())
}

fn drain_control(
    control: &mut UnixStream,
    state: &mut SessionState,
) -> Result<ControlFlow<()>, SessionError> {
    let mut commands = [0u8; 16];

    loop {
        match control.read(&mut commands) {
            Ok(0) => {
                warn!("control channel closed");
                return Err(SessionError::ControlClosed);
            }
            Ok(len) => {
                for &byte in &commands[..len] {
                    if state.handle_command(byte).is_break() {
                        return Ok(ControlFlow::Break(()));
                    }
                }
            }
            Err(error) if error.kind() == ErrorKind::WouldBlock => {
                return Ok(ControlFlow::Continue(()));
            }
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => {
                error!(%error, "error while reading control channel");
                return Err(error.into());
            }
        }
    }
}

fn drain_data(data: &mut TcpStream, state: &mut SessionState) -> Result<(), SessionError> {
    let mut buffer = [0u8; READ_CHUNK];

    loop {
        match data.read(&mut buffer) {
            Ok(0) => {
                warn!("sentence server hung up");
                return Err(SessionError::Hangup);
            }
            Ok(len) => {
                debug!(len, "received bytes");
                state.handle_data(&buffer[..len]);
            }
            Err(error) if error.kind() == ErrorKind::WouldBlock => return Ok(()),
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => {
                error!(%error, "error while reading from sentence server");
                return Err(error.into());
            }
        }
    }
}
