use std::{
    io::{self, ErrorKind, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::Arc,
    thread,
};

use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::{
    config::SynthConfig,
    error::{FrameError, ServeError},
    synth::{
        LocationUpdate, SynthState, format_gga, format_rmc,
        frame::{PREFIX_PEEK_LEN, frame_header, read_frame},
        store::{self, PropertyStore},
    },
};

/// Serves the stored location to one consumer at a time and ingests update
/// frames between serving cycles.
///
/// Every cycle, at most one pending update connection is accepted and its
/// frame read in full; then, if serving is enabled and an update was ever
/// accepted, one GGA and one RMC sentence are written to the consumer.
pub struct Synthesizer {
    config: SynthConfig,
    consumers: TcpListener,
    updates: TcpListener,
    store: Arc<dyn PropertyStore>,
    updated: bool,
}

impl Synthesizer {
    /// Binds both listening sockets and seeds the store.
    ///
    /// # Errors
    ///
    /// [`ServeError::Bind`] when either socket cannot be bound.
    pub fn bind(config: SynthConfig, store: Arc<dyn PropertyStore>) -> Result<Self, ServeError> {
        let consumers = bind(config.serve_address())?;
        store::seed(store.as_ref());

        let updates = bind(config.update_address())?;
        updates.set_nonblocking(true)?;

        Ok(Synthesizer {
            config,
            consumers,
            updates,
            store,
            updated: false,
        })
    }

    /// Address sentences are served on.
    pub fn serve_addr(&self) -> io::Result<SocketAddr> {
        self.consumers.local_addr()
    }

    /// Address update frames are accepted on.
    pub fn update_addr(&self) -> io::Result<SocketAddr> {
        self.updates.local_addr()
    }

    pub fn store(&self) -> &Arc<dyn PropertyStore> {
        &self.store
    }

    /// Whether at least one update was accepted.
    pub fn has_update(&self) -> bool {
        self.updated
    }

    /// Serves consumers one after the other, forever.
    ///
    /// # Errors
    ///
    /// Returns only when accepting a consumer fails.
    pub fn run(&mut self) -> Result<(), ServeError> {
        loop {
            let client = self.accept()?;
            self.serve(client);
        }
    }

    fn accept(&self) -> Result<TcpStream, ServeError> {
        loop {
            match self.consumers.accept() {
                Ok((client, peer)) => {
                    info!(%peer, "consumer connected");
                    return Ok(client);
                }
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) => {
                    error!(%error, "unable to accept consumer");
                    return Err(error.into());
                }
            }
        }
    }

    /// Serves one consumer until writing to it fails.
    pub fn serve(&mut self, mut client: TcpStream) {
        loop {
            thread::sleep(self.config.period());

            if let Err(error) = self.cycle(&mut client) {
                warn!(%error, "consumer dropped");
                return;
            }
        }
    }

    /// Runs one serving cycle against `client`, without waiting.
    ///
    /// Returns whether sentences were written.
    pub fn cycle<W: Write>(&mut self, client: &mut W) -> io::Result<bool> {
        self.poll_update();

        let Some((gga, rmc)) = self.compose(OffsetDateTime::now_utc()) else {
            return Ok(false);
        };

        debug!(
            gga = gga.trim_end(),
            rmc = rmc.trim_end(),
            "sending sentences"
        );
        client.write_all(gga.as_bytes())?;
        client.write_all(rmc.as_bytes())?;
        Ok(true)
    }

    /// Accepts one pending update connection, if any, and stores its frame.
    ///
    /// Returns whether an update was stored. A missing connection and a bad
    /// frame both leave the store untouched.
    pub fn poll_update(&mut self) -> bool {
        let (mut producer, peer) = match self.updates.accept() {
            Ok(accepted) => accepted,
            Err(error) if error.kind() == ErrorKind::WouldBlock => return false,
            Err(error) => {
                debug!(%error, "no update connection");
                return false;
            }
        };

        debug!(%peer, "update connection accepted");
        match self.ingest(&mut producer) {
            Ok(update) => {
                store::write_update(self.store.as_ref(), &update);
                self.updated = true;
                true
            }
            Err(error) => {
                warn!(%peer, %error, "update discarded");
                false
            }
        }
    }

    fn ingest(&self, producer: &mut TcpStream) -> Result<LocationUpdate, FrameError> {
        producer.set_nonblocking(false)?;
        producer.set_read_timeout(Some(self.config.frame_timeout()))?;

        let mut prefix = [0u8; PREFIX_PEEK_LEN];
        let peeked = loop {
            match producer.peek(&mut prefix) {
                Ok(peeked) => break peeked,
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) => return Err(error.into()),
            }
        };

        let header = frame_header(&prefix[..peeked], self.config.max_frame_len())?;
        debug!(payload_len = header.payload_len, "reading update frame");
        read_frame(producer, header)
    }

    /// Formats the sentences of the current state, if they are to be served.
    pub fn compose(&self, now: OffsetDateTime) -> Option<(String, String)> {
        let state: SynthState = store::read_state(self.store.as_ref());

        if !self.updated || !state.enabled {
            debug!(
                updated = self.updated,
                enabled = state.enabled,
                "nothing to serve"
            );
            return None;
        }

        if !state.accuracy_in_range() {
            error!(
                accuracy = state.accuracy,
                "invalid accuracy, should be in [0..200]"
            );
            return None;
        }

        Some((format_gga(&state, now), format_rmc(&state, now)))
    }
}

fn bind(address: SocketAddr) -> Result<TcpListener, ServeError> {
    let listener = TcpListener::bind(address).map_err(|source| {
        error!(%address, %source, "unable to bind");
        ServeError::Bind { address, source }
    })?;
    info!(%address, "listening");
    Ok(listener)
}
