//! # Configuration
//!
//! Settings for the two ends of the relay: [`SessionConfig`] for the reader
//! side that connects to a sentence server, and [`SynthConfig`] for the
//! synthesizer that serves sentences and ingests location updates.
//!
//! Both start from the well-known defaults and are adjusted with consuming
//! builder methods:
//!
//! ```rust
//! use std::time::Duration;
//! use nmea0183_relay::config::SynthConfig;
//!
//! let config = SynthConfig::default().with_period(Duration::from_millis(500));
//! assert_eq!(config.period(), Duration::from_millis(500));
//! ```

use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

/// Port the synthesizer serves sentences on, and the session connects to.
pub const GPS_PORT: u16 = 22470;

/// Port the synthesizer accepts location update frames on.
pub const SIM_GPS_PORT: u16 = 22471;

/// Number of connection attempts made before a session gives up.
pub const CONNECT_ATTEMPTS: u32 = 3;

/// Time between two serving cycles of the synthesizer.
pub const SERVING_PERIOD: Duration = Duration::from_secs(2);

/// Largest update payload accepted, in bytes.
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

/// Time allowed to read one update frame once its connection was accepted.
pub const FRAME_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings of a reader session.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Address of the sentence server.
    address: SocketAddr,

    /// Connection attempts before giving up.
    connect_attempts: u32,
}

impl SessionConfig {
    /// Creates a configuration that connects to `address`.
    pub fn new(address: SocketAddr) -> Self {
        SessionConfig {
            address,
            connect_attempts: CONNECT_ATTEMPTS,
        }
    }

    /// Sets the address of the sentence server.
    pub fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    /// Sets the number of connection attempts.
    ///
    /// # Arguments
    ///
    /// * `attempts` - Attempts made before [`SessionError::Connect`] is
    ///   returned; `0` is treated as `1`.
    ///
    /// [`SessionError::Connect`]: crate::error::SessionError::Connect
    pub fn with_connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts.max(1);
        self
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }
}

impl Default for SessionConfig {
    /// Connects to `127.0.0.1:`[`GPS_PORT`] with [`CONNECT_ATTEMPTS`] attempts.
    fn default() -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::LOCALHOST, GPS_PORT)))
    }
}

/// Settings of the sentence synthesizer.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthConfig {
    /// Address the downstream consumer connects to.
    serve_address: SocketAddr,

    /// Address update producers connect to.
    update_address: SocketAddr,

    /// Time between two serving cycles.
    period: Duration,

    /// Largest update payload accepted.
    max_frame_len: usize,

    /// Read timeout of an update connection.
    frame_timeout: Duration,
}

impl SynthConfig {
    /// Sets the address sentences are served on.
    pub fn with_serve_address(mut self, address: SocketAddr) -> Self {
        self.serve_address = address;
        self
    }

    /// Sets the address update frames are accepted on.
    pub fn with_update_address(mut self, address: SocketAddr) -> Self {
        self.update_address = address;
        self
    }

    /// Sets the serving period.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Sets the largest accepted update payload, in bytes.
    pub fn with_max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// Sets the read timeout of update connections.
    ///
    /// A zero duration is replaced by one millisecond, since sockets refuse a
    /// zero timeout.
    pub fn with_frame_timeout(mut self, timeout: Duration) -> Self {
        self.frame_timeout = timeout.max(Duration::from_millis(1));
        self
    }

    pub fn serve_address(&self) -> SocketAddr {
        self.serve_address
    }

    pub fn update_address(&self) -> SocketAddr {
        self.update_address
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    pub fn frame_timeout(&self) -> Duration {
        self.frame_timeout
    }
}

impl Default for SynthConfig {
    /// Serves on [`GPS_PORT`] and ingests on [`SIM_GPS_PORT`], on all
    /// interfaces, every [`SERVING_PERIOD`].
    fn default() -> Self {
        SynthConfig {
            serve_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, GPS_PORT)),
            update_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, SIM_GPS_PORT)),
            period: SERVING_PERIOD,
            max_frame_len: MAX_FRAME_LEN,
            frame_timeout: FRAME_READ_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.address(), "127.0.0.1:22470".parse().unwrap());
        assert_eq!(config.connect_attempts(), 3);
    }

    #[test]
    fn test_session_builder() {
        let address: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let config = SessionConfig::default()
            .with_address(address)
            .with_connect_attempts(0);

        assert_eq!(config.address(), address);
        assert_eq!(config.connect_attempts(), 1);
    }

    #[test]
    fn test_synth_defaults() {
        let config = SynthConfig::default();
        assert_eq!(config.serve_address().port(), GPS_PORT);
        assert_eq!(config.update_address().port(), SIM_GPS_PORT);
        assert_eq!(config.period(), Duration::from_secs(2));
        assert_eq!(config.max_frame_len(), 4 * 1024 * 1024);
        assert_eq!(config.frame_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_synth_builder() {
        let config = SynthConfig::default()
            .with_period(Duration::from_millis(10))
            .with_max_frame_len(64)
            .with_frame_timeout(Duration::ZERO);

        assert_eq!(config.period(), Duration::from_millis(10));
        assert_eq!(config.max_frame_len(), 64);
        assert_eq!(config.frame_timeout(), Duration::from_millis(1));
    }
}
