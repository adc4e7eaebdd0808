//! # Error Types
//!
//! This module defines the error types used throughout the library.
//!
//! Parse-level failures ([`FieldError`]) never abort anything: they only
//! explain why a single field of a sentence was not folded into the current
//! fix. Transport-level failures ([`SessionError`], [`FrameError`],
//! [`ServeError`]) end the session, the update frame or the process that hit
//! them.

use std::io;

use thiserror::Error;

/// Reason a sentence field was not applied to the fix record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The field is absent from the sentence (or was never mapped).
    #[error("field is missing")]
    Missing,

    /// The field is shorter than its fixed format requires.
    #[error("field is too short: {len} bytes, expected {expected}")]
    TooShort {
        /// Length of the field that was found
        len: usize,
        /// Minimum (or exact) length the format requires
        expected: usize,
    },

    /// The field does not hold the expected number.
    #[error("field is not a valid number")]
    Malformed,

    /// The field holds numbers that do not form a valid date or time of day.
    #[error("field is not a valid calendar value")]
    OutOfRange,
}

/// Errors that end a reader session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An I/O error on the data socket, the control channel or the poller.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The data socket could not be connected within the configured attempts.
    #[error("unable to connect to {address} after {attempts} attempts")]
    Connect {
        /// Address of the sentence server
        address: std::net::SocketAddr,
        /// Number of attempts made
        attempts: u32,
    },

    /// The sentence server closed the data socket.
    #[error("data socket hung up")]
    Hangup,

    /// The session handle dropped its end of the control channel.
    #[error("control channel closed")]
    ControlClosed,

    /// The poller reported an error condition on one of the descriptors.
    #[error("error condition reported on {0}")]
    Descriptor(&'static str),

    /// The worker thread panicked.
    #[error("session thread panicked")]
    Panicked,
}

/// Errors raised while reading or decoding a location update frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame could not be read from the update connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No length prefix was available on the update connection.
    #[error("no length prefix available")]
    Empty,

    /// The declared payload length exceeds the configured maximum.
    #[error("declared frame length {len} exceeds the maximum of {max} bytes")]
    TooLarge {
        /// Declared payload length
        len: u64,
        /// Configured maximum payload length
        max: usize,
    },

    /// The frame ended before the declared payload length.
    #[error("frame truncated: expected {expected} bytes, received {received}")]
    Truncated {
        /// Bytes the prefix announced (prefix included)
        expected: usize,
        /// Bytes actually received
        received: usize,
    },

    /// The length prefix or the payload is not valid wire data.
    #[error("malformed frame payload")]
    Malformed,

    /// The payload decoded but carries no GPS record with a known status.
    #[error("payload is not a GPS update")]
    NotGps,
}

/// Errors that prevent the synthesizer from serving at all.
#[derive(Debug, Error)]
pub enum ServeError {
    /// A listening socket could not be created or bound.
    #[error("unable to bind {address}: {source}")]
    Bind {
        /// Address that failed to bind
        address: std::net::SocketAddr,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Accepting the downstream consumer failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
