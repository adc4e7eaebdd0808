//! # NMEA 0183 Relay
//!
//! This library reads GPS fixes from a stream of NMEA 0183 sentences, and
//! produces such a stream from decimal-degree location updates.
//!
//! The reading side is layered:
//! - [`nmea0183`] cuts the byte stream into lines ([`nmea0183::LineBuffer`])
//!   and lines into fields ([`nmea0183::Tokenizer`])
//! - [`nmea_content`] maps the fields of GGA and RMC sentences onto a
//!   [`FixRecord`] and hands it to a [`FixSink`]
//! - [`session`] runs the reader on its own thread over a TCP socket, steered
//!   by START/STOP/QUIT commands
//!
//! The producing side lives in [`synth`]: a server that ingests
//! length-prefixed update frames and serves the result as GGA and RMC
//! sentences.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use nmea0183_relay::{FixRecord, NmeaReader};
//!
//! let mut reader = NmeaReader::new();
//! reader.set_sink(Some(Arc::new(|fix: &FixRecord| {
//!     println!("{} {}", fix.latitude, fix.longitude);
//! })));
//!
//! reader.feed(b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n");
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod nmea0183;
pub mod nmea_content;
pub mod parsing;
pub mod session;
pub mod synth;

pub use error::{FieldError, FrameError, ServeError, SessionError};
pub use nmea_content::{FixFlags, FixRecord, FixSink, NmeaReader};
pub use session::{Callbacks, GpsSession, GpsStatus, StatusSink};
pub use synth::server::Synthesizer;

#[cfg(doctest)]
#[doc = include_str!("../README.md")]
struct README;
