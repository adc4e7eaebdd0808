//! gps-listen - print the fixes read from a sentence server.

use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use clap::Parser;
use nmea0183_relay::{
    Callbacks, FixRecord, GpsSession, GpsStatus, SessionError,
    config::{self, SessionConfig},
    logging,
};
use tracing::{error, info};

/// Connects to a sentence server and logs every fix it reports.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address of the sentence server
    #[arg(long, default_value_t = SessionConfig::default().address())]
    server: SocketAddr,

    /// Connection attempts before giving up
    #[arg(long, default_value_t = config::CONNECT_ATTEMPTS)]
    attempts: u32,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = SessionConfig::new(args.server).with_connect_attempts(args.attempts);

    let location = |fix: &FixRecord| {
        info!(
            latitude = fix.latitude,
            longitude = fix.longitude,
            altitude = fix.altitude,
            speed = fix.speed,
            bearing = fix.bearing,
            accuracy = fix.accuracy,
            timestamp = fix.timestamp,
            flags = fix.flags.bits(),
            "fix"
        );
    };
    let status = |status: GpsStatus| info!(?status, "status");
    let callbacks = Callbacks::new(Arc::new(location)).with_status(Arc::new(status));

    let result = GpsSession::connect(&config, callbacks).and_then(|session| {
        session.start()?;
        session.join()
    });

    match result {
        Ok(()) | Err(SessionError::Hangup) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "session failed");
            ExitCode::FAILURE
        }
    }
}
