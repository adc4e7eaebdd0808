//! gps-inject - send one location update frame to a synthesizer.

use std::{io::Write, net::SocketAddr, net::TcpStream, process::ExitCode};

use clap::{Parser, ValueEnum};
use nmea0183_relay::{
    config::SynthConfig,
    logging,
    synth::{LocationUpdate, UpdateStatus, frame::encode_frame},
};
use tracing::{error, info};

/// GPS status carried by the update.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Status {
    /// Serve the location
    Enabled,
    /// Stop serving
    Disabled,
}

impl From<Status> for UpdateStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Enabled => UpdateStatus::Enabled,
            Status::Disabled => UpdateStatus::Disabled,
        }
    }
}

/// Sends a location update to the synthesizer's update port.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Latitude in signed decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    latitude: f64,

    /// Longitude in signed decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    longitude: f64,

    /// Altitude in meters
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    altitude: f64,

    /// Bearing in degrees
    #[arg(long, default_value_t = 0.0)]
    bearing: f64,

    #[arg(long, value_enum, default_value_t = Status::Enabled)]
    status: Status,

    /// Address of the synthesizer's update port
    #[arg(long, default_value_t = localhost(SynthConfig::default().update_address()))]
    target: SocketAddr,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn localhost(mut address: SocketAddr) -> SocketAddr {
    address.set_ip([127, 0, 0, 1].into());
    address
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    let update = LocationUpdate {
        status: args.status.into(),
        latitude: args.latitude,
        longitude: args.longitude,
        altitude: args.altitude,
        bearing: args.bearing,
    };
    let frame = encode_frame(&update);

    let sent = TcpStream::connect(args.target).and_then(|mut stream| stream.write_all(&frame));
    match sent {
        Ok(()) => {
            info!(address = %args.target, len = frame.len(), "update sent");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(address = %args.target, %err, "unable to send update");
            ExitCode::FAILURE
        }
    }
}
