//! gps-synth - serve location updates as NMEA 0183 sentences.

use std::{net::SocketAddr, process::ExitCode, sync::Arc, time::Duration};

use clap::Parser;
use nmea0183_relay::{
    Synthesizer,
    config::{self, SynthConfig},
    logging,
    synth::store::{GPS_ACCURACY, MemoryStore, PropertyStore},
};
use tracing::error;

/// Serves GGA and RMC sentences built from the latest location update.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address the sentence consumer connects to
    #[arg(long, default_value_t = SynthConfig::default().serve_address())]
    serve: SocketAddr,

    /// Address location update frames are sent to
    #[arg(long, default_value_t = SynthConfig::default().update_address())]
    updates: SocketAddr,

    /// Milliseconds between two serving cycles
    #[arg(long, default_value_t = config::SERVING_PERIOD.as_millis() as u64)]
    period_ms: u64,

    /// Milliseconds allowed to read one update frame
    #[arg(long, default_value_t = config::FRAME_READ_TIMEOUT.as_millis() as u64)]
    frame_timeout_ms: u64,

    /// Accuracy figure served, in 0..=200
    #[arg(long)]
    accuracy: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = SynthConfig::default()
        .with_serve_address(args.serve)
        .with_update_address(args.updates)
        .with_period(Duration::from_millis(args.period_ms))
        .with_frame_timeout(Duration::from_millis(args.frame_timeout_ms));

    let store = Arc::new(MemoryStore::new());
    if let Some(accuracy) = &args.accuracy {
        store.set(GPS_ACCURACY, accuracy);
    }

    let mut synth = match Synthesizer::bind(config, store) {
        Ok(synth) => synth,
        Err(err) => {
            error!(%err, "unable to start");
            return ExitCode::FAILURE;
        }
    };

    match synth.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "server stopped");
            ExitCode::FAILURE
        }
    }
}
