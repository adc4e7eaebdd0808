//! Named key/value store shared between update ingestion and serving.
//!
//! Values are kept as strings. Numbers are written with six decimals and read
//! back leniently, so a store edited by hand keeps working.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::{
    parsing::parse_decimal,
    synth::{LocationUpdate, SynthState, UpdateStatus},
};

pub const GPS_STATUS: &str = "gps.status";
pub const GPS_LATITUDE: &str = "gps.latitude";
pub const GPS_LONGITUDE: &str = "gps.longitude";
pub const GPS_ALTITUDE: &str = "gps.altitude";
pub const GPS_BEARING: &str = "gps.bearing";
pub const GPS_ACCURACY: &str = "gps.accuracy";

pub const GPS_ENABLED: &str = "enabled";
pub const GPS_DISABLED: &str = "disabled";

/// Status assumed when none was ever stored.
pub const GPS_DEFAULT_STATUS: &str = GPS_DISABLED;
/// Accuracy assumed when none was ever stored.
pub const GPS_DEFAULT_ACCURACY: &str = "20";

/// A named key/value store.
pub trait PropertyStore: Send + Sync {
    /// Reads `key`, or [`None`] when it was never set.
    fn get(&self, key: &str) -> Option<String>;

    /// Sets `key` to `value`, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Reads `key`, falling back to `default`.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_owned())
    }
}

/// In-process [`PropertyStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys set.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl PropertyStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_owned(), value.to_owned());
    }
}

/// Resets the stored coordinates to zero.
pub fn seed(store: &dyn PropertyStore) {
    for key in [GPS_LATITUDE, GPS_LONGITUDE, GPS_ALTITUDE, GPS_BEARING] {
        store.set(key, "0");
    }
}

/// Stores an accepted update.
pub fn write_update(store: &dyn PropertyStore, update: &LocationUpdate) {
    let status = match update.status {
        UpdateStatus::Enabled => GPS_ENABLED,
        UpdateStatus::Disabled => GPS_DISABLED,
    };

    store.set(GPS_STATUS, status);
    store.set(GPS_LATITUDE, &format!("{:.6}", update.latitude));
    store.set(GPS_LONGITUDE, &format!("{:.6}", update.longitude));
    store.set(GPS_ALTITUDE, &format!("{:.6}", update.altitude));
    store.set(GPS_BEARING, &format!("{:.6}", update.bearing));

    debug!(
        status,
        latitude = update.latitude,
        longitude = update.longitude,
        altitude = update.altitude,
        bearing = update.bearing,
        "stored location update"
    );
}

fn number(store: &dyn PropertyStore, key: &str) -> f64 {
    store
        .get(key)
        .and_then(|value| parse_decimal(value.trim().as_bytes()))
        .unwrap_or(0.0)
}

/// Reads the state of one serving cycle.
///
/// Unreadable coordinates count as zero; an unreadable accuracy becomes
/// `NaN`, which is out of range.
pub fn read_state(store: &dyn PropertyStore) -> SynthState {
    let enabled = store.get_or(GPS_STATUS, GPS_DEFAULT_STATUS) == GPS_ENABLED;
    let accuracy = store.get_or(GPS_ACCURACY, GPS_DEFAULT_ACCURACY);
    let accuracy = parse_decimal(accuracy.trim().as_bytes())
        .map_or(f32::NAN, |value| value as f32);

    SynthState {
        enabled,
        latitude: number(store, GPS_LATITUDE),
        longitude: number(store, GPS_LONGITUDE),
        altitude: number(store, GPS_ALTITUDE),
        bearing: number(store, GPS_BEARING),
        accuracy,
    }
}
