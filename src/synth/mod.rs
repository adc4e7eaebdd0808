//! # Synthesizer
//!
//! The producing side of the relay. It keeps a decimal-degree location in a
//! [`PropertyStore`](store::PropertyStore), updates it from length-prefixed
//! update frames ([`frame`]), and periodically serves it to one consumer as a
//! GGA and an RMC sentence ([`server::Synthesizer`]).
//!
//! Serving formats:
//!
//! ```text
//! $GPGGA,hhmmss,DDMM.mmmm,N,DDDMM.mmmm,E,1,08,A,H.hhhhhh,M,0.,M,,,*47
//! $GPRMC,hhmmss,A,DDMM.mmmm,N,DDDMM.mmmm,E,S.ssssss,B.bbbbbb,ddmmyy,B.bbbbbb,*47
//!        │      │ │           │          │ │        │        │      │
//!        │      │ │           │          │ │        │        │      └──────────── variation slot (bearing)
//!        │      │ │           │          │ │        │        └─────────────────── date (UTC)
//!        │      │ │           │          │ │        └──────────────────────────── bearing
//!        │      │ │           │          │ └───────────────────────────────────── speed (always 0)
//!        │      │ │           │          └─────────────────────────────────────── hemisphere E/W
//!        │      │ │           └────────────────────────────────────────────────── longitude
//!        │      │ └────────────────────────────────────────────────────────────── latitude, hemisphere N/S
//!        │      └──────────────────────────────────────────────────────────────── status, always active
//!        └─────────────────────────────────────────────────────────────────────── time (UTC)
//! ```
//!
//! `A` in the GGA line is the integer accuracy figure, `H` the altitude. The
//! checksum is the fixed placeholder [`CHECKSUM_PLACEHOLDER`], never computed.

pub mod frame;
pub mod server;
pub mod store;

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Checksum emitted in place of the real one.
pub const CHECKSUM_PLACEHOLDER: &str = "47";

/// Upper bound of the accuracy figures served.
pub const MAX_ACCURACY: f32 = 200.0;

/// Whether location updates are currently served.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateStatus {
    #[default]
    Disabled,
    Enabled,
}

impl UpdateStatus {
    /// Decodes the wire value (`0` disabled, `1` enabled).
    pub fn from_wire(value: u64) -> Option<Self> {
        match value {
            0 => Some(UpdateStatus::Disabled),
            1 => Some(UpdateStatus::Enabled),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u64 {
        match self {
            UpdateStatus::Disabled => 0,
            UpdateStatus::Enabled => 1,
        }
    }
}

/// One decoded location update.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LocationUpdate {
    pub status: UpdateStatus,
    /// Signed decimal degrees
    pub latitude: f64,
    /// Signed decimal degrees
    pub longitude: f64,
    /// Meters
    pub altitude: f64,
    /// Degrees
    pub bearing: f64,
}

/// Location state read back from the store for one serving cycle.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SynthState {
    pub enabled: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub bearing: f64,
    /// Accuracy figure; `NaN` when the stored value is not a number.
    pub accuracy: f32,
}

impl SynthState {
    /// Whether the accuracy figure lies in `0..=200`.
    pub fn accuracy_in_range(&self) -> bool {
        (0.0..=MAX_ACCURACY).contains(&self.accuracy)
    }
}

/// A decimal-degree value split the way sentences spell it.
///
/// Degrees are the integer part of the magnitude, minutes the fractional part
/// times sixty, truncated to four decimals. Displays as the coordinate field
/// followed by its hemisphere field, e.g. `4807.0380,N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NmeaCoordinate {
    pub degrees: u32,
    pub minutes: u32,
    /// Ten-thousandths of a minute
    pub fraction: u32,
    pub hemisphere: char,
    degree_digits: usize,
}

impl NmeaCoordinate {
    /// Splits a latitude: two degree digits, `N` or `S`.
    pub fn latitude(value: f64) -> Self {
        Self::split(value, 2, 'N', 'S')
    }

    /// Splits a longitude: three degree digits, `E` or `W`.
    pub fn longitude(value: f64) -> Self {
        Self::split(value, 3, 'E', 'W')
    }

    fn split(value: f64, degree_digits: usize, positive: char, negative: char) -> Self {
        let (magnitude, hemisphere) = if value < 0.0 {
            (-value, negative)
        } else {
            (value, positive)
        };

        let degrees = magnitude.trunc();
        let minutes = 60.0 * (magnitude - degrees);
        let whole_minutes = minutes.trunc();
        let fraction = (10_000.0 * (minutes - whole_minutes)).trunc();

        NmeaCoordinate {
            degrees: degrees as u32,
            minutes: whole_minutes as u32,
            fraction: fraction as u32,
            hemisphere,
            degree_digits,
        }
    }

    /// The signed decimal degrees this value stands for.
    pub fn to_degrees(&self) -> f64 {
        let minutes = f64::from(self.minutes) + f64::from(self.fraction) / 10_000.0;
        let degrees = f64::from(self.degrees) + minutes / 60.0;
        match self.hemisphere {
            'S' | 'W' => -degrees,
            _ => degrees,
        }
    }
}

impl fmt::Display for NmeaCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:0width$}{:02}.{:04},{}",
            self.degrees,
            self.minutes,
            self.fraction,
            self.hemisphere,
            width = self.degree_digits
        )
    }
}

fn time_field(now: OffsetDateTime) -> String {
    format!("{:02}{:02}{:02}", now.hour(), now.minute(), now.second())
}

fn date_field(now: OffsetDateTime) -> String {
    format!(
        "{:02}{:02}{:02}",
        now.day(),
        u8::from(now.month()),
        now.year().rem_euclid(100)
    )
}

/// Formats the GGA sentence of `state` at `now` (UTC).
pub fn format_gga(state: &SynthState, now: OffsetDateTime) -> String {
    format!(
        "$GPGGA,{},{},{},1,08,{},{:.6},M,0.,M,,,*{}\n",
        time_field(now),
        NmeaCoordinate::latitude(state.latitude),
        NmeaCoordinate::longitude(state.longitude),
        state.accuracy as i32,
        state.altitude,
        CHECKSUM_PLACEHOLDER
    )
}

/// Formats the RMC sentence of `state` at `now` (UTC).
///
/// Speed is always zero. The bearing is repeated in the magnetic variation
/// slot, which carries no direction letter.
pub fn format_rmc(state: &SynthState, now: OffsetDateTime) -> String {
    format!(
        "$GPRMC,{},A,{},{},{:.6},{:.6},{},{:.6},*{}\n",
        time_field(now),
        NmeaCoordinate::latitude(state.latitude),
        NmeaCoordinate::longitude(state.longitude),
        0.0,
        state.bearing,
        date_field(now),
        state.bearing,
        CHECKSUM_PLACEHOLDER
    )
}
