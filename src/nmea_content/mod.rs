//! # NMEA Content
//!
//! Turns tokenized sentences into [`FixRecord`]s.
//!
//! Each received sentence is identified by its code, its fields are copied
//! into a fresh [`SentenceFieldSet`] through the sentence's mapping table
//! (see [`sentences`]), and [`NmeaReader`] folds whatever is usable into the
//! fix it keeps across sentences. A fix is handed to the registered
//! [`FixSink`] as soon as any of its values changed.

pub mod parse;
mod reader;
pub mod sentences;

pub use reader::{ACCURACY_FALLBACK, DateCache, MIN_SENTENCE_LEN, NmeaReader};
pub use sentences::{FieldMap, GGA_FIELDS, RMC_FIELDS};

use core::ops::{BitOr, BitOrAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::nmea0183::FieldSlice;

/// Set of [`FixRecord`] values populated since the last delivery.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixFlags(u16);

impl FixFlags {
    /// Latitude and longitude are set.
    pub const LAT_LONG: FixFlags = FixFlags(0x0001);
    /// Altitude is set.
    pub const ALTITUDE: FixFlags = FixFlags(0x0002);
    /// Speed is set.
    pub const SPEED: FixFlags = FixFlags(0x0004);
    /// Bearing is set.
    pub const BEARING: FixFlags = FixFlags(0x0008);
    /// Accuracy is set.
    pub const ACCURACY: FixFlags = FixFlags(0x0010);

    pub const fn empty() -> Self {
        FixFlags(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: FixFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: FixFlags) {
        self.0 |= other.0;
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

impl BitOr for FixFlags {
    type Output = FixFlags;

    fn bitor(self, rhs: FixFlags) -> FixFlags {
        FixFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for FixFlags {
    fn bitor_assign(&mut self, rhs: FixFlags) {
        self.insert(rhs);
    }
}

/// The latest known position estimate.
///
/// Values persist across sentences; only `flags` is reset, when the record is
/// delivered, so a consumer that registers late still receives the most
/// recent values.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FixRecord {
    /// Values updated since the last delivery
    pub flags: FixFlags,
    /// Latitude in signed decimal degrees, negative south of the equator
    pub latitude: f64,
    /// Longitude in signed decimal degrees, negative west of Greenwich
    pub longitude: f64,
    /// Altitude in meters
    pub altitude: f64,
    /// Speed over ground, as reported (knots)
    pub speed: f32,
    /// Course over ground in degrees
    pub bearing: f32,
    /// Accuracy figure in `0..=200`
    pub accuracy: f32,
    /// Fix time in milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Receives fixes from an [`NmeaReader`].
///
/// Implemented for every `Fn(&FixRecord)` closure that can cross threads.
pub trait FixSink: Send + Sync {
    /// Called synchronously with each fix that has new values.
    fn deliver(&self, fix: &FixRecord);
}

impl<F> FixSink for F
where
    F: Fn(&FixRecord) + Send + Sync,
{
    fn deliver(&self, fix: &FixRecord) {
        self(fix)
    }
}

macro_rules! sentence_codes {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $code:literal => $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
            /// Any other sentence code
            Other,
        }

        impl $name {
            /// Identifies a three-letter sentence code (talker prefix removed).
            pub fn from_code(code: &[u8]) -> Self {
                match code {
                    $($code => Self::$variant,)*
                    _ => Self::Other,
                }
            }
        }
    };
}

sentence_codes! {
    /// Sentence types the reader knows about.
    ///
    /// Only [`SentenceKind::Gga`] and [`SentenceKind::Rmc`] carry fix data;
    /// GSA is recognized and deliberately ignored.
    pub enum SentenceKind {
        /// GGA - Global Positioning System Fix Data
        b"GGA" => Gga,
        /// RMC - Recommended Minimum Navigation Information
        b"RMC" => Rmc,
        /// GSA - GPS DOP and active satellites
        b"GSA" => Gsa,
    }
}

impl SentenceKind {
    /// The positional mapping used to fill a [`SentenceFieldSet`], if any.
    pub fn field_map(self) -> Option<FieldMap> {
        match self {
            SentenceKind::Gga => Some(GGA_FIELDS),
            SentenceKind::Rmc => Some(RMC_FIELDS),
            SentenceKind::Gsa | SentenceKind::Other => None,
        }
    }
}

/// Named slots of a [`SentenceFieldSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    Time,
    FixStatus,
    Latitude,
    LatitudeHemisphere,
    Longitude,
    LongitudeHemisphere,
    Altitude,
    AltitudeUnits,
    Speed,
    Bearing,
    Date,
    Accuracy,
}

/// The fields of one sentence, by meaning rather than by position.
///
/// Built fresh for every sentence; slots the sentence does not map stay
/// invalid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SentenceFieldSet<'a> {
    pub time: FieldSlice<'a>,
    pub fix_status: FieldSlice<'a>,
    pub latitude: FieldSlice<'a>,
    pub latitude_hemisphere: FieldSlice<'a>,
    pub longitude: FieldSlice<'a>,
    pub longitude_hemisphere: FieldSlice<'a>,
    pub altitude: FieldSlice<'a>,
    pub altitude_units: FieldSlice<'a>,
    pub speed: FieldSlice<'a>,
    pub bearing: FieldSlice<'a>,
    pub date: FieldSlice<'a>,
    pub accuracy: FieldSlice<'a>,
}

impl<'a> SentenceFieldSet<'a> {
    /// Fills the slots named by `map` from the tokenizer's positions.
    pub fn from_map(tokenizer: &crate::nmea0183::Tokenizer<'a>, map: FieldMap) -> Self {
        let mut fields = SentenceFieldSet::default();
        for &(position, name) in map {
            *fields.slot_mut(name) = tokenizer.field(position);
        }
        fields
    }

    pub fn slot(&self, name: FieldName) -> FieldSlice<'a> {
        match name {
            FieldName::Time => self.time,
            FieldName::FixStatus => self.fix_status,
            FieldName::Latitude => self.latitude,
            FieldName::LatitudeHemisphere => self.latitude_hemisphere,
            FieldName::Longitude => self.longitude,
            FieldName::LongitudeHemisphere => self.longitude_hemisphere,
            FieldName::Altitude => self.altitude,
            FieldName::AltitudeUnits => self.altitude_units,
            FieldName::Speed => self.speed,
            FieldName::Bearing => self.bearing,
            FieldName::Date => self.date,
            FieldName::Accuracy => self.accuracy,
        }
    }

    pub fn slot_mut(&mut self, name: FieldName) -> &mut FieldSlice<'a> {
        match name {
            FieldName::Time => &mut self.time,
            FieldName::FixStatus => &mut self.fix_status,
            FieldName::Latitude => &mut self.latitude,
            FieldName::LatitudeHemisphere => &mut self.latitude_hemisphere,
            FieldName::Longitude => &mut self.longitude,
            FieldName::LongitudeHemisphere => &mut self.longitude_hemisphere,
            FieldName::Altitude => &mut self.altitude,
            FieldName::AltitudeUnits => &mut self.altitude_units,
            FieldName::Speed => &mut self.speed,
            FieldName::Bearing => &mut self.bearing,
            FieldName::Date => &mut self.date,
            FieldName::Accuracy => &mut self.accuracy,
        }
    }

    /// Whether the sentence reports an active (`A`) fix.
    pub fn is_active(&self) -> bool {
        self.fix_status.first() == Some(b'A')
    }
}
