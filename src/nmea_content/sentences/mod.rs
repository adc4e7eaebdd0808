//! Positional mapping tables, one per sentence type carrying fix data.
//!
//! Positions count the fields kept by the tokenizer, with the sentence code
//! at position 0. Because empty fields are dropped, a sentence with an empty
//! field before a mapped position shifts that field (and every later one)
//! one slot to the left; the tables do not try to recover from it.

mod gga;
mod rmc;

pub use gga::GGA_FIELDS;
pub use rmc::RMC_FIELDS;

use crate::nmea_content::FieldName;

/// `(position, slot)` pairs applied to a freshly reset field set.
pub type FieldMap = &'static [(usize, FieldName)];
