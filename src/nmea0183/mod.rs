//! # NMEA 0183 Sentence Framing
//!
//! This module splits one received line into its comma-separated fields.
//! It handles the standard NMEA 0183 format: `$HHH,D1,D2,...,Dn*CC\r\n`
//!
//! Framing is deliberately lenient:
//! - the leading `$` is optional
//! - the trailing `\r\n` (or bare `\n`) is optional
//! - a trailing `*CC` checksum is stripped but never validated
//!
//! Empty fields are dropped rather than kept as placeholders, so every field
//! after an empty one moves one position to the left:
//!
//! ```text
//!  $GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47
//!    0      1       2     3     4     5 6  7  8    9   10  11 12
//! ```
//!
//! The sentence mapping tables in [`crate::nmea_content::sentences`] are
//! written against these compacted positions.

mod line;

pub use line::{LineBuffer, LineState, NMEA_MAX_SIZE};

use heapless::Vec;
use tracing::trace;

/// Maximum number of fields retained per sentence; extra fields are ignored.
pub const MAX_NMEA_FIELDS: usize = 16;

/// A view over one field of a line, valid for the lifetime of that line.
///
/// An invalid slice is what lookups of missing fields produce: it is empty
/// and reports `is_valid() == false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSlice<'a> {
    line: &'a [u8],
    start: usize,
    end: usize,
    valid: bool,
}

impl<'a> FieldSlice<'a> {
    fn new(line: &'a [u8], start: usize, end: usize) -> Self {
        FieldSlice {
            line,
            start,
            end,
            valid: true,
        }
    }

    /// An empty slice that refers to no field.
    pub fn invalid() -> Self {
        FieldSlice::default()
    }

    /// Whether this slice refers to an actual field of the line.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Offset of the first byte of the field within the line.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset one past the last byte of the field within the line.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bytes of the field.
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.line[self.start..self.end]
    }

    /// The first byte of the field, if any.
    pub fn first(&self) -> Option<u8> {
        self.as_bytes().first().copied()
    }
}

/// Removes the optional `$` prefix, line terminator and `*CC` suffix, in that
/// order, and returns the `(start, end)` offsets of what remains.
///
/// ```rust
/// use nmea0183_relay::nmea0183::trim;
///
/// let line = b"$GPGSA,A,3*1E\r\n";
/// let (start, end) = trim(line);
/// assert_eq!(&line[start..end], b"GPGSA,A,3");
/// ```
pub fn trim(line: &[u8]) -> (usize, usize) {
    let mut start = 0;
    let mut end = line.len();

    if start < end && line[start] == b'$' {
        start += 1;
    }

    if end > start && line[end - 1] == b'\n' {
        end -= 1;
        if end > start && line[end - 1] == b'\r' {
            end -= 1;
        }
    }

    if end >= start + 3 && line[end - 3] == b'*' {
        end -= 3;
    }

    (start, end)
}

/// The non-empty fields of one line, in order.
///
/// # Examples
///
/// ```rust
/// use nmea0183_relay::nmea0183::Tokenizer;
///
/// let tokenizer = Tokenizer::new(b"$GPRMC,123519,A,,N*6A\r\n");
/// assert_eq!(tokenizer.len(), 4);
/// assert_eq!(tokenizer.field(2).as_bytes(), b"A");
/// assert_eq!(tokenizer.field(3).as_bytes(), b"N"); // (empty field dropped)
/// assert!(!tokenizer.field(4).is_valid());
/// ```
#[derive(Debug)]
pub struct Tokenizer<'a> {
    line: &'a [u8],
    payload: (usize, usize),
    fields: Vec<(usize, usize), MAX_NMEA_FIELDS>,
}

impl<'a> Tokenizer<'a> {
    /// Trims `line` and records the offsets of its non-empty fields.
    pub fn new(line: &'a [u8]) -> Self {
        let (start, end) = trim(line);
        let mut fields = Vec::new();

        for (offset, field) in split_offsets(&line[start..end]) {
            let (field_start, field_end) = (start + offset, start + offset + field.len());
            if field.is_empty() {
                continue;
            }
            if fields.push((field_start, field_end)).is_err() {
                trace!(
                    max = MAX_NMEA_FIELDS,
                    "sentence has too many fields, ignoring the rest"
                );
                break;
            }
        }

        Tokenizer {
            line,
            payload: (start, end),
            fields,
        }
    }

    /// Number of retained fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Length of the trimmed sentence, separators included.
    pub fn payload_len(&self) -> usize {
        self.payload.1 - self.payload.0
    }

    /// The trimmed sentence.
    pub fn payload(&self) -> &'a [u8] {
        &self.line[self.payload.0..self.payload.1]
    }

    /// The field at `index`, or an invalid slice when there is no such field.
    pub fn field(&self, index: usize) -> FieldSlice<'a> {
        match self.fields.get(index) {
            Some(&(start, end)) => FieldSlice::new(self.line, start, end),
            None => FieldSlice::invalid(),
        }
    }

    /// Iterates over the retained fields.
    pub fn fields(&self) -> impl Iterator<Item = FieldSlice<'a>> + '_ {
        (0..self.len()).map(|index| self.field(index))
    }
}

/// Splits on `,`, yielding each piece with its offset (empty pieces included).
fn split_offsets(payload: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    let mut offset = 0;
    payload.split(|&byte| byte == b',').map(move |field| {
        let start = offset;
        offset += field.len() + 1;
        (start, field)
    })
}

#[cfg(test)]
mod tests {
    mod line_buffer;
    mod tokenizer;
}
