//! Conversions from single sentence fields to fix values.

use time::{Date, Month, Time};

use crate::{
    error::FieldError,
    nmea0183::FieldSlice,
    parsing::{digits, parse_decimal},
};

/// Minimum length of a `ddmm.mm`/`dddmm.mm` coordinate field.
pub const MIN_COORDINATE_LEN: usize = 6;
/// Minimum length of a `hhmmss[.sss]` time field.
pub const MIN_TIME_LEN: usize = 6;
/// Exact length of a `ddmmyy` date field.
pub const DATE_LEN: usize = 6;

fn present<'a>(field: FieldSlice<'a>) -> Result<&'a [u8], FieldError> {
    if !field.is_valid() || field.is_empty() {
        return Err(FieldError::Missing);
    }
    Ok(field.as_bytes())
}

fn at_least(bytes: &[u8], expected: usize) -> Result<(), FieldError> {
    if bytes.len() < expected {
        return Err(FieldError::TooShort {
            len: bytes.len(),
            expected,
        });
    }
    Ok(())
}

/// Converts a packed `dddmm.mmmm` value to decimal degrees.
///
/// The degrees are the integer part of `value / 100`, the remainder is
/// minutes.
///
/// ```rust
/// use nmea0183_relay::nmea_content::parse::ddmm_to_degrees;
///
/// let degrees = ddmm_to_degrees(4807.038);
/// assert!((degrees - 48.1173).abs() < 1e-4);
/// ```
pub fn ddmm_to_degrees(value: f64) -> f64 {
    let degrees = (value.floor() / 100.0).trunc();
    let minutes = value - degrees * 100.0;
    degrees + minutes / 60.0
}

/// Parses a coordinate field and applies its hemisphere letter.
///
/// The value is negated when the hemisphere field starts with `negative`
/// (`S` for latitude, `W` for longitude). A missing hemisphere leaves the
/// value positive.
pub fn coordinate(
    field: FieldSlice<'_>,
    hemisphere: FieldSlice<'_>,
    negative: u8,
) -> Result<f64, FieldError> {
    let bytes = present(field)?;
    at_least(bytes, MIN_COORDINATE_LEN)?;

    let value = parse_decimal(bytes).ok_or(FieldError::Malformed)?;
    let degrees = ddmm_to_degrees(value);

    Ok(if hemisphere.first() == Some(negative) {
        -degrees
    } else {
        degrees
    })
}

/// Parses a free-form decimal field such as altitude, speed or bearing.
pub fn decimal(field: FieldSlice<'_>) -> Result<f64, FieldError> {
    let bytes = present(field)?;
    parse_decimal(bytes).ok_or(FieldError::Malformed)
}

/// Parses a `hhmmss[.sss]` field into a time of day.
pub fn time_of_day(field: FieldSlice<'_>) -> Result<Time, FieldError> {
    let bytes = present(field)?;
    at_least(bytes, MIN_TIME_LEN)?;

    let hour = digits(bytes, 0, 2).ok_or(FieldError::Malformed)?;
    let minute = digits(bytes, 2, 4).ok_or(FieldError::Malformed)?;
    let second = parse_decimal(&bytes[4..]).ok_or(FieldError::Malformed)?;

    if second.is_sign_negative() {
        return Err(FieldError::Malformed);
    }

    let milliseconds = (second.fract() * 1000.0) as u16;
    let second = second.trunc();

    let hour = u8::try_from(hour).map_err(|_| FieldError::OutOfRange)?;
    let minute = u8::try_from(minute).map_err(|_| FieldError::OutOfRange)?;
    if second >= 60.0 {
        return Err(FieldError::OutOfRange);
    }

    Time::from_hms_milli(hour, minute, second as u8, milliseconds)
        .map_err(|_| FieldError::OutOfRange)
}

/// Parses a `ddmmyy` field. Two-digit years are taken as `2000 + yy`.
pub fn calendar_date(field: FieldSlice<'_>) -> Result<Date, FieldError> {
    let bytes = present(field)?;
    if bytes.len() != DATE_LEN {
        return Err(FieldError::TooShort {
            len: bytes.len(),
            expected: DATE_LEN,
        });
    }

    let day = digits(bytes, 0, 2).ok_or(FieldError::Malformed)?;
    let month = digits(bytes, 2, 4).ok_or(FieldError::Malformed)?;
    let year = digits(bytes, 4, 6).ok_or(FieldError::Malformed)?;

    let month = u8::try_from(month)
        .ok()
        .and_then(|month| Month::try_from(month).ok())
        .ok_or(FieldError::OutOfRange)?;
    let day = u8::try_from(day).map_err(|_| FieldError::OutOfRange)?;

    Date::from_calendar_date(2000 + year as i32, month, day).map_err(|_| FieldError::OutOfRange)
}
