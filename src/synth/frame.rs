//! Length-prefixed location update frames.
//!
//! A frame is a base-128 varint holding the payload length, followed by the
//! payload, a protobuf-encoded message:
//!
//! ```text
//! frame   = varint(len) payload
//! payload = { 1: gps (length-delimited) }
//! gps     = { 1: status (varint, 0 disabled / 1 enabled)
//!             2: latitude   (fixed64, f64 little-endian)
//!             3: longitude  (fixed64)
//!             4: altitude   (fixed64)
//!             5: bearing    (fixed64) }
//! ```
//!
//! Unknown fields are skipped. A payload without a GPS record, or whose
//! status is missing or unknown, is not an update.

use std::io::Read;

use nom::{
    Err, IResult, Parser,
    bytes::complete::take_while_m_n,
    combinator::all_consuming,
    error::{Error, ErrorKind},
    multi::{length_data, many0},
    number::complete::{le_u32, le_u64, u8 as byte},
};

use crate::{
    error::FrameError,
    synth::{LocationUpdate, UpdateStatus},
};

/// Number of bytes peeked to find the length prefix.
pub const PREFIX_PEEK_LEN: usize = 4;

/// Longest varint encoding of a 64-bit value.
const MAX_VARINT_LEN: usize = 10;

const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LEN: u64 = 2;
const WIRE_FIXED32: u64 = 5;

const GPS_FIELD: u64 = 1;
const STATUS_FIELD: u64 = 1;
const LATITUDE_FIELD: u64 = 2;
const LONGITUDE_FIELD: u64 = 3;
const ALTITUDE_FIELD: u64 = 4;
const BEARING_FIELD: u64 = 5;

/// A decoded wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireValue<'a> {
    Varint(u64),
    Fixed64(u64),
    Bytes(&'a [u8]),
    Fixed32(u32),
}

/// Parses a base-128 varint, least significant group first.
///
/// ```rust
/// use nmea0183_relay::synth::frame::varint;
///
/// assert_eq!(varint(&[0xac, 0x02, 0xff]), Ok((&[0xff][..], 300)));
/// ```
pub fn varint(input: &[u8]) -> IResult<&[u8], u64> {
    let (rest, (continued, last)) = (
        take_while_m_n(0, MAX_VARINT_LEN - 1, |byte: u8| byte & 0x80 != 0),
        byte,
    )
        .parse(input)?;

    if last & 0x80 != 0 {
        return Err(Err::Error(Error::new(input, ErrorKind::TooLarge)));
    }

    let value = continued
        .iter()
        .chain(core::iter::once(&last))
        .enumerate()
        .fold(0u64, |value, (group, &byte)| {
            value | (u64::from(byte & 0x7f) << (7 * group))
        });

    Ok((rest, value))
}

/// Parses one `(field number, value)` pair.
pub fn wire_field(input: &[u8]) -> IResult<&[u8], (u64, WireValue<'_>)> {
    let (input, key) = varint(input)?;

    let (input, value) = match key & 0x7 {
        WIRE_VARINT => varint.map(WireValue::Varint).parse(input)?,
        WIRE_FIXED64 => le_u64.map(WireValue::Fixed64).parse(input)?,
        WIRE_LEN => length_data(varint).map(WireValue::Bytes).parse(input)?,
        WIRE_FIXED32 => le_u32.map(WireValue::Fixed32).parse(input)?,
        _ => return Err(Err::Error(Error::new(input, ErrorKind::Switch))),
    };

    Ok((input, (key >> 3, value)))
}

fn wire_fields(input: &[u8]) -> Result<Vec<(u64, WireValue<'_>)>, FrameError> {
    all_consuming(many0(wire_field))
        .parse(input)
        .map(|(_, fields)| fields)
        .map_err(|_| FrameError::Malformed)
}

/// Decodes an update payload (without its length prefix).
pub fn decode_update(payload: &[u8]) -> Result<LocationUpdate, FrameError> {
    let gps = wire_fields(payload)?
        .into_iter()
        .filter_map(|field| match field {
            (GPS_FIELD, WireValue::Bytes(gps)) => Some(gps),
            _ => None,
        })
        .next_back()
        .ok_or(FrameError::NotGps)?;

    let mut status = None;
    let mut update = LocationUpdate::default();

    for (number, value) in wire_fields(gps)? {
        match (number, value) {
            (STATUS_FIELD, WireValue::Varint(value)) => status = UpdateStatus::from_wire(value),
            (LATITUDE_FIELD, WireValue::Fixed64(bits)) => update.latitude = f64::from_bits(bits),
            (LONGITUDE_FIELD, WireValue::Fixed64(bits)) => update.longitude = f64::from_bits(bits),
            (ALTITUDE_FIELD, WireValue::Fixed64(bits)) => update.altitude = f64::from_bits(bits),
            (BEARING_FIELD, WireValue::Fixed64(bits)) => update.bearing = f64::from_bits(bits),
            (STATUS_FIELD..=BEARING_FIELD, _) => return Err(FrameError::Malformed),
            _ => {}
        }
    }

    update.status = status.ok_or(FrameError::NotGps)?;
    Ok(update)
}

fn put_varint(buffer: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buffer.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buffer.push(value as u8);
}

fn put_key(buffer: &mut Vec<u8>, number: u64, wire_type: u64) {
    put_varint(buffer, number << 3 | wire_type);
}

/// Encodes an update payload (without its length prefix).
pub fn encode_update(update: &LocationUpdate) -> Vec<u8> {
    let mut gps = Vec::with_capacity(2 + 4 * 9);
    put_key(&mut gps, STATUS_FIELD, WIRE_VARINT);
    put_varint(&mut gps, update.status.to_wire());
    for (number, value) in [
        (LATITUDE_FIELD, update.latitude),
        (LONGITUDE_FIELD, update.longitude),
        (ALTITUDE_FIELD, update.altitude),
        (BEARING_FIELD, update.bearing),
    ] {
        put_key(&mut gps, number, WIRE_FIXED64);
        gps.extend_from_slice(&value.to_le_bytes());
    }

    let mut payload = Vec::with_capacity(gps.len() + 2);
    put_key(&mut payload, GPS_FIELD, WIRE_LEN);
    put_varint(&mut payload, gps.len() as u64);
    payload.extend_from_slice(&gps);
    payload
}

/// Encodes a complete frame: length prefix and payload.
pub fn encode_frame(update: &LocationUpdate) -> Vec<u8> {
    let payload = encode_update(update);
    let mut frame = Vec::with_capacity(payload.len() + PREFIX_PEEK_LEN);
    put_varint(&mut frame, payload.len() as u64);
    frame.extend_from_slice(&payload);
    frame
}

/// Length prefix of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Bytes taken by the varint prefix
    pub prefix_len: usize,
    /// Declared payload length
    pub payload_len: usize,
}

impl FrameHeader {
    /// Length of the whole frame, prefix included.
    pub fn frame_len(&self) -> usize {
        self.prefix_len + self.payload_len
    }
}

/// Decodes the length prefix found in the first bytes of a frame.
///
/// Only the first [`PREFIX_PEEK_LEN`] bytes of `peeked` are looked at. A
/// declared length above `max_len` is refused before any payload is read.
pub fn frame_header(peeked: &[u8], max_len: usize) -> Result<FrameHeader, FrameError> {
    if peeked.is_empty() {
        return Err(FrameError::Empty);
    }

    let prefix = &peeked[..peeked.len().min(PREFIX_PEEK_LEN)];
    let (rest, len) = varint(prefix).map_err(|_| FrameError::Malformed)?;

    if len > max_len as u64 {
        return Err(FrameError::TooLarge { len, max: max_len });
    }

    Ok(FrameHeader {
        prefix_len: prefix.len() - rest.len(),
        payload_len: len as usize,
    })
}

/// Reads the whole frame announced by `header` and decodes it.
///
/// The frame, prefix included, is consumed in full before decoding; a short
/// read is reported as [`FrameError::Truncated`].
pub fn read_frame<R: Read>(
    reader: &mut R,
    header: FrameHeader,
) -> Result<LocationUpdate, FrameError> {
    let expected = header.frame_len();
    let mut frame = Vec::with_capacity(expected);

    let received = reader.take(expected as u64).read_to_end(&mut frame)?;
    if received < expected {
        return Err(FrameError::Truncated { expected, received });
    }

    decode_update(&frame[header.prefix_len..])
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use test_case::test_case;

    fn update() -> LocationUpdate {
        LocationUpdate {
            status: UpdateStatus::Enabled,
            latitude: 48.1173,
            longitude: -11.516_666,
            altitude: 545.4,
            bearing: 84.4,
        }
    }

    #[test_case(&[0x00], 0; "zero")]
    #[test_case(&[0x01], 1; "one")]
    #[test_case(&[0x7f], 127; "largest single byte")]
    #[test_case(&[0x80, 0x01], 128; "two bytes")]
    #[test_case(&[0x80, 0x80, 0x80, 0x02], 4 * 1024 * 1024; "four mebibytes")]
    fn test_varint(input: &[u8], expected: u64) {
        assert_eq!(varint(input), Ok((&[][..], expected)));

        let mut encoded = Vec::new();
        put_varint(&mut encoded, expected);
        assert_eq!(encoded, input);
    }

    #[test]
    fn test_varint_unterminated() {
        assert!(varint(&[0x80, 0x80]).is_err());
        assert!(varint(&[0xff; 11]).is_err());
        assert!(varint(&[]).is_err());
    }

    #[test]
    fn test_wire_field_kinds() {
        // field 1 varint 150, field 2 fixed32, field 3 bytes "ab"
        let input = [0x08, 0x96, 0x01, 0x15, 1, 0, 0, 0, 0x1a, 0x02, b'a', b'b'];
        let (rest, first) = wire_field(&input).unwrap();
        assert_eq!(first, (1, WireValue::Varint(150)));
        let (rest, second) = wire_field(rest).unwrap();
        assert_eq!(second, (2, WireValue::Fixed32(1)));
        let (rest, third) = wire_field(rest).unwrap();
        assert_eq!(third, (3, WireValue::Bytes(b"ab")));
        assert!(rest.is_empty());

        // wire type 3 (group start) is not supported
        assert!(wire_field(&[0x0b]).is_err());
    }

    #[test]
    fn test_encode_decode_update() {
        let payload = encode_update(&update());
        assert_eq!(payload[0], 0x0a);
        assert_eq!(decode_update(&payload).unwrap(), update());
    }

    #[test]
    fn test_disabled_status_is_kept() {
        let disabled = LocationUpdate {
            status: UpdateStatus::Disabled,
            ..update()
        };
        assert_eq!(
            decode_update(&encode_update(&disabled)).unwrap().status,
            UpdateStatus::Disabled
        );
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        let mut payload = vec![0x10, 0x05];
        payload.extend(encode_update(&update()));
        payload.extend([0x1a, 0x01, 0xff]);

        assert_eq!(decode_update(&payload).unwrap(), update());
    }

    #[test]
    fn test_not_gps() {
        // only an unrelated varint field
        assert!(matches!(
            decode_update(&[0x10, 0x05]),
            Err(FrameError::NotGps)
        ));
        // empty payload
        assert!(matches!(decode_update(&[]), Err(FrameError::NotGps)));
        // gps record without status
        assert!(matches!(
            decode_update(&[0x0a, 0x00]),
            Err(FrameError::NotGps)
        ));
        // gps record with an unknown status
        assert!(matches!(
            decode_update(&[0x0a, 0x02, 0x08, 0x07]),
            Err(FrameError::NotGps)
        ));
    }

    #[test]
    fn test_malformed_payload() {
        // truncated fixed64
        assert!(matches!(
            decode_update(&[0x0a, 0x03, 0x11, 0x00, 0x00]),
            Err(FrameError::Malformed)
        ));
        // latitude sent as a varint
        assert!(matches!(
            decode_update(&[0x0a, 0x04, 0x08, 0x01, 0x10, 0x01]),
            Err(FrameError::Malformed)
        ));
        // declared length past the end
        assert!(matches!(
            decode_update(&[0x0a, 0x09, 0x08]),
            Err(FrameError::Malformed)
        ));
    }

    #[test]
    fn test_frame_header() {
        let frame = encode_frame(&update());
        let header = frame_header(&frame[..PREFIX_PEEK_LEN], 64).unwrap();

        assert_eq!(header.prefix_len, 1);
        assert_eq!(header.payload_len, frame.len() - 1);
        assert_eq!(header.frame_len(), frame.len());
    }

    #[test]
    fn test_frame_header_limits() {
        assert!(matches!(frame_header(&[], 64), Err(FrameError::Empty)));
        assert!(matches!(
            frame_header(&[0x80, 0x80, 0x80, 0x80, 0x01], 64),
            Err(FrameError::Malformed)
        ));
        assert!(matches!(
            frame_header(&[0x81, 0x80, 0x80, 0x02], 4 * 1024 * 1024),
            Err(FrameError::TooLarge {
                len: 4_194_305,
                max: 4_194_304
            })
        ));
        let largest = [0x80, 0x80, 0x80, 0x02];
        assert!(frame_header(&largest, 4 * 1024 * 1024).is_ok());
    }

    #[test]
    fn test_read_frame() {
        let frame = encode_frame(&update());
        let header = frame_header(&frame, 64).unwrap();

        let mut reader = Cursor::new(frame.clone());
        assert_eq!(read_frame(&mut reader, header).unwrap(), update());
        assert_eq!(reader.position() as usize, frame.len());
    }

    #[test]
    fn test_read_frame_truncated() {
        let frame = encode_frame(&update());
        let header = frame_header(&frame, 64).unwrap();

        let mut reader = Cursor::new(&frame[..frame.len() - 3]);
        assert!(matches!(
            read_frame(&mut reader, header),
            Err(FrameError::Truncated { expected, received })
                if expected == frame.len() && received == frame.len() - 3
        ));
    }
}
