use test_case::test_case;

use crate::nmea0183::{MAX_NMEA_FIELDS, Tokenizer, trim};

#[test_case(b"$GPGGA,1*47\r\n", b"GPGGA,1"; "full framing")]
#[test_case(b"GPGGA,1*47\r\n", b"GPGGA,1"; "no dollar")]
#[test_case(b"$GPGGA,1\n", b"GPGGA,1"; "bare newline")]
#[test_case(b"$GPGGA,1", b"GPGGA,1"; "no terminator")]
#[test_case(b"$GPGGA,1\r", b"GPGGA,1\r"; "lone carriage return kept")]
#[test_case(b"$GPGGA,1*4", b"GPGGA,1*4"; "short checksum kept")]
#[test_case(b"$*47", b""; "only checksum")]
#[test_case(b"", b""; "empty line")]
fn test_trim(line: &[u8], expected: &[u8]) {
    let (start, end) = trim(line);
    assert_eq!(&line[start..end], expected);
}

#[test]
fn test_gga_positions() {
    let line = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    let tokenizer = Tokenizer::new(line);

    assert_eq!(tokenizer.len(), 13);
    let fields: Vec<&[u8]> = tokenizer.fields().map(|field| field.as_bytes()).collect();
    let expected: [&[u8]; 13] = [
        b"GPGGA",
        b"123519",
        b"4807.038",
        b"N",
        b"01131.000",
        b"E",
        b"1",
        b"08",
        b"0.9",
        b"545.4",
        b"M",
        b"46.9",
        b"M",
    ];
    assert_eq!(fields, expected);
}

#[test]
fn test_empty_fields_shift_positions() {
    // The empty time field is dropped: the status letter moves to position 1.
    let tokenizer = Tokenizer::new(b"$GPRMC,,A,4807.038,N\n");

    assert_eq!(tokenizer.len(), 4);
    assert_eq!(tokenizer.field(1).as_bytes(), b"A");
    assert_eq!(tokenizer.field(2).as_bytes(), b"4807.038");
}

#[test]
fn test_offsets_refer_to_line() {
    let line = b"$GPRMC,123519,A\r\n";
    let tokenizer = Tokenizer::new(line);
    let time = tokenizer.field(1);

    assert!(time.is_valid());
    assert_eq!((time.start(), time.end()), (7, 13));
    assert_eq!(&line[time.start()..time.end()], b"123519");
    assert_eq!(tokenizer.payload(), b"GPRMC,123519,A");
    assert_eq!(tokenizer.payload_len(), 14);
}

#[test]
fn test_out_of_range_field_is_invalid() {
    let tokenizer = Tokenizer::new(b"$GPGSA,A,3\n");
    let missing = tokenizer.field(7);

    assert!(!missing.is_valid());
    assert!(missing.is_empty());
    assert_eq!(missing.first(), None);
}

#[test]
fn test_field_cap() {
    let line = b"$GPGSV,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17,18\n";
    let tokenizer = Tokenizer::new(line);

    assert_eq!(tokenizer.len(), MAX_NMEA_FIELDS);
    assert_eq!(tokenizer.field(MAX_NMEA_FIELDS - 1).as_bytes(), b"15");
    assert!(!tokenizer.field(MAX_NMEA_FIELDS).is_valid());
}

#[test]
fn test_only_separators() {
    let tokenizer = Tokenizer::new(b"$,,,,\r\n");
    assert!(tokenizer.is_empty());
}
