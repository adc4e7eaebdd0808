use crate::nmea0183::{LineBuffer, LineState, NMEA_MAX_SIZE};

fn feed(buffer: &mut LineBuffer, bytes: &[u8]) -> Vec<Vec<u8>> {
    bytes
        .iter()
        .filter_map(|&byte| buffer.push(byte))
        .map(|line| line.to_vec())
        .collect()
}

#[test]
fn test_lines_are_cut_on_newline() {
    let mut buffer = LineBuffer::new();
    let lines = feed(&mut buffer, b"$GPGGA,1\r\n$GPRMC,2\n$GP");

    assert_eq!(lines, [b"$GPGGA,1\r\n".to_vec(), b"$GPRMC,2\n".to_vec()]);
    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.state(), LineState::Accumulating);
}

#[test]
fn test_line_split_across_reads() {
    let mut buffer = LineBuffer::new();

    assert!(feed(&mut buffer, b"$GPGGA,12").is_empty());
    assert_eq!(feed(&mut buffer, b"3519\n"), [b"$GPGGA,123519\n".to_vec()]);
    assert!(buffer.is_empty());
}

#[test]
fn test_full_capacity_line_is_kept() {
    let mut line = vec![b'x'; NMEA_MAX_SIZE - 1];
    line.push(b'\n');

    let mut buffer = LineBuffer::new();
    assert_eq!(feed(&mut buffer, &line), [line.clone()]);
}

#[test]
fn test_overflow_discards_until_newline() {
    let mut bytes = vec![b'x'; NMEA_MAX_SIZE + 10];
    bytes.extend_from_slice(b"tail\n$GPGSA,A\n");

    let mut buffer = LineBuffer::new();
    let lines = feed(&mut buffer, &bytes);

    assert_eq!(lines, [b"$GPGSA,A\n".to_vec()]);
    assert_eq!(buffer.state(), LineState::Accumulating);
}

#[test]
fn test_overflow_state_is_observable() {
    let mut buffer = LineBuffer::new();
    feed(&mut buffer, &[b'x'; NMEA_MAX_SIZE + 1]);

    assert_eq!(buffer.state(), LineState::Overflow);
    assert!(buffer.is_empty());
    assert!(buffer.len() <= NMEA_MAX_SIZE);

    buffer.reset();
    assert_eq!(buffer.state(), LineState::Accumulating);
}
