use heapless::Vec;
use tracing::debug;

/// Maximum number of bytes in one sentence, terminator included.
pub const NMEA_MAX_SIZE: usize = 83;

/// State of the line accumulator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    #[default]
    /// Bytes are appended until a `\n` completes the line.
    Accumulating,

    /// The line outgrew the buffer; bytes are discarded until the next `\n`.
    Overflow,
}

/// Fixed-capacity byte accumulator that cuts a byte stream into lines.
///
/// Feed it one byte at a time; it hands back each complete line (terminator
/// included) exactly once. Lines longer than [`NMEA_MAX_SIZE`] are dropped
/// silently, together with everything up to and including their terminator.
///
/// ```rust
/// use nmea0183_relay::nmea0183::LineBuffer;
///
/// let mut buffer = LineBuffer::new();
/// let lines: Vec<_> = b"$GPGSA,A\r\n$GP"
///     .iter()
///     .filter_map(|&byte| buffer.push(byte))
///     .collect();
/// assert_eq!(lines.len(), 1);
/// assert_eq!(&lines[0][..], b"$GPGSA,A\r\n");
/// assert_eq!(buffer.len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8, NMEA_MAX_SIZE>,
    state: LineState,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one byte, returning the completed line when `byte` is `\n`.
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8, NMEA_MAX_SIZE>> {
        match self.state {
            LineState::Overflow => {
                if byte == b'\n' {
                    self.state = LineState::Accumulating;
                }
                None
            }
            LineState::Accumulating => {
                if self.buffer.push(byte).is_err() {
                    debug!(
                        capacity = NMEA_MAX_SIZE,
                        "sentence too long, discarding until end of line"
                    );
                    self.buffer.clear();
                    self.state = if byte == b'\n' {
                        LineState::Accumulating
                    } else {
                        LineState::Overflow
                    };
                    return None;
                }

                if byte == b'\n' {
                    Some(core::mem::take(&mut self.buffer))
                } else {
                    None
                }
            }
        }
    }

    /// Current state of the accumulator.
    pub fn state(&self) -> LineState {
        self.state
    }

    /// Number of bytes of the line in progress.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drops the line in progress and leaves the overflow state.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = LineState::Accumulating;
    }
}
