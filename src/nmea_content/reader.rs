use std::sync::Arc;

use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use tracing::{debug, trace};

use crate::{
    error::FieldError,
    nmea0183::{FieldSlice, LineBuffer, Tokenizer},
    nmea_content::{
        FixFlags, FixRecord, FixSink, SentenceFieldSet, SentenceKind,
        parse::{calendar_date, coordinate, decimal, time_of_day},
    },
};

/// Trimmed sentences shorter than this are treated as noise.
pub const MIN_SENTENCE_LEN: usize = 9;

/// Accuracy reported when the sentence's figure is unusable or outside `0..=200`.
pub const ACCURACY_FALLBACK: f32 = 1.0;

const MAX_ACCURACY: u32 = 200;

/// Date used to complete time-only sentences into full timestamps.
///
/// The date is either fully known or not known at all. The UTC offset of the
/// local clock is sampled once, when the cache is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCache {
    date: Option<Date>,
    local_offset: UtcOffset,
}

impl DateCache {
    /// Creates an empty cache, sampling the local UTC offset.
    ///
    /// Falls back to UTC when the local offset cannot be determined.
    pub fn new() -> Self {
        let local_offset = UtcOffset::current_local_offset().unwrap_or_else(|error| {
            debug!(%error, "local UTC offset unavailable, assuming UTC");
            UtcOffset::UTC
        });
        Self::with_local_offset(local_offset)
    }

    /// Creates an empty cache with a known local UTC offset.
    pub fn with_local_offset(local_offset: UtcOffset) -> Self {
        DateCache {
            date: None,
            local_offset,
        }
    }

    /// The cached date, if any.
    pub fn date(&self) -> Option<Date> {
        self.date
    }

    /// Seconds to add to a local clock reading to obtain UTC.
    pub fn utc_diff(&self) -> i64 {
        -i64::from(self.local_offset.whole_seconds())
    }

    /// Replaces the cached date.
    pub fn set(&mut self, date: Date) {
        self.date = Some(date);
    }

    /// The cached date, seeding the cache with today's UTC date when empty.
    fn date_or_today(&mut self) -> Date {
        *self
            .date
            .get_or_insert_with(|| OffsetDateTime::now_utc().date())
    }

    /// Milliseconds since the Unix epoch of `time` on the cached date.
    ///
    /// The date and time are read as a local clock value, then shifted by
    /// [`DateCache::utc_diff`]. With a UTC local clock this is the sentence's
    /// own instant.
    fn timestamp(&mut self, time: Time) -> i64 {
        let local = PrimitiveDateTime::new(self.date_or_today(), time)
            .assume_offset(self.local_offset);
        let seconds = local.unix_timestamp() + self.utc_diff();
        seconds * 1000 + i64::from(time.millisecond())
    }
}

impl Default for DateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental sentence reader and fix accumulator.
///
/// Bytes go in through [`NmeaReader::feed`] (or whole lines through
/// [`NmeaReader::parse_sentence`]); fixes come out through the registered
/// [`FixSink`]. Without a sink, the latest fix is kept and handed to the next
/// sink that registers.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use nmea0183_relay::nmea_content::{FixRecord, NmeaReader};
///
/// let fixes = Arc::new(Mutex::new(Vec::new()));
/// let sink = {
///     let fixes = fixes.clone();
///     move |fix: &FixRecord| fixes.lock().unwrap().push(*fix)
/// };
///
/// let mut reader = NmeaReader::new();
/// reader.set_sink(Some(Arc::new(sink)));
/// reader.feed(b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n");
///
/// let fixes = fixes.lock().unwrap();
/// assert_eq!(fixes.len(), 1);
/// assert!((fixes[0].latitude - 48.1173).abs() < 1e-4);
/// ```
pub struct NmeaReader {
    line: LineBuffer,
    dates: DateCache,
    fix: FixRecord,
    sink: Option<Arc<dyn FixSink>>,
}

impl NmeaReader {
    pub fn new() -> Self {
        Self::with_date_cache(DateCache::new())
    }

    /// Creates a reader around an existing date cache.
    pub fn with_date_cache(dates: DateCache) -> Self {
        NmeaReader {
            line: LineBuffer::new(),
            dates,
            fix: FixRecord::default(),
            sink: None,
        }
    }

    /// The fix accumulated so far.
    pub fn fix(&self) -> &FixRecord {
        &self.fix
    }

    pub fn date_cache(&self) -> &DateCache {
        &self.dates
    }

    /// Registers (or with [`None`], removes) the fix sink.
    ///
    /// A fix with pending values is delivered to the new sink right away.
    pub fn set_sink(&mut self, sink: Option<Arc<dyn FixSink>>) {
        self.sink = sink;
        if self.sink.is_some() && !self.fix.flags.is_empty() {
            debug!("sending latest fix to new sink");
            self.deliver();
        }
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Feeds received bytes, parsing every line they complete.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.add_byte(byte);
        }
    }

    /// Feeds a single received byte.
    pub fn add_byte(&mut self, byte: u8) {
        if let Some(line) = self.line.push(byte) {
            self.parse_sentence(&line);
        }
    }

    /// Parses one complete line and folds it into the fix.
    ///
    /// Returns the sentence kind, or [`None`] when the line was discarded as
    /// noise before identification.
    pub fn parse_sentence(&mut self, line: &[u8]) -> Option<SentenceKind> {
        trace!(line = %String::from_utf8_lossy(line).trim_end(), "received");

        let tokenizer = Tokenizer::new(line);
        if tokenizer.payload_len() < MIN_SENTENCE_LEN {
            debug!(
                len = tokenizer.payload_len(),
                "sentence too short, discarded"
            );
            return None;
        }

        let id = tokenizer.field(0);
        if id.len() < 5 {
            let id = String::from_utf8_lossy(id.as_bytes());
            debug!(%id, "sentence id too short, ignored");
            return None;
        }

        let kind = SentenceKind::from_code(&id.as_bytes()[2..5]);
        let fields = match kind.field_map() {
            Some(map) => SentenceFieldSet::from_map(&tokenizer, map),
            None => {
                if kind == SentenceKind::Other {
                    let id = String::from_utf8_lossy(id.as_bytes());
                    debug!(%id, "unknown sentence");
                }
                SentenceFieldSet::default()
            }
        };

        self.apply(&fields);

        if !self.fix.flags.is_empty() {
            if self.sink.is_some() {
                self.deliver();
            } else {
                debug!("no sink registered, keeping fix until needed");
            }
        }

        Some(kind)
    }

    /// Applies every usable field of one sentence to the fix.
    fn apply(&mut self, fields: &SentenceFieldSet<'_>) {
        skipped("time", self.update_time(fields.time));
        skipped(
            "position",
            self.update_lat_long(
                fields.latitude,
                fields.latitude_hemisphere,
                fields.longitude,
                fields.longitude_hemisphere,
            ),
        );
        skipped(
            "altitude",
            self.update_altitude(fields.altitude, fields.altitude_units),
        );
        skipped("accuracy", self.update_accuracy(fields.accuracy));

        if fields.is_active() {
            skipped("date", self.update_date(fields.date, fields.time));
            skipped("bearing", self.update_bearing(fields.bearing));
            skipped("speed", self.update_speed(fields.speed));
        }
    }

    fn deliver(&mut self) {
        let fix = &self.fix;
        debug!(
            flags = fix.flags.bits(),
            latitude = fix.latitude,
            longitude = fix.longitude,
            altitude = fix.altitude,
            speed = fix.speed,
            bearing = fix.bearing,
            accuracy = fix.accuracy,
            timestamp = fix.timestamp,
            "sending fix"
        );

        if let Some(sink) = &self.sink {
            sink.deliver(&self.fix);
            self.fix.flags.clear();
        }
    }

    fn update_time(&mut self, field: FieldSlice<'_>) -> Result<(), FieldError> {
        let time = time_of_day(field)?;
        self.fix.timestamp = self.dates.timestamp(time);
        Ok(())
    }

    fn update_date(
        &mut self,
        date: FieldSlice<'_>,
        time: FieldSlice<'_>,
    ) -> Result<(), FieldError> {
        let date = calendar_date(date)?;
        self.dates.set(date);
        self.update_time(time)
    }

    fn update_lat_long(
        &mut self,
        latitude: FieldSlice<'_>,
        latitude_hemisphere: FieldSlice<'_>,
        longitude: FieldSlice<'_>,
        longitude_hemisphere: FieldSlice<'_>,
    ) -> Result<(), FieldError> {
        let latitude = coordinate(latitude, latitude_hemisphere, b'S')?;
        let longitude = coordinate(longitude, longitude_hemisphere, b'W')?;

        self.fix.flags |= FixFlags::LAT_LONG;
        self.fix.latitude = latitude;
        self.fix.longitude = longitude;
        Ok(())
    }

    /// The units field is accepted but not interpreted.
    fn update_altitude(
        &mut self,
        altitude: FieldSlice<'_>,
        _units: FieldSlice<'_>,
    ) -> Result<(), FieldError> {
        self.fix.altitude = decimal(altitude)?;
        self.fix.flags |= FixFlags::ALTITUDE;
        Ok(())
    }

    fn update_bearing(&mut self, bearing: FieldSlice<'_>) -> Result<(), FieldError> {
        self.fix.bearing = decimal(bearing)? as f32;
        self.fix.flags |= FixFlags::BEARING;
        Ok(())
    }

    fn update_speed(&mut self, speed: FieldSlice<'_>) -> Result<(), FieldError> {
        self.fix.speed = decimal(speed)? as f32;
        self.fix.flags |= FixFlags::SPEED;
        Ok(())
    }

    /// Any present field sets the accuracy; unusable figures become the fallback.
    fn update_accuracy(&mut self, accuracy: FieldSlice<'_>) -> Result<(), FieldError> {
        if !accuracy.is_valid() {
            return Err(FieldError::Missing);
        }

        self.fix.accuracy = match crate::parsing::parse_int(accuracy.as_bytes()) {
            Some(value) if value <= MAX_ACCURACY => value as f32,
            _ => ACCURACY_FALLBACK,
        };
        self.fix.flags |= FixFlags::ACCURACY;
        Ok(())
    }
}

impl Default for NmeaReader {
    fn default() -> Self {
        Self::new()
    }
}

fn skipped(field: &'static str, result: Result<(), FieldError>) {
    if let Err(error) = result {
        trace!(field, %error, "field not updated");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use time::macros::{date, datetime, offset, time};

    use super::*;

    const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const RMC_ACTIVE: &[u8] =
        b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";
    const RMC_VOID: &[u8] =
        b"$GPRMC,123519,V,4807.038,S,01131.000,W,022.4,084.4,230394,003.1,W*6A\r\n";

    #[derive(Default)]
    struct Recorder(Mutex<Vec<FixRecord>>);

    impl FixSink for Recorder {
        fn deliver(&self, fix: &FixRecord) {
            self.0.lock().unwrap().push(*fix);
        }
    }

    impl Recorder {
        fn fixes(&self) -> Vec<FixRecord> {
            self.0.lock().unwrap().clone()
        }
    }

    fn utc_reader() -> NmeaReader {
        NmeaReader::with_date_cache(DateCache::with_local_offset(UtcOffset::UTC))
    }

    fn with_sink(reader: &mut NmeaReader) -> Arc<Recorder> {
        let recorder = Arc::new(Recorder::default());
        reader.set_sink(Some(recorder.clone()));
        recorder
    }

    #[test]
    fn test_short_sentence_is_noise() {
        let mut reader = utc_reader();
        let recorder = with_sink(&mut reader);

        assert_eq!(reader.parse_sentence(b"$GPGGA,1\r\n"), None);
        assert_eq!(reader.parse_sentence(b"$GPRMC,A*47\r\n"), None);
        assert!(recorder.fixes().is_empty());
        assert_eq!(*reader.fix(), FixRecord::default());
    }

    #[test]
    fn test_minimum_length_boundary() {
        let mut reader = utc_reader();

        // "GPGGA,12" is 8 bytes once trimmed, "GPGGA,123" is 9
        assert_eq!(reader.parse_sentence(b"$GPGGA,12*47\r\n"), None);
        assert_eq!(
            reader.parse_sentence(b"$GPGGA,123*47\r\n"),
            Some(SentenceKind::Gga)
        );
        assert!(reader.fix().flags.is_empty());
    }

    #[test]
    fn test_gga() {
        let mut reader = utc_reader();
        let recorder = with_sink(&mut reader);
        reader.dates.set(date!(2024 - 05 - 01));

        assert_eq!(reader.parse_sentence(GGA), Some(SentenceKind::Gga));

        let fixes = recorder.fixes();
        assert_eq!(fixes.len(), 1);
        let fix = fixes[0];
        assert_eq!(
            fix.flags,
            FixFlags::LAT_LONG | FixFlags::ALTITUDE | FixFlags::ACCURACY
        );
        assert!((fix.latitude - 48.1173).abs() < 1e-4);
        assert!((fix.longitude - 11.516_666).abs() < 1e-4);
        assert_eq!(fix.altitude, 545.4);
        // HDOP "0.9" is not an integer figure.
        assert_eq!(fix.accuracy, ACCURACY_FALLBACK);
        assert_eq!(
            fix.timestamp,
            datetime!(2024-05-01 12:35:19 UTC).unix_timestamp() * 1000
        );
        assert!(reader.fix().flags.is_empty());
    }

    #[test]
    fn test_rmc_active_updates_everything() {
        let mut reader = utc_reader();
        let recorder = with_sink(&mut reader);

        reader.parse_sentence(RMC_ACTIVE);

        let fix = recorder.fixes()[0];
        assert_eq!(
            fix.flags,
            FixFlags::LAT_LONG | FixFlags::SPEED | FixFlags::BEARING
        );
        assert_eq!(fix.speed, 22.4);
        assert_eq!(fix.bearing, 84.4);
        assert_eq!(reader.date_cache().date(), Some(date!(2094 - 03 - 23)));
        assert_eq!(
            fix.timestamp,
            datetime!(2094-03-23 12:35:19 UTC).unix_timestamp() * 1000
        );
    }

    #[test]
    fn test_rmc_void_withholds_date_bearing_speed() {
        let mut reader = utc_reader();
        let recorder = with_sink(&mut reader);
        reader.dates.set(date!(2024 - 05 - 01));

        reader.parse_sentence(RMC_VOID);

        let fix = recorder.fixes()[0];
        assert_eq!(fix.flags, FixFlags::LAT_LONG);
        assert!((fix.latitude + 48.1173).abs() < 1e-4);
        assert!((fix.longitude + 11.516_666).abs() < 1e-4);
        assert_eq!(fix.speed, 0.0);
        assert_eq!(fix.bearing, 0.0);
        assert_eq!(reader.date_cache().date(), Some(date!(2024 - 05 - 01)));
        assert_eq!(
            fix.timestamp,
            datetime!(2024-05-01 12:35:19 UTC).unix_timestamp() * 1000
        );
    }

    #[test]
    fn test_accuracy_clamping() {
        let cases = [
            ("250", ACCURACY_FALLBACK),
            ("-1", ACCURACY_FALLBACK),
            ("15", 15.0),
        ];
        for (figure, expected) in cases {
            let mut reader = utc_reader();
            let recorder = with_sink(&mut reader);
            let line = format!("$GPGGA,123519,4807.038,N,01131.000,E,1,08,{figure},545.4,M\r\n");

            reader.parse_sentence(line.as_bytes());

            let fix = recorder.fixes()[0];
            assert_eq!(fix.accuracy, expected, "figure {figure}");
            assert!(fix.flags.contains(FixFlags::ACCURACY), "figure {figure}");
        }
    }

    #[test]
    fn test_delivery_clears_flags_once() {
        let mut reader = utc_reader();
        let recorder = with_sink(&mut reader);

        reader.parse_sentence(GGA);
        assert!(reader.fix().flags.is_empty());

        // A sentence that updates nothing does not deliver again.
        reader.parse_sentence(b"$GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1*39\r\n");
        assert_eq!(recorder.fixes().len(), 1);
    }

    #[test]
    fn test_late_sink_receives_buffered_fix_once() {
        let mut reader = utc_reader();

        reader.parse_sentence(GGA);
        reader.parse_sentence(RMC_ACTIVE);
        assert!(!reader.fix().flags.is_empty());

        let recorder = with_sink(&mut reader);
        let fixes = recorder.fixes();
        assert_eq!(fixes.len(), 1);
        assert_eq!(
            fixes[0].flags,
            FixFlags::LAT_LONG
                | FixFlags::ALTITUDE
                | FixFlags::ACCURACY
                | FixFlags::SPEED
                | FixFlags::BEARING
        );
        assert!(reader.fix().flags.is_empty());

        reader.set_sink(Some(recorder.clone()));
        assert_eq!(recorder.fixes().len(), 1);
    }

    #[test]
    fn test_values_persist_across_sentences() {
        let mut reader = utc_reader();
        let recorder = with_sink(&mut reader);

        reader.parse_sentence(GGA);
        reader.parse_sentence(RMC_ACTIVE);

        let fixes = recorder.fixes();
        assert_eq!(fixes.len(), 2);
        // The RMC fix still carries the GGA altitude.
        assert_eq!(fixes[1].altitude, 545.4);
        assert!(!fixes[1].flags.contains(FixFlags::ALTITUDE));
    }

    #[test]
    fn test_removed_sink_keeps_fix() {
        let mut reader = utc_reader();
        let recorder = with_sink(&mut reader);
        reader.set_sink(None);

        reader.parse_sentence(GGA);

        assert!(recorder.fixes().is_empty());
        assert!(reader.fix().flags.contains(FixFlags::LAT_LONG));
    }

    #[test]
    fn test_unknown_and_short_ids() {
        let mut reader = utc_reader();

        assert_eq!(
            reader.parse_sentence(b"$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K\r\n"),
            Some(SentenceKind::Other)
        );
        assert_eq!(reader.parse_sentence(b"$GPG,123519,4807.038,N\r\n"), None);
        assert!(reader.fix().flags.is_empty());
    }

    #[test]
    fn test_invalid_date_keeps_cache() {
        let mut reader = utc_reader();
        reader.dates.set(date!(2024 - 05 - 01));

        reader.parse_sentence(b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,231394\r\n");

        assert_eq!(reader.date_cache().date(), Some(date!(2024 - 05 - 01)));
    }

    #[test]
    fn test_time_without_date_uses_today() {
        let mut reader = utc_reader();
        reader.parse_sentence(GGA);

        assert_eq!(
            reader.date_cache().date(),
            Some(OffsetDateTime::now_utc().date())
        );
    }

    #[test]
    fn test_utc_clock_keeps_sentence_time() {
        let mut dates = DateCache::with_local_offset(UtcOffset::UTC);
        dates.set(date!(2024 - 05 - 01));

        assert_eq!(dates.utc_diff(), 0);
        assert_eq!(
            dates.timestamp(time!(12:35:19.5)),
            datetime!(2024-05-01 12:35:19 UTC).unix_timestamp() * 1000 + 500
        );
    }

    #[test]
    fn test_local_offset_shifts_timestamp() {
        let mut utc = DateCache::with_local_offset(UtcOffset::UTC);
        let mut ahead = DateCache::with_local_offset(offset!(+2));
        utc.set(date!(2024 - 05 - 01));
        ahead.set(date!(2024 - 05 - 01));

        assert_eq!(ahead.utc_diff(), -7200);
        // local reading (-2h) then utc_diff (-2h)
        assert_eq!(
            ahead.timestamp(time!(12:35:19)),
            datetime!(2024-05-01 08:35:19 UTC).unix_timestamp() * 1000
        );
        let noon = time!(12:35:19);
        assert_ne!(utc.timestamp(noon), ahead.timestamp(noon));
    }

    #[test]
    fn test_feed_bytes() {
        let mut reader = utc_reader();
        let recorder = with_sink(&mut reader);

        let (head, tail) = GGA.split_at(20);
        reader.feed(head);
        assert!(recorder.fixes().is_empty());
        reader.feed(tail);
        assert_eq!(recorder.fixes().len(), 1);
    }
}
