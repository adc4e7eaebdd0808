use crate::nmea_content::{FieldName, sentences::FieldMap};

/// GGA - Global Positioning System Fix Data
///
/// <https://gpsd.gitlab.io/gpsd/NMEA.html#_gga_global_positioning_system_fix_data>
///
/// ```text
///                                                      11
///         1         2       3 4        5 6 7  8   9  10 |  12 13  14
///         |         |       | |        | | |  |   |   | |   | |   |
///  $--GGA,hhmmss.ss,ddmm.mm,a,dddmm.mm,a,x,xx,x.x,x.x,M,x.x,M,x.x,xxxx*hh<CR><LF>
/// ```
///
/// The fix quality indicator (6) fills the status slot; it is never `A`, so
/// GGA alone does not update date, bearing or speed. The satellite count (7)
/// is not used and the horizontal dilution of precision (8) is read as the
/// accuracy figure.
pub const GGA_FIELDS: FieldMap = &[
    (1, FieldName::Time),
    (2, FieldName::Latitude),
    (3, FieldName::LatitudeHemisphere),
    (4, FieldName::Longitude),
    (5, FieldName::LongitudeHemisphere),
    (6, FieldName::FixStatus),
    (8, FieldName::Accuracy),
    (9, FieldName::Altitude),
    (10, FieldName::AltitudeUnits),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{nmea0183::Tokenizer, nmea_content::SentenceFieldSet};

    #[test]
    fn test_gga_mapping() {
        let tokenizer = Tokenizer::new(
            b"$GPGGA,001043.00,4404.14036,N,12118.85961,W,1,12,0.98,1113.0,M,-21.3,M,,*47\r\n",
        );
        let fields = SentenceFieldSet::from_map(&tokenizer, GGA_FIELDS);

        assert_eq!(fields.time.as_bytes(), b"001043.00");
        assert_eq!(fields.latitude.as_bytes(), b"4404.14036");
        assert_eq!(fields.latitude_hemisphere.as_bytes(), b"N");
        assert_eq!(fields.longitude.as_bytes(), b"12118.85961");
        assert_eq!(fields.longitude_hemisphere.as_bytes(), b"W");
        assert_eq!(fields.fix_status.as_bytes(), b"1");
        assert_eq!(fields.accuracy.as_bytes(), b"0.98");
        assert_eq!(fields.altitude.as_bytes(), b"1113.0");
        assert_eq!(fields.altitude_units.as_bytes(), b"M");
        assert!(!fields.date.is_valid());
        assert!(!fields.is_active());
    }

    #[test]
    fn test_gga_empty_time_shifts_fields() {
        let tokenizer = Tokenizer::new(b"$GPGGA,,4807.038,N,01131.000,E,1,08,0.9,545.4,M\n");
        let fields = SentenceFieldSet::from_map(&tokenizer, GGA_FIELDS);

        // Everything moved one slot to the left.
        assert_eq!(fields.time.as_bytes(), b"4807.038");
        assert_eq!(fields.latitude.as_bytes(), b"N");
        assert_eq!(fields.altitude.as_bytes(), b"M");
        assert!(!fields.altitude_units.is_valid());
    }
}
