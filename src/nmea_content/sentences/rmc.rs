use crate::nmea_content::{FieldName, sentences::FieldMap};

/// RMC - Recommended Minimum Navigation Information
///
/// <https://gpsd.gitlab.io/gpsd/NMEA.html#_rmc_recommended_minimum_navigation_information>
///
/// ```text
///         1         2 3       4 5        6  7   8   9    10 11
///         |         | |       | |        |  |   |   |    |  |
///  $--RMC,hhmmss.ss,A,ddmm.mm,a,dddmm.mm,a,x.x,x.x,xxxx,x.x,a*hh<CR><LF>
/// ```
///
/// Magnetic variation (10, 11) and the later mode fields are not used.
pub const RMC_FIELDS: FieldMap = &[
    (1, FieldName::Time),
    (2, FieldName::FixStatus),
    (3, FieldName::Latitude),
    (4, FieldName::LatitudeHemisphere),
    (5, FieldName::Longitude),
    (6, FieldName::LongitudeHemisphere),
    (7, FieldName::Speed),
    (8, FieldName::Bearing),
    (9, FieldName::Date),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{nmea0183::Tokenizer, nmea_content::SentenceFieldSet};

    #[test]
    fn test_rmc_mapping() {
        let tokenizer = Tokenizer::new(
            b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n",
        );
        let fields = SentenceFieldSet::from_map(&tokenizer, RMC_FIELDS);

        assert_eq!(fields.time.as_bytes(), b"123519");
        assert_eq!(fields.fix_status.as_bytes(), b"A");
        assert_eq!(fields.latitude.as_bytes(), b"4807.038");
        assert_eq!(fields.longitude_hemisphere.as_bytes(), b"E");
        assert_eq!(fields.speed.as_bytes(), b"022.4");
        assert_eq!(fields.bearing.as_bytes(), b"084.4");
        assert_eq!(fields.date.as_bytes(), b"230394");
        assert!(!fields.accuracy.is_valid());
        assert!(fields.is_active());
    }

    #[test]
    fn test_rmc_void_status() {
        let line = b"$GPRMC,235959,V,0000.000,N,00000.000,W,10.5,180.0,311299\n";
        let tokenizer = Tokenizer::new(line);
        let fields = SentenceFieldSet::from_map(&tokenizer, RMC_FIELDS);

        assert_eq!(fields.fix_status.as_bytes(), b"V");
        assert!(!fields.is_active());
    }
}
