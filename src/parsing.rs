//! # Parsing Utilities
//!
//! Fixed-point scalar decoders over the byte ranges of a sentence field, and
//! the combinator that makes a parser account for every byte of its field.
//!
//! All decoders are total: a field that is not entirely a number yields
//! [`None`] and the caller leaves the corresponding fix value untouched.

use nom::{
    Err, IResult, Input, Mode, OutputMode, PResult, Parser,
    character::complete::u32 as decimal_u32,
    error::{ErrorKind, ParseError},
    number::complete::double,
};

/// Ensures that the parser consumes all input.
///
/// This combinator runs the provided parser and then fails with `e` if any
/// input is left over, so that `"0.9"` is not accepted as the integer `0`.
///
/// # Examples
///
/// ```rust
/// use nmea0183_relay::parsing::consumed;
/// use nom::{IResult, Parser, bytes::complete::take, error::ErrorKind};
///
/// let mut parser = consumed(take(3u8), ErrorKind::Count);
/// let result: IResult<_, _> = parser.parse("abc");
/// assert!(result.is_ok());
///
/// let result: IResult<_, _> = parser.parse("abcd");
/// assert!(result.is_err());
/// ```
pub fn consumed<I, E: ParseError<I>, F>(
    f: F,
    e: ErrorKind,
) -> impl Parser<I, Output = <F as Parser<I>>::Output, Error = E>
where
    I: Input,
    F: Parser<I, Error = E>,
{
    Consumed { f, e }
}

struct Consumed<F> {
    f: F,
    e: ErrorKind,
}

impl<I, F> Parser<I> for Consumed<F>
where
    I: Input,
    F: Parser<I>,
{
    type Output = <F as Parser<I>>::Output;
    type Error = <F as Parser<I>>::Error;

    fn process<OM: OutputMode>(&mut self, i: I) -> PResult<OM, I, Self::Output, Self::Error> {
        let (i, o) = self.f.process::<OM>(i)?;

        if i.input_len() != 0 {
            return Err(Err::Error(OM::Error::bind(|| {
                <F as Parser<I>>::Error::from_error_kind(i, self.e)
            })));
        }

        Ok((i, o))
    }
}

/// Decodes an unsigned decimal integer spanning the whole field.
///
/// A sign, a decimal point or any other stray byte makes the field invalid,
/// so `"-1"` and `"0.9"` both yield [`None`].
///
/// ```rust
/// use nmea0183_relay::parsing::parse_int;
///
/// assert_eq!(parse_int(b"08"), Some(8));
/// assert_eq!(parse_int(b"-1"), None);
/// assert_eq!(parse_int(b""), None);
/// ```
pub fn parse_int(field: &[u8]) -> Option<u32> {
    let result: IResult<&[u8], u32> = consumed(decimal_u32, ErrorKind::Digit).parse(field);
    result.ok().map(|(_, value)| value)
}

/// Decodes a decimal number (optional sign, fraction and exponent) spanning
/// the whole field. Non-finite spellings such as `nan` and `inf` are refused.
///
/// ```rust
/// use nmea0183_relay::parsing::parse_decimal;
///
/// assert_eq!(parse_decimal(b"545.4"), Some(545.4));
/// assert_eq!(parse_decimal(b"12abc"), None);
/// ```
pub fn parse_decimal(field: &[u8]) -> Option<f64> {
    let result: IResult<&[u8], f64> = consumed(double, ErrorKind::Float).parse(field);
    result
        .ok()
        .map(|(_, value)| value)
        .filter(|value| value.is_finite())
}

/// Decodes the integer held in `field[start..end]`.
///
/// Out-of-range bounds yield [`None`] instead of panicking.
pub fn digits(field: &[u8], start: usize, end: usize) -> Option<u32> {
    field.get(start..end).and_then(parse_int)
}
