use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

use tracing::warn;

use crate::error::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("not a number")]
    NotANumber,

    #[error("number out of range")]
    OutOfRange,
}

impl From<ConversionError> for ErrorCode {
    fn from(error: ConversionError) -> Self {
        warn!("Numeric conversion failed: {error}");
        ErrorCode::InternalError
    }
}

/// Strict integer parsing: no surrounding whitespace or trailing characters.
pub fn str_to_integral<T>(input: &str) -> Result<T, ConversionError>
where
    T: FromStr<Err = ParseIntError>,
{
    input.parse::<T>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ConversionError::OutOfRange
        }
        _ => ConversionError::NotANumber,
    })
}

/// Float counterpart of [`str_to_integral`]. Literal `inf`/`infinity` are
/// accepted; any other input that only fits as infinity is out of range.
pub fn str_to_floating_point<T>(input: &str) -> Result<T, ConversionError>
where
    T: FromStr + Into<f64> + Copy,
{
    if input.is_empty() || input.trim() != input {
        return Err(ConversionError::NotANumber);
    }

    let value = input
        .parse::<T>()
        .map_err(|_| ConversionError::NotANumber)?;

    let literal_infinity = input
        .trim_start_matches(['+', '-'])
        .to_ascii_lowercase()
        .starts_with("inf");
    if value.into().is_infinite() && !literal_infinity {
        Err(ConversionError::OutOfRange)
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{str_to_floating_point, str_to_integral, ConversionError};
    use crate::error::ErrorCode;

    #[rstest]
    #[case("42", Ok(42))]
    #[case("-7", Ok(-7))]
    #[case("", Err(ConversionError::NotANumber))]
    #[case(" 1", Err(ConversionError::NotANumber))]
    #[case("1x", Err(ConversionError::NotANumber))]
    #[case("99999999999", Err(ConversionError::OutOfRange))]
    #[case("-99999999999", Err(ConversionError::OutOfRange))]
    fn test_str_to_integral(
        #[case] input: &str,
        #[case] expected: Result<i32, ConversionError>,
    ) {
        assert_eq!(str_to_integral::<i32>(input), expected);
    }

    #[rstest]
    #[case("1.5", Ok(1.5))]
    #[case("-inf", Ok(f32::NEG_INFINITY))]
    #[case("", Err(ConversionError::NotANumber))]
    #[case("1.5 ", Err(ConversionError::NotANumber))]
    #[case("abc", Err(ConversionError::NotANumber))]
    #[case("1e40", Err(ConversionError::OutOfRange))]
    fn test_str_to_floating_point(
        #[case] input: &str,
        #[case] expected: Result<f32, ConversionError>,
    ) {
        assert_eq!(str_to_floating_point::<f32>(input), expected);
    }

    #[test]
    fn test_conversion_error_code() {
        assert_eq!(
            ErrorCode::from(ConversionError::OutOfRange),
            ErrorCode::InternalError
        );
    }
}
