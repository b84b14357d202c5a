use bytes::Bytes;

use crate::commands::CommandError;

pub fn parse_integer(argument: &[u8]) -> Result<i64, CommandError> {
    std::str::from_utf8(argument)
        .ok()
        .and_then(|argument| argument.parse::<i64>().ok())
        .ok_or(CommandError::NotAnInteger)
}

/// Parses a float the way Redis does: `inf`, `+inf` and `-inf` are accepted,
/// NaN is not.
pub fn parse_float(argument: &[u8]) -> Result<f64, CommandError> {
    let value = std::str::from_utf8(argument)
        .ok()
        .and_then(|argument| argument.parse::<f64>().ok())
        .ok_or(CommandError::NotAFloat)?;

    if value.is_nan() {
        return Err(CommandError::NotAFloat);
    }

    Ok(value)
}

/// Upper-cased lossy rendering, used for option and command names.
pub fn uppercase(argument: &[u8]) -> String {
    String::from_utf8_lossy(argument).to_uppercase()
}

/// Score rendering used in replies: `1`, `1.5`, `inf`, `-inf`.
pub fn format_score(score: f64) -> Bytes {
    Bytes::from(score.to_string())
}
