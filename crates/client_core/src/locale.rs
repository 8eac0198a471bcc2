//! Conversion between user-typed amounts and decimal values.
//!
//! Amounts are typed with either `,` or `.` as the decimal separator
//! (`"2,50"` and `"2.50"` are the same amount). Nothing else is accepted:
//! no digit grouping, no `_`, no `+`. The draft keeps the raw
//! text; only [`parse_amount`] produces a [`Decimal`].

use std::str::FromStr;

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    Empty,
    NotANumber,
    NotPositive,
}

pub fn parse_amount(raw: &str) -> Result<Decimal, AmountError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    // A leading minus is still read so that "-3" reports as not positive.
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
    if unsigned.is_empty()
        || !unsigned
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c == '.')
        || !unsigned.chars().any(|c| c.is_ascii_digit())
        || unsigned.matches(|c: char| c == ',' || c == '.').count() > 1
    {
        return Err(AmountError::NotANumber);
    }

    let value =
        Decimal::from_str(&trimmed.replace(',', ".")).map_err(|_| AmountError::NotANumber)?;
    if value <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    Ok(value)
}

/// Renders an amount the way the form shows it: comma separator, no
/// trailing zeros.
pub fn format_amount(value: Decimal) -> String {
    value.normalize().to_string().replace('.', ",")
}

pub fn parse_radius(raw: &str) -> Result<u32, AmountError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    let value = trimmed.parse::<u32>().map_err(|_| {
        if trimmed.starts_with('-') {
            AmountError::NotPositive
        } else {
            AmountError::NotANumber
        }
    })?;
    if value == 0 {
        return Err(AmountError::NotPositive);
    }
    Ok(value)
}

#[cfg(test)]
#[path = "tests/locale_tests.rs"]
mod tests;
