//! Contact phone number.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// Fewer digits than a dialable number needs.
    #[error("phone number must contain at least {min} digits")]
    TooShort {
        /// Minimum digit count.
        min: usize,
    },
    /// Longer than any real number.
    #[error("phone number must be at most {max} characters")]
    TooLong {
        /// Maximum character count.
        max: usize,
    },
    /// Contains characters other than digits, spaces and `+-().`.
    #[error("phone number contains invalid characters")]
    InvalidCharacters,
}

/// A phone number the kitchen can call about an order.
///
/// Formatting characters are kept as typed; only the digit count is checked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 7;
    /// Maximum length including formatting.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a phone number, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] if the number is too short, too long or has
    /// characters that do not belong in a phone number.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();
        if s.len() > Self::MAX_LENGTH {
            return Err(PhoneError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.'))
        {
            return Err(PhoneError::InvalidCharacters);
        }

        if s.chars().filter(char::is_ascii_digit).count() < Self::MIN_DIGITS {
            return Err(PhoneError::TooShort {
                min: Self::MIN_DIGITS,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the number as typed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(PhoneNumber::parse("555-0100").is_ok());
        assert!(PhoneNumber::parse("+1 (415) 555-0100").is_ok());
        assert!(PhoneNumber::parse(" 4155550100 ").is_ok());
    }

    #[test]
    fn test_parse_too_short() {
        assert_eq!(
            PhoneNumber::parse("555-01"),
            Err(PhoneError::TooShort { min: 7 })
        );
        assert!(PhoneNumber::parse("").is_err());
    }

    #[test]
    fn test_parse_invalid_characters() {
        assert_eq!(
            PhoneNumber::parse("call me maybe"),
            Err(PhoneError::InvalidCharacters)
        );
    }

    #[test]
    fn test_parse_too_long() {
        assert!(matches!(
            PhoneNumber::parse(&"1".repeat(40)),
            Err(PhoneError::TooLong { .. })
        ));
    }
}
