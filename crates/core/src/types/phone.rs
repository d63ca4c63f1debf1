//! Customer phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input is shorter than the minimum number of digits/separators.
    #[error("phone number must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length (excluding a leading `+`).
        min: usize,
    },
    /// The input is longer than the maximum number of digits/separators.
    #[error("phone number must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length (excluding a leading `+`).
        max: usize,
    },
    /// The input contains a character outside the allowed set.
    #[error("phone number contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A customer phone number.
///
/// Accepts the loose international shape `+?[0-9. ()-]{7,25}`: an optional
/// leading `+`, then 7 to 25 digits or common separator characters
/// (dot, space, parentheses, hyphen). No carrier or region validation is
/// attempted.
///
/// ## Examples
///
/// ```
/// use shopd_core::Phone;
///
/// assert!(Phone::parse("+1 (555) 010-9999").is_ok());
/// assert!(Phone::parse("0812345678").is_ok());
///
/// assert!(Phone::parse("").is_err());         // empty
/// assert!(Phone::parse("12345").is_err());    // too short
/// assert!(Phone::parse("555-CALL-NOW").is_err()); // letters
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Minimum length after the optional leading `+`.
    pub const MIN_LENGTH: usize = 7;
    /// Maximum length after the optional leading `+`.
    pub const MAX_LENGTH: usize = 25;

    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, outside the 7-25 character
    /// range, or contains anything other than digits and the separator set
    /// `. ()-`.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        let rest = s.strip_prefix('+').unwrap_or(s);

        if rest.len() < Self::MIN_LENGTH {
            return Err(PhoneError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }

        if rest.len() > Self::MAX_LENGTH {
            return Err(PhoneError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(bad) = rest
            .chars()
            .find(|c| !c.is_ascii_digit() && !matches!(c, '.' | ' ' | '(' | ')' | '-'))
        {
            return Err(PhoneError::InvalidCharacter(bad));
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_digits() {
        assert!(Phone::parse("0812345678").is_ok());
    }

    #[test]
    fn accepts_international_format_with_separators() {
        let phone = Phone::parse("+62 (21) 555-01.23").expect("valid phone");
        assert_eq!(phone.as_str(), "+62 (21) 555-01.23");
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
    }

    #[test]
    fn rejects_too_short() {
        assert_eq!(
            Phone::parse("123456"),
            Err(PhoneError::TooShort { min: 7 })
        );
        // a bare "+" does not count toward the length
        assert_eq!(
            Phone::parse("+123456"),
            Err(PhoneError::TooShort { min: 7 })
        );
    }

    #[test]
    fn rejects_too_long() {
        let long = "9".repeat(26);
        assert_eq!(Phone::parse(&long), Err(PhoneError::TooLong { max: 25 }));
    }

    #[test]
    fn rejects_letters_and_inner_plus() {
        assert_eq!(
            Phone::parse("555-CALL-NOW"),
            Err(PhoneError::InvalidCharacter('C'))
        );
        assert_eq!(
            Phone::parse("08+1234567"),
            Err(PhoneError::InvalidCharacter('+'))
        );
    }

    #[test]
    fn boundary_lengths_are_accepted() {
        assert!(Phone::parse(&"7".repeat(7)).is_ok());
        assert!(Phone::parse(&"7".repeat(25)).is_ok());
    }
}
