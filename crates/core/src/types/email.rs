//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty after trimming.
    #[error("Email is required")]
    Empty,
    /// The input exceeds the RFC 5321 limit.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is not of the form `local@domain`.
    #[error("email must look like name@domain")]
    Malformed,
}

/// A syntactically plausible email address.
///
/// Only input that could never be an address is rejected; account rules are
/// checked by the backend.
///
/// ```
/// use styleaura_core::Email;
///
/// assert!(Email::parse("a@b.com").is_ok());
/// assert!(Email::parse("  shopper@styleaura.in ").is_ok());
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("two@@ats.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, or does not
    /// have exactly one `@` with text on both sides.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        match s.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(s.to_owned()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the part before the `@`.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or_default()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let email = Email::parse("  a@b.com\n").unwrap();
        assert_eq!(email.as_str(), "a@b.com");
        assert_eq!(email.local_part(), "a");
    }

    #[test]
    fn test_empty_message_matches_form_error() {
        assert_eq!(Email::parse("   ").unwrap_err().to_string(), "Email is required");
    }

    #[test]
    fn test_rejects_missing_parts() {
        assert_eq!(Email::parse("@b.com"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("a@"), Err(EmailError::Malformed));
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}@b.com", "a".repeat(Email::MAX_LENGTH));
        assert_eq!(
            Email::parse(&long),
            Err(EmailError::TooLong {
                max: Email::MAX_LENGTH
            })
        );
    }
}
