//! Opaque shipping-session tokens.

use core::fmt;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Error returned when a string cannot be a session token.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionTokenError {
    #[error("session token cannot be empty")]
    Empty,
    #[error("session token must be at most {max} characters")]
    TooLong { max: usize },
    #[error("session token may only contain letters, digits and underscores")]
    InvalidCharacter,
}

/// A shipping-session token, shared by the cookie and the server-side cache key.
///
/// Issued tokens look like `sess_` followed by 32 alphanumerics. Parsing
/// accepts any `[A-Za-z0-9_]+` value so admin routes can address sessions by
/// the id shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Prefix of generated tokens.
    pub const PREFIX: &'static str = "sess_";
    /// Random characters after the prefix.
    pub const RANDOM_LENGTH: usize = 32;
    /// Upper bound accepted by [`SessionToken::parse`].
    pub const MAX_LENGTH: usize = 128;

    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        let random: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(Self::RANDOM_LENGTH)
            .map(char::from)
            .collect();
        Self(format!("{}{random}", Self::PREFIX))
    }

    /// Parse a token received from a cookie or path segment.
    ///
    /// # Errors
    ///
    /// Returns `SessionTokenError` when the value is empty, too long, or
    /// contains characters outside `[A-Za-z0-9_]`.
    pub fn parse(s: &str) -> Result<Self, SessionTokenError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SessionTokenError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SessionTokenError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(SessionTokenError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// The token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SessionToken {
    type Err = SessionTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionToken {
    type Error = SessionTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let token = SessionToken::generate();
        let s = token.as_str();
        assert!(s.starts_with("sess_"));
        assert_eq!(s.len(), 5 + 32);
        assert!(SessionToken::parse(s).is_ok());
    }

    #[test]
    fn test_generated_tokens_differ() {
        assert_ne!(SessionToken::generate(), SessionToken::generate());
    }

    #[test]
    fn test_parse_rejects_cookie_injection() {
        assert_eq!(
            SessionToken::parse("sess_abc; Path=/"),
            Err(SessionTokenError::InvalidCharacter)
        );
        assert_eq!(SessionToken::parse(""), Err(SessionTokenError::Empty));
        assert!(matches!(
            SessionToken::parse(&"a".repeat(200)),
            Err(SessionTokenError::TooLong { .. })
        ));
    }
}
