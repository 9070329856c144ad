//! Customer email address.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Why a billing email was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email address is blank")]
    Blank,
    #[error("email address is longer than {0} characters")]
    TooLong(usize),
    #[error("email address contains spaces")]
    ContainsSpace,
    #[error("email address needs a single '@' between a name and a domain")]
    Malformed,
    #[error("email domain '{0}' is not a valid host name")]
    BadDomain(String),
}

/// A billing email address.
///
/// Shipping sessions are keyed to the billing email, so the value is
/// normalized on parse: surrounding whitespace is dropped and the domain is
/// lowercased. The mailbox part keeps its case.
///
/// ```
/// use directpay_core::Email;
///
/// let email = Email::parse("  Jane.Doe@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "Jane.Doe@example.com");
/// assert!(Email::parse("user@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// # Errors
    ///
    /// Returns the first [`EmailError`] the input runs into.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(EmailError::Blank);
        }
        if value.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong(Self::MAX_LENGTH));
        }
        if value.contains(|c: char| c.is_whitespace() || c.is_control()) {
            return Err(EmailError::ContainsSpace);
        }

        let (mailbox, domain) = value
            .split_once('@')
            .filter(|(mailbox, domain)| !mailbox.is_empty() && !domain.contains('@'))
            .ok_or(EmailError::Malformed)?;

        let domain = domain.to_ascii_lowercase();
        let labels_ok = domain.split('.').all(|label| !label.is_empty());
        if !labels_ok || !domain.contains('.') {
            return Err(EmailError::BadDomain(domain));
        }

        Ok(Self(format!("{mailbox}@{domain}")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_addresses() {
        for raw in ["ana@example.com", "ana+relais@example.fr", "a@mail.example.co.uk"] {
            assert!(Email::parse(raw).is_ok(), "{raw}");
        }
    }

    #[test]
    fn test_normalizes_domain_only() {
        let email = Email::parse("\tMarie@Exemple.FR\n").unwrap();
        assert_eq!(email.to_string(), "Marie@exemple.fr");
    }

    #[test]
    fn test_rejections() {
        assert_eq!(Email::parse("  "), Err(EmailError::Blank));
        assert_eq!(Email::parse("ana example.com"), Err(EmailError::ContainsSpace));
        assert_eq!(Email::parse("ana.example.com"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("@example.com"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("a@b@example.com"), Err(EmailError::Malformed));
        assert_eq!(
            Email::parse("ana@Localhost"),
            Err(EmailError::BadDomain("localhost".to_owned()))
        );
        assert!(matches!(Email::parse("ana@example..com"), Err(EmailError::BadDomain(_))));
        assert!(matches!(Email::parse("ana@"), Err(EmailError::BadDomain(_))));

        let long = format!("{}@example.com", "a".repeat(Email::MAX_LENGTH));
        assert_eq!(Email::parse(&long), Err(EmailError::TooLong(Email::MAX_LENGTH)));
    }

    #[test]
    fn test_json_goes_through_parse() {
        assert!(serde_json::from_str::<Email>("\"not-an-email\"").is_err());
        let email: Email = serde_json::from_str("\"ana@Example.com\"").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"ana@example.com\"");
    }
}
