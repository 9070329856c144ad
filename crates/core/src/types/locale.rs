//! Checkout locales.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned for a locale the checkout has no strings for.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported locale: {0}")]
pub struct LocaleError(pub String);

/// Locales the checkout front end can request.
///
/// The front end sends short codes (`fr`); stored orders and API responses
/// use the long form (`fr_FR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locale {
    #[default]
    EnUs,
    FrFr,
    EsEs,
    DeDe,
}

impl Locale {
    /// Parse a short (`fr`) or long (`fr_FR`, `fr-FR`) locale code.
    ///
    /// # Errors
    ///
    /// Returns `LocaleError` for anything outside the supported set.
    pub fn parse(s: &str) -> Result<Self, LocaleError> {
        let normalized = s.trim().replace('-', "_");
        match normalized.to_ascii_lowercase().as_str() {
            "en" | "en_us" => Ok(Self::EnUs),
            "fr" | "fr_fr" => Ok(Self::FrFr),
            "es" | "es_es" => Ok(Self::EsEs),
            "de" | "de_de" => Ok(Self::DeDe),
            _ => Err(LocaleError(s.to_owned())),
        }
    }

    /// Parse an optional locale, defaulting to `en_US` when absent or blank.
    ///
    /// # Errors
    ///
    /// Returns `LocaleError` for a present but unsupported value.
    pub fn parse_or_default(s: Option<&str>) -> Result<Self, LocaleError> {
        match s.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(value) => Self::parse(value),
        }
    }

    /// Long form, e.g. `fr_FR`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EnUs => "en_US",
            Self::FrFr => "fr_FR",
            Self::EsEs => "es_ES",
            Self::DeDe => "de_DE",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<String> for Locale {
    type Error = LocaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.code().to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_forms() {
        assert_eq!(Locale::parse("fr").unwrap(), Locale::FrFr);
        assert_eq!(Locale::parse("de-DE").unwrap(), Locale::DeDe);
        assert_eq!(Locale::parse("es_ES").unwrap().code(), "es_ES");
    }

    #[test]
    fn test_unknown_locale_rejected() {
        assert_eq!(Locale::parse("it"), Err(LocaleError("it".to_owned())));
    }

    #[test]
    fn test_default_when_missing() {
        assert_eq!(Locale::parse_or_default(None).unwrap(), Locale::EnUs);
        assert_eq!(Locale::parse_or_default(Some(" ")).unwrap(), Locale::EnUs);
        assert!(Locale::parse_or_default(Some("xx")).is_err());
    }
}
