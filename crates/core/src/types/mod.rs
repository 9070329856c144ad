//! Core types for DirectPay.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod country;
pub mod email;
pub mod id;
pub mod locale;
pub mod money;
pub mod status;
pub mod token;

pub use country::{CountryCode, CountryCodeError};
pub use email::{Email, EmailError};
pub use id::*;
pub use locale::{Locale, LocaleError};
pub use money::{CurrencyCode, Money, MoneyError};
pub use status::*;
pub use token::{SessionToken, SessionTokenError};
