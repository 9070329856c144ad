//! DirectPay Core - Shared domain types.
//!
//! This crate provides the types used across all DirectPay components:
//! - `checkout` - Public checkout API and admin endpoints
//! - `cli` - Command-line tools for migrations and shipping configuration
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. Request payloads are parsed into these types at the
//! edge so services never see unchecked strings for emails, amounts, countries,
//! locales or session tokens.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, countries, locales,
//!   session tokens and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
