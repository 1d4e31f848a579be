//! Internationalization primitives for Newsdesk
//!
//! This crate provides the language selection payload stored in the local
//! cache and language-code normalization.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lang;

pub use lang::{normalize_code, LanguageSelection, DEFAULT_LANGUAGE_CODE, DEFAULT_LANGUAGE_NAME};
