//! # Error Handling
//!
//! Error types for the routeweave translation core. Every fallible operation in
//! the crate returns [`Result`], whose error side is [`TranslatorError`].

pub mod types;

pub use types::{Result, TranslatorError};
