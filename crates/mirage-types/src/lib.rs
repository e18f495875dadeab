//! Foundation types for the MIRAGE_OS terminal core.
//!
//! Shared error enum and session configuration. Every other crate in the
//! workspace depends on this one; it depends on nothing internal.

pub mod config;
pub mod error;

pub use config::TerminalConfig;
pub use error::{MirageError, Result};
