//! Command implementations for the pkgbot CLI.

pub mod pkg;
