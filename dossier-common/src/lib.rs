//! Shared infrastructure for the dossier workspace
//!
//! Error type, layered configuration resolution and logging setup used by
//! the fusion library and its command-line front end.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
