//! # Spindle Common Library
//!
//! Shared code for the Spindle audio library tools including:
//! - Error types
//! - User configuration (lookup provider token)
//! - Recursive audio file scanning
//! - Terminal prompting
//! - Timestamp formatting

pub mod config;
pub mod error;
pub mod prompt;
pub mod scanner;
pub mod time;

pub use error::{Error, Result};
