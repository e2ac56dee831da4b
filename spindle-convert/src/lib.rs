//! spindle-convert library interface

pub mod converter;

pub use converter::{ConvertError, FlacConverter, Outcome};
