//! Utility types and functions.
//!
//! This module contains fundamental pieces used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - [`binary`] - Endian-aware readers and the format's packed scalars
//! - Math type re-exports from glam

pub mod binary;
mod error;
mod math;

pub use binary::Endian;
pub use error::*;
pub use math::*;
