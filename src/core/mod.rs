//! Core layer - shared caching primitives.
//!
//! This module provides:
//! - [`ValueCache`] - per-resource memoization keyed by [`Property`]

mod cache;

pub use cache::{Property, ValueCache};
