//! Scenario-level XML resources.

mod lighting;

pub use lighting::{sun_direction, Lighting};
