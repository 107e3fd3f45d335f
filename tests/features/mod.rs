//! Cucumber step definitions and world

pub mod step_definitions;
pub mod support;

pub use support::TestWorld;
