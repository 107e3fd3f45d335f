//! Common test utilities and helpers
//!
//! This module provides shared test infrastructure including:
//! - A test application backed by a throwaway SQLite file
//! - Factories for randomized accounts and items
//! - Fixtures that walk the registration and tenant setup flows

pub mod factories;
pub mod fixtures;

pub use factories::*;
pub use fixtures::*;
pub use test_app::*;
