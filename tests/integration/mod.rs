//! Integration tests for the property inventory API
//!
//! These tests drive the full router, middleware included, against a
//! throwaway SQLite database.

mod api_tests;
mod auth_tests;
mod cleanup_tests;
mod item_tests;
mod organization_tests;
mod suggestion_tests;
