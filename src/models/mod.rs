//! Data models

mod account;
mod auth;
mod organization;
mod pagination;
mod property;
mod property_item;
mod property_scan;
mod property_suggestion;

pub use account::*;
pub use auth::*;
pub use organization::*;
pub use pagination::*;
pub use property::*;
pub use property_item::*;
pub use property_scan::*;
pub use property_suggestion::*;
