//! Test factories for generating test data
//!
//! Factories create randomized but unique data so tests never trip over
//! the email and identifier uniqueness rules by accident.

use std::sync::atomic::{AtomicU64, Ordering};

use fake::{
    faker::{internet::en::Username, lorem::en::Word, name::en::Name},
    Fake,
};
use serde_json::{json, Value};

pub const TEST_PASSWORD: &str = "Corr3ct-Horse-Battery";

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn next() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Factory for account registration payloads
pub struct AccountFactory;

impl AccountFactory {
    /// A unique, syntactically valid email address
    pub fn email() -> String {
        let user: String = Username().fake();
        let user: String = user
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let user = if user.is_empty() { "user".to_string() } else { user };
        format!("{}.{}@example.com", user.to_lowercase(), next())
    }

    pub fn full_name() -> String {
        Name().fake()
    }

    pub fn registration(email: &str) -> Value {
        json!({
            "email": email,
            "full_name": Self::full_name(),
            "password": TEST_PASSWORD,
        })
    }
}

/// Factory for item payloads
pub struct ItemFactory;

impl ItemFactory {
    /// A unique inventory number
    pub fn inventory_number() -> String {
        format!("INV-{:05}", next())
    }

    /// Minimal create payload with a random name
    pub fn create() -> Value {
        let word: String = Word().fake();
        json!({
            "name": format!("{} {}", word, next()),
            "inventory_number": Self::inventory_number(),
        })
    }

    /// Create payload with a fixed inventory number
    pub fn with_inventory_number(number: &str) -> Value {
        let mut item = Self::create();
        item["inventory_number"] = json!(number);
        item
    }

    /// Create payload assigned to an employee
    pub fn assigned_to(employee_id: &str) -> Value {
        let mut item = Self::create();
        item["employee_id"] = json!(employee_id);
        item
    }

    pub fn batch(count: usize) -> Vec<Value> {
        (0..count).map(|_| Self::create()).collect()
    }
}
