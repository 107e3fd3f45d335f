//! Property item model
//!
//! A single inventory asset. Each identifier (inventory, registration, serial and
//! document number) is independently unique within the owning property.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::{validate_identifier, validate_not_blank, validate_price};

/// Presence status of an item within the current scan campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemScanStatus {
    #[default]
    NotScanned,
    Scanned,
}

impl ItemScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemScanStatus::NotScanned => "not_scanned",
            ItemScanStatus::Scanned => "scanned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_scanned" => Some(ItemScanStatus::NotScanned),
            "scanned" => Some(ItemScanStatus::Scanned),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifier columns that must be unique per property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemIdentifier {
    InventoryNumber,
    RegistrationNumber,
    SerialNumber,
    DocumentNumber,
}

impl ItemIdentifier {
    pub const ALL: [ItemIdentifier; 4] = [
        ItemIdentifier::InventoryNumber,
        ItemIdentifier::RegistrationNumber,
        ItemIdentifier::SerialNumber,
        ItemIdentifier::DocumentNumber,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            ItemIdentifier::InventoryNumber => "inventory_number",
            ItemIdentifier::RegistrationNumber => "registration_number",
            ItemIdentifier::SerialNumber => "serial_number",
            ItemIdentifier::DocumentNumber => "document_number",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemIdentifier::InventoryNumber => "inventory number",
            ItemIdentifier::RegistrationNumber => "registration number",
            ItemIdentifier::SerialNumber => "serial number",
            ItemIdentifier::DocumentNumber => "document number",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyItem {
    pub id: Uuid,
    pub property_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub inventory_number: String,
    pub registration_number: Option<String>,
    pub serial_number: Option<String>,
    pub document_number: Option<String>,
    pub price: Option<f64>,
    pub scan_status: ItemScanStatus,
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PropertyItem {
    pub fn from_request(property_id: Uuid, req: &CreatePropertyItemRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            property_id,
            employee_id: req.employee_id,
            name: req.name.trim().to_string(),
            description: req.description.clone(),
            category: req.category.clone(),
            location: req.location.clone(),
            inventory_number: req.inventory_number.clone(),
            registration_number: req.registration_number.clone(),
            serial_number: req.serial_number.clone(),
            document_number: req.document_number.clone(),
            price: req.price,
            scan_status: ItemScanStatus::NotScanned,
            last_scanned_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update; absent fields keep their value
    pub fn apply(&mut self, req: &UpdatePropertyItemRequest) {
        if let Some(ref name) = req.name {
            self.name = name.trim().to_string();
        }
        if req.description.is_some() {
            self.description = req.description.clone();
        }
        if req.category.is_some() {
            self.category = req.category.clone();
        }
        if req.location.is_some() {
            self.location = req.location.clone();
        }
        if let Some(ref inventory_number) = req.inventory_number {
            self.inventory_number = inventory_number.clone();
        }
        if req.registration_number.is_some() {
            self.registration_number = req.registration_number.clone();
        }
        if req.serial_number.is_some() {
            self.serial_number = req.serial_number.clone();
        }
        if req.document_number.is_some() {
            self.document_number = req.document_number.clone();
        }
        if req.price.is_some() {
            self.price = req.price;
        }
        if req.employee_id.is_some() {
            self.employee_id = req.employee_id;
        }
        if req.unassign_employee {
            self.employee_id = None;
        }
        self.updated_at = Utc::now();
    }

    pub fn identifier(&self, identifier: ItemIdentifier) -> Option<&str> {
        match identifier {
            ItemIdentifier::InventoryNumber => Some(self.inventory_number.as_str()),
            ItemIdentifier::RegistrationNumber => self.registration_number.as_deref(),
            ItemIdentifier::SerialNumber => self.serial_number.as_deref(),
            ItemIdentifier::DocumentNumber => self.document_number.as_deref(),
        }
    }

    pub fn mark_scanned(&mut self) {
        let now = Utc::now();
        self.scan_status = ItemScanStatus::Scanned;
        self.last_scanned_at = Some(now);
        self.updated_at = now;
    }
}

/// Item creation command payload (also embedded in CREATE suggestions)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct CreatePropertyItemRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub category: Option<String>,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub location: Option<String>,
    #[validate(custom(function = "validate_identifier"))]
    pub inventory_number: String,
    #[validate(custom(function = "validate_identifier"))]
    #[serde(default)]
    pub registration_number: Option<String>,
    #[validate(custom(function = "validate_identifier"))]
    #[serde(default)]
    pub serial_number: Option<String>,
    #[validate(custom(function = "validate_identifier"))]
    #[serde(default)]
    pub document_number: Option<String>,
    #[validate(custom(function = "validate_price"))]
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub employee_id: Option<Uuid>,
}

/// Item update command payload (also embedded in UPDATE suggestions)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Default)]
pub struct UpdatePropertyItemRequest {
    pub id: Uuid,
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    #[serde(default)]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub category: Option<String>,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub location: Option<String>,
    #[validate(custom(function = "validate_identifier"))]
    #[serde(default)]
    pub inventory_number: Option<String>,
    #[validate(custom(function = "validate_identifier"))]
    #[serde(default)]
    pub registration_number: Option<String>,
    #[validate(custom(function = "validate_identifier"))]
    #[serde(default)]
    pub serial_number: Option<String>,
    #[validate(custom(function = "validate_identifier"))]
    #[serde(default)]
    pub document_number: Option<String>,
    #[validate(custom(function = "validate_price"))]
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub employee_id: Option<Uuid>,
    #[serde(default)]
    pub unassign_employee: bool,
}

/// Filters for listing items
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ItemListQuery {
    pub employee_id: Option<Uuid>,
    pub scan_status: Option<ItemScanStatus>,
    pub search: Option<String>,
    /// Restrict to items assigned to the calling employee
    #[serde(default)]
    pub mine: bool,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
