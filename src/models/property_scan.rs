//! Property scan (audit campaign) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::validate_not_blank;
use crate::utils::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    InProgress,
    Completed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::InProgress => "in_progress",
            ScanStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(ScanStatus::InProgress),
            "completed" => Some(ScanStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyScan {
    pub id: Uuid,
    pub property_id: Uuid,
    pub name: String,
    pub status: ScanStatus,
    /// Item counts are frozen when the scan completes
    pub total_items: Option<i64>,
    pub scanned_items: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PropertyScan {
    pub fn new(property_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            property_id,
            name,
            status: ScanStatus::InProgress,
            total_items: None,
            scanned_items: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == ScanStatus::InProgress
    }

    pub fn complete(&mut self, total_items: i64, scanned_items: i64) -> Result<(), AppError> {
        if self.status == ScanStatus::Completed {
            return Err(AppError::bad_request("Scan is already completed"));
        }
        let now = Utc::now();
        self.status = ScanStatus::Completed;
        self.total_items = Some(total_items);
        self.scanned_items = Some(scanned_items);
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

/// Scan with its progress counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    #[serde(flatten)]
    pub scan: PropertyScan,
    pub total: i64,
    pub scanned: i64,
    pub remaining: i64,
}

impl ScanProgress {
    pub fn new(scan: PropertyScan, total: i64, scanned: i64) -> Self {
        Self {
            scan,
            total,
            scanned,
            remaining: (total - scanned).max(0),
        }
    }

    /// Use the frozen counters for completed scans, live counts otherwise
    pub fn from_scan(scan: PropertyScan, live_total: i64, live_scanned: i64) -> Self {
        match (scan.status, scan.total_items, scan.scanned_items) {
            (ScanStatus::Completed, Some(total), Some(scanned)) => Self::new(scan, total, scanned),
            _ => Self::new(scan, live_total, live_scanned),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateScanRequest {
    #[validate(length(min = 1, max = 120), custom(function = "validate_not_blank"))]
    pub name: String,
}
