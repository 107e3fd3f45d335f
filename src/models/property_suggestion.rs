//! Property suggestion model
//!
//! A suggestion is a batch of item changes proposed by an employee. The batch is
//! a tagged payload, stored as two columns (`request_type`, `request_body`) and
//! replayed through the item commands once an admin accepts it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::property_item::{CreatePropertyItemRequest, UpdatePropertyItemRequest};
use crate::utils::AppError;

/// Lifecycle of a suggestion. Pending is initial, the other two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Declined,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Approved => "approved",
            SuggestionStatus::Declined => "declined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SuggestionStatus::Pending),
            "approved" => Some(SuggestionStatus::Approved),
            "declined" => Some(SuggestionStatus::Declined),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        !matches!(self, SuggestionStatus::Pending)
    }
}

impl std::fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which item mutation a suggestion encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Create => "create",
            RequestType::Update => "update",
            RequestType::Delete => "delete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(RequestType::Create),
            "update" => Some(RequestType::Update),
            "delete" => Some(RequestType::Delete),
            _ => None,
        }
    }
}

/// The proposed change set.
///
/// On the wire: `{"request_type": "create", "request_body": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request_type", content = "request_body", rename_all = "snake_case")]
pub enum SuggestionPayload {
    Create(Vec<CreatePropertyItemRequest>),
    Update(Vec<UpdatePropertyItemRequest>),
    Delete(Vec<Uuid>),
}

#[derive(Validate)]
struct CreateBatch {
    #[validate(nested)]
    request_body: Vec<CreatePropertyItemRequest>,
}

#[derive(Validate)]
struct UpdateBatch {
    #[validate(nested)]
    request_body: Vec<UpdatePropertyItemRequest>,
}

impl SuggestionPayload {
    pub fn request_type(&self) -> RequestType {
        match self {
            SuggestionPayload::Create(_) => RequestType::Create,
            SuggestionPayload::Update(_) => RequestType::Update,
            SuggestionPayload::Delete(_) => RequestType::Delete,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SuggestionPayload::Create(items) => items.len(),
            SuggestionPayload::Update(items) => items.len(),
            SuggestionPayload::Delete(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check batch size and validate every entry with the item command rules
    pub fn validate_batch(&self, max_items: usize) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            let mut errors = ValidationErrors::new();
            let mut err = ValidationError::new("length");
            err.message = Some("must contain at least one entry".into());
            errors.add("request_body", err);
            return Err(errors);
        }
        if self.len() > max_items {
            let mut errors = ValidationErrors::new();
            let mut err = ValidationError::new("length");
            err.message = Some(format!("must contain at most {} entries", max_items).into());
            errors.add("request_body", err);
            return Err(errors);
        }

        match self {
            SuggestionPayload::Create(items) => CreateBatch {
                request_body: items.clone(),
            }
            .validate(),
            SuggestionPayload::Update(items) => UpdateBatch {
                request_body: items.clone(),
            }
            .validate(),
            SuggestionPayload::Delete(_) => Ok(()),
        }
    }

    /// Serialize the body alone, for the `request_body` column
    pub fn body_json(&self) -> Result<String, serde_json::Error> {
        match self {
            SuggestionPayload::Create(items) => serde_json::to_string(items),
            SuggestionPayload::Update(items) => serde_json::to_string(items),
            SuggestionPayload::Delete(ids) => serde_json::to_string(ids),
        }
    }

    /// Rebuild the payload from the stored columns
    pub fn from_parts(request_type: RequestType, body: &str) -> Result<Self, serde_json::Error> {
        Ok(match request_type {
            RequestType::Create => SuggestionPayload::Create(serde_json::from_str(body)?),
            RequestType::Update => SuggestionPayload::Update(serde_json::from_str(body)?),
            RequestType::Delete => SuggestionPayload::Delete(serde_json::from_str(body)?),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySuggestion {
    pub id: Uuid,
    pub property_id: Uuid,
    pub employee_id: Option<Uuid>,
    #[serde(flatten)]
    pub payload: SuggestionPayload,
    pub status: SuggestionStatus,
    pub feedback: Option<String>,
    /// Bumped on every status transition
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl PropertySuggestion {
    pub fn new(property_id: Uuid, employee_id: Uuid, payload: SuggestionPayload) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            property_id,
            employee_id: Some(employee_id),
            payload,
            status: SuggestionStatus::Pending,
            feedback: None,
            version: 0,
            created_at: now,
            last_updated_at: now,
        }
    }

    fn ensure_pending(&self) -> Result<(), AppError> {
        if self.status != SuggestionStatus::Pending {
            return Err(AppError::bad_request(format!(
                "Suggestion is already {}",
                self.status
            )));
        }
        Ok(())
    }

    pub fn approve(&mut self) -> Result<(), AppError> {
        self.ensure_pending()?;
        self.status = SuggestionStatus::Approved;
        self.last_updated_at = Utc::now();
        Ok(())
    }

    pub fn decline(&mut self, feedback: Option<String>) -> Result<(), AppError> {
        self.ensure_pending()?;
        self.status = SuggestionStatus::Declined;
        self.feedback = feedback;
        self.last_updated_at = Utc::now();
        Ok(())
    }

    pub fn is_proposed_by(&self, employee_id: Uuid) -> bool {
        self.employee_id == Some(employee_id)
    }

    /// Employees may withdraw their own suggestions until they are approved
    pub fn can_be_deleted_by_employee(&self, employee_id: Uuid) -> bool {
        self.is_proposed_by(employee_id) && self.status != SuggestionStatus::Approved
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeclineSuggestionRequest {
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SuggestionListQuery {
    pub status: Option<SuggestionStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
