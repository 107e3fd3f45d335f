//! Organization (tenant) model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::validate_not_blank;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(admin_id: Uuid, name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            admin_id,
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, admin_id: Uuid) -> bool {
        self.admin_id == admin_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 120), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, max = 120), custom(function = "validate_not_blank"))]
    #[serde(default)]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub description: Option<String>,
}

/// Pending invite of an employee into an organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationInvitation {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub employee_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl OrganizationInvitation {
    pub fn new(organization_id: Uuid, employee_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            employee_id,
            created_at: Utc::now(),
        }
    }

    pub fn expires_at(&self, expiry_days: i64) -> DateTime<Utc> {
        invitation_expires_at(self.created_at, expiry_days)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, expiry_days: i64) -> bool {
        now >= self.expires_at(expiry_days)
    }
}

/// Saturates at the latest representable time instead of overflowing
pub fn invitation_expires_at(created_at: DateTime<Utc>, expiry_days: i64) -> DateTime<Utc> {
    Duration::try_days(expiry_days)
        .and_then(|window| created_at.checked_add_signed(window))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Invitation joined with the names a client needs to display it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationView {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub organization_name: String,
    pub employee_id: Uuid,
    pub employee_email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InviteEmployeeRequest {
    #[validate(email)]
    pub email: String,
}
