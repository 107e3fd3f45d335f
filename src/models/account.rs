//! Account models (admins and employees)
//!
//! Admins own at most one organization. Employees belong to at most one
//! organization. Both carry verification state and a password credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::AppError;

/// Account role carried in access tokens
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Admin,
    Employee,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Admin => "admin",
            AccountRole::Employee => "employee",
        }
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(AccountRole::Admin),
            "employee" => Ok(AccountRole::Employee),
            _ => Err(format!("Invalid account role: {}", s)),
        }
    }
}

/// Organization-owning account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    pub fn new(email: String, full_name: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            full_name,
            password_hash,
            is_verified: false,
            verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the account as verified. Verification happens once.
    pub fn verify(&mut self) -> Result<(), AppError> {
        if self.is_verified {
            return Err(AppError::bad_request("Account is already verified"));
        }
        let now = Utc::now();
        self.is_verified = true;
        self.verified_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

/// Organization-member account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn new(email: String, full_name: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id: None,
            email,
            full_name,
            password_hash,
            is_verified: false,
            verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn verify(&mut self) -> Result<(), AppError> {
        if self.is_verified {
            return Err(AppError::bad_request("Account is already verified"));
        }
        let now = Utc::now();
        self.is_verified = true;
        self.verified_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Join an organization. An employee belongs to at most one.
    pub fn assign_organization(&mut self, organization_id: Uuid) -> Result<(), AppError> {
        if self.organization_id.is_some() {
            return Err(AppError::bad_request(
                "Employee already belongs to an organization",
            ));
        }
        self.organization_id = Some(organization_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn leave_organization(&mut self) -> Result<Uuid, AppError> {
        let organization_id = self
            .organization_id
            .take()
            .ok_or_else(|| AppError::bad_request("Employee does not belong to an organization"))?;
        self.updated_at = Utc::now();
        Ok(organization_id)
    }

    pub fn belongs_to(&self, organization_id: Uuid) -> bool {
        self.organization_id == Some(organization_id)
    }
}

/// Public view of either account type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: Uuid,
    pub role: AccountRole,
    pub email: String,
    pub full_name: String,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<&Admin> for AccountProfile {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            role: AccountRole::Admin,
            email: admin.email.clone(),
            full_name: admin.full_name.clone(),
            is_verified: admin.is_verified,
            organization_id: None,
            created_at: admin.created_at,
        }
    }
}

impl From<&Employee> for AccountProfile {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            role: AccountRole::Employee,
            email: employee.email.clone(),
            full_name: employee.full_name.clone(),
            is_verified: employee.is_verified,
            organization_id: employee.organization_id,
            created_at: employee.created_at,
        }
    }
}
