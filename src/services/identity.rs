//! Caller identity resolution
//!
//! Turns the token-derived [`AuthUser`] into loaded entities and the tenant
//! scope (organization and property) an operation runs against.

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::{
    db::{AdminRepository, EmployeeRepository, OrganizationRepository, PropertyRepository},
    middleware::AuthUser,
    models::{AccountProfile, AccountRole, Admin, Employee, Organization, Property},
    utils::{AppError, AppResult},
};

/// A loaded caller account
#[derive(Debug, Clone)]
pub enum Actor {
    Admin(Admin),
    Employee(Employee),
}

impl Actor {
    pub fn id(&self) -> Uuid {
        match self {
            Actor::Admin(admin) => admin.id,
            Actor::Employee(employee) => employee.id,
        }
    }

    pub fn role(&self) -> AccountRole {
        match self {
            Actor::Admin(_) => AccountRole::Admin,
            Actor::Employee(_) => AccountRole::Employee,
        }
    }

    pub fn profile(&self) -> AccountProfile {
        match self {
            Actor::Admin(admin) => admin.into(),
            Actor::Employee(employee) => employee.into(),
        }
    }
}

/// Tenant scope of a property-level operation
#[derive(Debug, Clone)]
pub struct PropertyScope {
    pub actor: Actor,
    pub organization: Organization,
    pub property: Property,
}

impl PropertyScope {
    /// The admin owning the property, or Unauthorized for employees
    pub fn require_admin(&self) -> AppResult<&Admin> {
        match &self.actor {
            Actor::Admin(admin) => Ok(admin),
            Actor::Employee(_) => Err(AppError::unauthorized(
                "Only the organization admin may perform this operation",
            )),
        }
    }

    pub fn require_employee(&self) -> AppResult<&Employee> {
        match &self.actor {
            Actor::Employee(employee) => Ok(employee),
            Actor::Admin(_) => Err(AppError::unauthorized(
                "Only employees may perform this operation",
            )),
        }
    }
}

pub async fn load_admin(conn: &mut SqliteConnection, user: &AuthUser) -> AppResult<Admin> {
    if !user.is_admin() {
        return Err(AppError::unauthorized("Admin role required"));
    }
    AdminRepository::new(conn)
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))
}

pub async fn load_employee(conn: &mut SqliteConnection, user: &AuthUser) -> AppResult<Employee> {
    if !user.is_employee() {
        return Err(AppError::unauthorized("Employee role required"));
    }
    EmployeeRepository::new(conn)
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))
}

pub async fn load_actor(conn: &mut SqliteConnection, user: &AuthUser) -> AppResult<Actor> {
    match user.role {
        AccountRole::Admin => Ok(Actor::Admin(load_admin(conn, user).await?)),
        AccountRole::Employee => Ok(Actor::Employee(load_employee(conn, user).await?)),
    }
}

/// The caller admin and the organization they own
pub async fn admin_organization(
    conn: &mut SqliteConnection,
    user: &AuthUser,
) -> AppResult<(Admin, Organization)> {
    let admin = load_admin(&mut *conn, user).await?;
    let organization = OrganizationRepository::new(conn)
        .get_by_admin(admin.id)
        .await?
        .ok_or_else(|| AppError::bad_request("Admin does not own an organization"))?;
    Ok((admin, organization))
}

/// The caller (either role) and the organization they act within
pub async fn actor_organization(
    conn: &mut SqliteConnection,
    user: &AuthUser,
) -> AppResult<(Actor, Organization)> {
    let actor = load_actor(&mut *conn, user).await?;
    let organization = match &actor {
        Actor::Admin(admin) => OrganizationRepository::new(conn)
            .get_by_admin(admin.id)
            .await?
            .ok_or_else(|| AppError::bad_request("Admin does not own an organization"))?,
        Actor::Employee(employee) => {
            let organization_id = employee.organization_id.ok_or_else(|| {
                AppError::bad_request("Employee does not belong to an organization")
            })?;
            OrganizationRepository::new(conn)
                .get_by_id(organization_id)
                .await?
                .ok_or_else(|| AppError::not_found("Organization not found"))?
        }
    };
    Ok((actor, organization))
}

/// Resolve the property the caller acts on
pub async fn property_scope(
    conn: &mut SqliteConnection,
    user: &AuthUser,
) -> AppResult<PropertyScope> {
    let (actor, organization) = actor_organization(&mut *conn, user).await?;
    let property = PropertyRepository::new(conn)
        .get_by_organization(organization.id)
        .await?
        .ok_or_else(|| AppError::bad_request("Organization has no property"))?;
    Ok(PropertyScope {
        actor,
        organization,
        property,
    })
}

/// Property scope restricted to the owning admin
pub async fn admin_property_scope(
    conn: &mut SqliteConnection,
    user: &AuthUser,
) -> AppResult<PropertyScope> {
    if !user.is_admin() {
        return Err(AppError::unauthorized(
            "Only the organization admin may perform this operation",
        ));
    }
    property_scope(conn, user).await
}

/// Emails are unique across both account tables
pub async fn email_in_use(conn: &mut SqliteConnection, email: &str) -> AppResult<bool> {
    if AdminRepository::new(&mut *conn)
        .get_by_email(email)
        .await?
        .is_some()
    {
        return Ok(true);
    }
    Ok(EmployeeRepository::new(conn)
        .get_by_email(email)
        .await?
        .is_some())
}

/// Look an account up by email in either table
pub async fn find_account_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> AppResult<Option<Actor>> {
    if let Some(admin) = AdminRepository::new(&mut *conn).get_by_email(email).await? {
        return Ok(Some(Actor::Admin(admin)));
    }
    Ok(EmployeeRepository::new(conn)
        .get_by_email(email)
        .await?
        .map(Actor::Employee))
}

/// Load an account by id and role, as named by a token subject
pub async fn find_account(
    conn: &mut SqliteConnection,
    id: Uuid,
    role: AccountRole,
) -> AppResult<Option<Actor>> {
    Ok(match role {
        AccountRole::Admin => AdminRepository::new(conn)
            .get_by_id(id)
            .await?
            .map(Actor::Admin),
        AccountRole::Employee => EmployeeRepository::new(conn)
            .get_by_id(id)
            .await?
            .map(Actor::Employee),
    })
}

/// Persist an actor's account fields
pub async fn save_actor(conn: &mut SqliteConnection, actor: &Actor) -> AppResult<()> {
    let updated = match actor {
        Actor::Admin(admin) => AdminRepository::new(conn).update(admin).await?,
        Actor::Employee(employee) => EmployeeRepository::new(conn).update(employee).await?,
    };
    if !updated {
        return Err(AppError::not_found("Account not found"));
    }
    Ok(())
}
