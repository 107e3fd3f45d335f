//! Organization membership

use async_trait::async_trait;
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

use super::{Command, HandlerContext, Query};
use crate::{
    db::{EmployeeRepository, PropertyItemRepository, PropertyRepository},
    middleware::AuthUser,
    models::{AccountProfile, Employee, PageQuery, Paginated, Pagination},
    services::identity,
    utils::{AppError, AppResult},
};

/// Detach an employee and clear their item assignments in the property
async fn detach(conn: &mut SqliteConnection, employee: &mut Employee) -> AppResult<Uuid> {
    let organization_id = employee.leave_organization()?;
    EmployeeRepository::new(&mut *conn).update(employee).await?;

    let property = PropertyRepository::new(&mut *conn)
        .get_by_organization(organization_id)
        .await?;
    if let Some(property) = property {
        let unassigned = PropertyItemRepository::new(&mut *conn)
            .unassign_employee(property.id, employee.id)
            .await?;
        info!(employee_id = %employee.id, unassigned, "Cleared item assignments");
    }
    Ok(organization_id)
}

pub struct ListEmployees {
    pub user: AuthUser,
    pub page: PageQuery,
}

#[async_trait]
impl Query for ListEmployees {
    type Output = Paginated<AccountProfile>;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Paginated<AccountProfile>> {
        let (_, organization) = identity::admin_organization(&mut *ctx.conn, &self.user).await?;
        let pagination = Pagination::from(self.page);

        let (employees, total) = EmployeeRepository::new(&mut *ctx.conn)
            .list_by_organization(organization.id, pagination)
            .await?;
        Ok(Paginated::new(employees, total, pagination).map(|e| AccountProfile::from(&e)))
    }
}

pub struct RemoveEmployee {
    pub user: AuthUser,
    pub employee_id: Uuid,
}

#[async_trait]
impl Command for RemoveEmployee {
    type Output = ();

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<()> {
        let (_, organization) = identity::admin_organization(&mut *ctx.conn, &self.user).await?;
        let mut employee = EmployeeRepository::new(&mut *ctx.conn)
            .get_by_id(self.employee_id)
            .await?
            .filter(|employee| employee.belongs_to(organization.id))
            .ok_or_else(|| AppError::not_found("Employee not found in this organization"))?;

        detach(&mut *ctx.conn, &mut employee).await?;
        info!(employee_id = %employee.id, organization_id = %organization.id, "Employee removed");
        Ok(())
    }
}

pub struct LeaveOrganization {
    pub user: AuthUser,
}

#[async_trait]
impl Command for LeaveOrganization {
    type Output = AccountProfile;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<AccountProfile> {
        let mut employee = identity::load_employee(&mut *ctx.conn, &self.user).await?;
        let organization_id = detach(&mut *ctx.conn, &mut employee).await?;

        info!(employee_id = %employee.id, %organization_id, "Employee left organization");
        Ok(AccountProfile::from(&employee))
    }
}
