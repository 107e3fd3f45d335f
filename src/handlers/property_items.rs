//! Item commands and queries
//!
//! The batch functions [`create_items`], [`update_items`] and [`delete_items`]
//! are shared with suggestion acceptance, which replays an approved batch
//! through them on the same connection.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;
use validator::ValidationErrors;

use super::{Command, HandlerContext, Query};
use crate::{
    config::AppConfig,
    db::{EmployeeRepository, ItemFilter, PropertyItemRepository},
    middleware::AuthUser,
    models::{
        CreatePropertyItemRequest, ItemIdentifier, ItemListQuery, Paginated, Pagination, Property,
        PropertyItem, SuggestionPayload, UpdatePropertyItemRequest,
    },
    services::identity::{self, Actor},
    utils::{AppError, AppResult},
};

/// Assignees must be members of the property's organization
async fn ensure_assignable(
    conn: &mut SqliteConnection,
    property: &Property,
    employee_id: Option<Uuid>,
) -> AppResult<()> {
    let Some(employee_id) = employee_id else {
        return Ok(());
    };
    let employee = EmployeeRepository::new(conn).get_by_id(employee_id).await?;
    match employee {
        Some(employee) if employee.belongs_to(property.organization_id) => Ok(()),
        _ => Err(AppError::bad_request(format!(
            "Employee {} is not a member of this organization",
            employee_id
        ))),
    }
}

/// Every identifier of `item` must be free within the property.
///
/// Earlier entries of a batch are already written when later ones are
/// checked, so duplicates inside one batch are caught here too.
async fn ensure_identifiers_free(
    conn: &mut SqliteConnection,
    item: &PropertyItem,
    exclude_self: bool,
) -> AppResult<()> {
    let exclude = exclude_self.then_some(item.id);
    for identifier in ItemIdentifier::ALL {
        let Some(value) = item.identifier(identifier) else {
            continue;
        };
        let taken = PropertyItemRepository::new(&mut *conn)
            .identifier_taken(item.property_id, identifier, value, exclude)
            .await?;
        if taken {
            return Err(AppError::conflict(format!(
                "{} '{}' is already used in this property",
                identifier.label(),
                value
            )));
        }
    }
    Ok(())
}

pub async fn create_items(
    conn: &mut SqliteConnection,
    property: &Property,
    requests: &[CreatePropertyItemRequest],
) -> AppResult<Vec<PropertyItem>> {
    let mut created = Vec::with_capacity(requests.len());
    for request in requests {
        ensure_assignable(&mut *conn, property, request.employee_id).await?;

        let item = PropertyItem::from_request(property.id, request);
        ensure_identifiers_free(&mut *conn, &item, false).await?;
        PropertyItemRepository::new(&mut *conn).create(&item).await?;
        created.push(item);
    }
    Ok(created)
}

pub async fn update_items(
    conn: &mut SqliteConnection,
    property: &Property,
    requests: &[UpdatePropertyItemRequest],
) -> AppResult<Vec<PropertyItem>> {
    let mut updated = Vec::with_capacity(requests.len());
    for request in requests {
        let mut item = PropertyItemRepository::new(&mut *conn)
            .get(property.id, request.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Item {} not found", request.id)))?;

        if !request.unassign_employee {
            ensure_assignable(&mut *conn, property, request.employee_id).await?;
        }
        item.apply(request);
        ensure_identifiers_free(&mut *conn, &item, true).await?;

        if !PropertyItemRepository::new(&mut *conn).update(&item).await? {
            return Err(AppError::not_found(format!("Item {} not found", item.id)));
        }
        updated.push(item);
    }
    Ok(updated)
}

pub async fn delete_items(
    conn: &mut SqliteConnection,
    property: &Property,
    ids: &[Uuid],
) -> AppResult<u64> {
    let mut deleted = 0;
    for id in ids {
        if !PropertyItemRepository::new(&mut *conn)
            .delete(property.id, *id)
            .await?
        {
            return Err(AppError::not_found(format!("Item {} not found", id)));
        }
        deleted += 1;
    }
    Ok(deleted)
}

pub struct CreateItems {
    pub user: AuthUser,
    pub items: Vec<CreatePropertyItemRequest>,
}

#[async_trait]
impl Command for CreateItems {
    type Output = Vec<PropertyItem>;

    fn validate(&self, config: &AppConfig) -> Result<(), ValidationErrors> {
        SuggestionPayload::Create(self.items.clone())
            .validate_batch(config.suggestions.max_items_per_request)
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Vec<PropertyItem>> {
        let scope = identity::admin_property_scope(&mut *ctx.conn, &self.user).await?;
        let items = create_items(&mut *ctx.conn, &scope.property, &self.items).await?;
        info!(property_id = %scope.property.id, count = items.len(), "Items created");
        Ok(items)
    }
}

pub struct UpdateItems {
    pub user: AuthUser,
    pub items: Vec<UpdatePropertyItemRequest>,
}

#[async_trait]
impl Command for UpdateItems {
    type Output = Vec<PropertyItem>;

    fn validate(&self, config: &AppConfig) -> Result<(), ValidationErrors> {
        SuggestionPayload::Update(self.items.clone())
            .validate_batch(config.suggestions.max_items_per_request)
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Vec<PropertyItem>> {
        let scope = identity::admin_property_scope(&mut *ctx.conn, &self.user).await?;
        let items = update_items(&mut *ctx.conn, &scope.property, &self.items).await?;
        info!(property_id = %scope.property.id, count = items.len(), "Items updated");
        Ok(items)
    }
}

pub struct DeleteItems {
    pub user: AuthUser,
    pub ids: Vec<Uuid>,
}

#[async_trait]
impl Command for DeleteItems {
    type Output = u64;

    fn validate(&self, config: &AppConfig) -> Result<(), ValidationErrors> {
        SuggestionPayload::Delete(self.ids.clone())
            .validate_batch(config.suggestions.max_items_per_request)
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<u64> {
        let scope = identity::admin_property_scope(&mut *ctx.conn, &self.user).await?;
        let deleted = delete_items(&mut *ctx.conn, &scope.property, &self.ids).await?;
        info!(property_id = %scope.property.id, deleted, "Items deleted");
        Ok(deleted)
    }
}

pub struct GetItem {
    pub user: AuthUser,
    pub item_id: Uuid,
}

#[async_trait]
impl Query for GetItem {
    type Output = PropertyItem;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<PropertyItem> {
        let scope = identity::property_scope(&mut *ctx.conn, &self.user).await?;
        PropertyItemRepository::new(&mut *ctx.conn)
            .get(scope.property.id, self.item_id)
            .await?
            .ok_or_else(|| AppError::not_found("Item not found"))
    }
}

pub struct ListItems {
    pub user: AuthUser,
    pub query: ItemListQuery,
}

#[async_trait]
impl Query for ListItems {
    type Output = Paginated<PropertyItem>;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Paginated<PropertyItem>> {
        let scope = identity::property_scope(&mut *ctx.conn, &self.user).await?;

        let employee_id = match (&scope.actor, self.query.mine) {
            (Actor::Employee(employee), true) => Some(employee.id),
            (Actor::Admin(_), true) => {
                return Err(AppError::bad_request(
                    "The mine filter is only available to employees",
                ))
            }
            (_, false) => self.query.employee_id,
        };
        let filter = ItemFilter {
            employee_id,
            scan_status: self.query.scan_status,
            search: self
                .query
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        };
        let pagination = Pagination::new(self.query.page, self.query.page_size);

        let (items, total) = PropertyItemRepository::new(&mut *ctx.conn)
            .list(scope.property.id, &filter, pagination)
            .await?;
        Ok(Paginated::new(items, total, pagination))
    }
}
