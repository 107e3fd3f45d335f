//! Scan campaigns
//!
//! At most one scan per property is in progress. Starting a scan resets every
//! item to `not_scanned`; completing it freezes the counters.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::{Command, HandlerContext, Query};
use crate::{
    config::AppConfig,
    db::{PropertyItemRepository, PropertyScanRepository},
    middleware::AuthUser,
    models::{
        CreateScanRequest, ItemScanStatus, PageQuery, Paginated, Pagination, PropertyItem,
        PropertyScan, ScanProgress,
    },
    services::identity,
    utils::{AppError, AppResult},
};

pub struct CreateScan {
    pub user: AuthUser,
    pub request: CreateScanRequest,
}

#[async_trait]
impl Command for CreateScan {
    type Output = ScanProgress;

    fn validate(&self, _config: &AppConfig) -> Result<(), ValidationErrors> {
        self.request.validate()
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<ScanProgress> {
        let scope = identity::admin_property_scope(&mut *ctx.conn, &self.user).await?;
        let property_id = scope.property.id;

        // The partial unique index backs this check under concurrency
        if PropertyScanRepository::new(&mut *ctx.conn)
            .get_in_progress(property_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                "Another scan is already in progress for this property",
            ));
        }

        let scan = PropertyScan::new(property_id, self.request.name.trim().to_string());
        PropertyScanRepository::new(&mut *ctx.conn)
            .create(&scan)
            .await?;

        let mut items = PropertyItemRepository::new(&mut *ctx.conn);
        let reset = items.reset_scan_status(property_id, Utc::now()).await?;
        let (total, scanned) = items.scan_counts(property_id).await?;

        info!(scan_id = %scan.id, %property_id, reset, "Scan started");
        Ok(ScanProgress::new(scan, total, scanned))
    }
}

/// Mark an item as present in the running scan
pub struct ScanItem {
    pub user: AuthUser,
    pub item_id: Uuid,
}

#[async_trait]
impl Command for ScanItem {
    type Output = PropertyItem;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<PropertyItem> {
        let scope = identity::property_scope(&mut *ctx.conn, &self.user).await?;
        let property_id = scope.property.id;

        let scan = PropertyScanRepository::new(&mut *ctx.conn)
            .get_in_progress(property_id)
            .await?
            .ok_or_else(|| AppError::bad_request("No scan is in progress"))?;

        let mut items = PropertyItemRepository::new(&mut *ctx.conn);
        let mut item = items
            .get(property_id, self.item_id)
            .await?
            .ok_or_else(|| AppError::not_found("Item not found"))?;
        if item.scan_status == ItemScanStatus::Scanned {
            return Err(AppError::conflict("Item was already scanned in this scan"));
        }

        item.mark_scanned();
        items.update(&item).await?;

        info!(scan_id = %scan.id, item_id = %item.id, "Item scanned");
        Ok(item)
    }
}

pub struct CompleteScan {
    pub user: AuthUser,
    pub scan_id: Uuid,
}

#[async_trait]
impl Command for CompleteScan {
    type Output = ScanProgress;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<ScanProgress> {
        let scope = identity::admin_property_scope(&mut *ctx.conn, &self.user).await?;
        let property_id = scope.property.id;

        let mut scans = PropertyScanRepository::new(&mut *ctx.conn);
        let mut scan = scans
            .get(property_id, self.scan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Scan not found"))?;

        let (total, scanned) = PropertyItemRepository::new(&mut *ctx.conn)
            .scan_counts(property_id)
            .await?;
        scan.complete(total, scanned)?;
        PropertyScanRepository::new(&mut *ctx.conn)
            .update(&scan)
            .await?;

        info!(scan_id = %scan.id, total, scanned, "Scan completed");
        Ok(ScanProgress::new(scan, total, scanned))
    }
}

pub struct GetScan {
    pub user: AuthUser,
    pub scan_id: Uuid,
}

#[async_trait]
impl Query for GetScan {
    type Output = ScanProgress;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<ScanProgress> {
        let scope = identity::property_scope(&mut *ctx.conn, &self.user).await?;
        let scan = PropertyScanRepository::new(&mut *ctx.conn)
            .get(scope.property.id, self.scan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Scan not found"))?;

        let (total, scanned) = PropertyItemRepository::new(&mut *ctx.conn)
            .scan_counts(scope.property.id)
            .await?;
        Ok(ScanProgress::from_scan(scan, total, scanned))
    }
}

pub struct ListScans {
    pub user: AuthUser,
    pub page: PageQuery,
}

#[async_trait]
impl Query for ListScans {
    type Output = Paginated<PropertyScan>;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Paginated<PropertyScan>> {
        let scope = identity::property_scope(&mut *ctx.conn, &self.user).await?;
        let pagination = Pagination::from(self.page);
        let (scans, total) = PropertyScanRepository::new(&mut *ctx.conn)
            .list(scope.property.id, pagination)
            .await?;
        Ok(Paginated::new(scans, total, pagination))
    }
}

pub struct DeleteScan {
    pub user: AuthUser,
    pub scan_id: Uuid,
}

#[async_trait]
impl Command for DeleteScan {
    type Output = ();

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<()> {
        let scope = identity::admin_property_scope(&mut *ctx.conn, &self.user).await?;
        if !PropertyScanRepository::new(&mut *ctx.conn)
            .delete(scope.property.id, self.scan_id)
            .await?
        {
            return Err(AppError::not_found("Scan not found"));
        }
        info!(scan_id = %self.scan_id, "Scan deleted");
        Ok(())
    }
}
