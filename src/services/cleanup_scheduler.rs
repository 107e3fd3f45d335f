//! Background cleanup of closed suggestions and expired invitations
//!
//! One task sweeps on a fixed interval until its cancellation token fires.
//! Each pass runs in its own transaction; a failed pass is logged and the
//! next one runs on schedule.

use std::time::Duration;

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::CleanupConfig;
use crate::db::{DbPool, InvitationRepository, PropertySuggestionRepository};

/// Rows removed by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub suggestions: u64,
    pub invitations: u64,
}

/// `now - days`, or an error when the window does not fit a timestamp
fn cutoff(now: DateTime<Utc>, days: i64) -> anyhow::Result<DateTime<Utc>> {
    chrono::Duration::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| anyhow!("{} days is out of range", days))
}

/// Run a single sweep in one transaction
pub async fn run_cleanup_pass(
    pool: &DbPool,
    config: &CleanupConfig,
) -> anyhow::Result<CleanupReport> {
    let now = Utc::now();
    let suggestion_cutoff = cutoff(now, config.suggestion_retention_days)
        .context("Invalid suggestion retention window")?;
    let invitation_cutoff = cutoff(now, config.invitation_expiry_days)
        .context("Invalid invitation expiry window")?;

    let mut tx = pool.begin().await?;
    let suggestions = PropertySuggestionRepository::new(&mut *tx)
        .delete_closed_before(suggestion_cutoff)
        .await?;
    let invitations = InvitationRepository::new(&mut *tx)
        .delete_created_before(invitation_cutoff)
        .await?;
    tx.commit().await?;

    Ok(CleanupReport {
        suggestions,
        invitations,
    })
}

/// Spawn the sweep loop. Cancel `shutdown` to stop it.
pub fn start_cleanup_scheduler(
    pool: DbPool,
    config: CleanupConfig,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        cleanup_task(pool, config, shutdown).await;
    })
}

async fn cleanup_task(pool: DbPool, config: CleanupConfig, shutdown: CancellationToken) {
    let period = Duration::from_secs(config.interval_secs.max(1));
    info!(
        "Cleanup task started (interval: {}s, suggestion retention: {}d, invitation expiry: {}d)",
        period.as_secs(),
        config.suggestion_retention_days,
        config.invitation_expiry_days
    );

    tokio::select! {
        _ = shutdown.cancelled() => {
            info!("Cleanup task stopping");
            return;
        }
        _ = tokio::time::sleep(Duration::from_secs(config.initial_delay_secs)) => {}
    }

    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Cleanup task stopping");
                break;
            }
            _ = timer.tick() => {}
        }

        debug!("Running cleanup pass");
        match run_cleanup_pass(&pool, &config).await {
            Ok(report) if report.suggestions > 0 || report.invitations > 0 => {
                info!(
                    suggestions = report.suggestions,
                    invitations = report.invitations,
                    "Cleaned up closed suggestions and expired invitations"
                );
            }
            Ok(_) => debug!("Nothing to clean up"),
            Err(e) => error!("Cleanup pass failed: {:#}", e),
        }
    }
}
