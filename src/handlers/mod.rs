//! Use-case handlers
//!
//! Every HTTP operation maps onto one [`Command`] (mutating) or [`Query`]
//! (read-only) object. The [`Mediator`] runs the shared pipeline:
//!
//! - commands: validation, then the handler inside one transaction that is
//!   committed on success and rolled back on any error
//! - queries: the handler on a pooled connection, no transaction

pub mod auth;
pub mod employees;
pub mod invitations;
pub mod organizations;
pub mod properties;
pub mod property_items;
pub mod property_scans;
pub mod property_suggestions;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqliteConnection;
use tracing::{debug, warn};
use validator::ValidationErrors;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::mailer::Mailer,
    utils::AppResult,
};

/// Dependencies available to a running handler
pub struct HandlerContext<'a> {
    pub conn: &'a mut SqliteConnection,
    pub config: &'a AppConfig,
    pub mailer: &'a dyn Mailer,
}

/// A state-changing use case
#[async_trait]
pub trait Command: Send {
    type Output: Send;

    /// Structural validation, run before any transaction is opened
    fn validate(&self, _config: &AppConfig) -> Result<(), ValidationErrors> {
        Ok(())
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Self::Output>;
}

/// A read-only use case
#[async_trait]
pub trait Query: Send {
    type Output: Send;

    fn validate(&self, _config: &AppConfig) -> Result<(), ValidationErrors> {
        Ok(())
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Self::Output>;
}

/// Dispatches commands and queries through the pipeline
#[derive(Clone)]
pub struct Mediator {
    pool: DbPool,
    config: Arc<AppConfig>,
    mailer: Arc<dyn Mailer>,
}

impl Mediator {
    pub fn new(pool: DbPool, config: Arc<AppConfig>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            pool,
            config,
            mailer,
        }
    }

    /// Validate, then run the command in its own transaction
    pub async fn send<C: Command>(&self, command: C) -> AppResult<C::Output> {
        let name = short_type_name::<C>();
        command.validate(&self.config)?;

        let mut tx = self.pool.begin().await?;
        let result = {
            let mut ctx = HandlerContext {
                conn: &mut *tx,
                config: &self.config,
                mailer: self.mailer.as_ref(),
            };
            command.handle(&mut ctx).await
        };

        match result {
            Ok(output) => {
                tx.commit().await?;
                debug!(command = name, "Command committed");
                Ok(output)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(command = name, error = %rollback_err, "Rollback failed");
                }
                debug!(command = name, error = %err, "Command rolled back");
                Err(err)
            }
        }
    }

    /// Validate, then run the query on a pooled connection
    pub async fn query<Q: Query>(&self, query: Q) -> AppResult<Q::Output> {
        query.validate(&self.config)?;

        let mut conn = self.pool.acquire().await?;
        let mut ctx = HandlerContext {
            conn: &mut *conn,
            config: &self.config,
            mailer: self.mailer.as_ref(),
        };
        query.handle(&mut ctx).await
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
