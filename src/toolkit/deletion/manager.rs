use tracing::info;

use super::models::{DeletionAction, DeletionOutcome, DeletionResult};
use super::soft::{restore, soft_delete};
use crate::core::error::{Result, TenantbaseError};
use crate::core::session::RequestContext;
use crate::db::ClientFactory;


pub struct DeletionManager {
    factory: ClientFactory,
}

impl DeletionManager {
    pub fn new(factory: ClientFactory) -> Self {
        info!("Initializing DeletionManager");
        Self { factory }
    }


    pub async fn soft_delete(
        &self,
        ctx: &RequestContext,
        table: &str,
        record_id: &str,
    ) -> Result<DeletionResult> {
        soft_delete(&self.factory, ctx, table, record_id).await
    }

    /// Same as [`soft_delete`](Self::soft_delete) but fails when no row came back.
    pub async fn soft_delete_strict(
        &self,
        ctx: &RequestContext,
        table: &str,
        record_id: &str,
    ) -> Result<DeletionResult> {
        require_applied(self.soft_delete(ctx, table, record_id).await?)
    }


    pub async fn restore(
        &self,
        ctx: &RequestContext,
        table: &str,
        record_id: &str,
    ) -> Result<DeletionResult> {
        restore(&self.factory, ctx, table, record_id).await
    }


    pub async fn apply(
        &self,
        ctx: &RequestContext,
        table: &str,
        record_id: &str,
        action: DeletionAction,
    ) -> Result<DeletionResult> {
        match action {
            DeletionAction::SoftDelete => self.soft_delete(ctx, table, record_id).await,
            DeletionAction::Restore => self.restore(ctx, table, record_id).await,
        }
    }
}

fn require_applied(result: DeletionResult) -> Result<DeletionResult> {
    match result.outcome {
        DeletionOutcome::Applied { .. } => Ok(result),
        DeletionOutcome::NoVisibleRow => Err(TenantbaseError::RecordNotVisible {
            table: result.table,
            record_id: result.record_id,
        }),
    }
}
