use serde_json::Value;
use tracing::{debug, info};

use super::models::{ReadScope, TenantRecord};
use crate::core::error::{Result, TenantbaseError};
use crate::core::session::RequestContext;
use crate::db::ClientFactory;
use crate::utils::require_non_empty;
use crate::{DELETED_AT_COLUMN, ID_COLUMN};


/// Reads and writes tenant-scoped rows. Tenant isolation is left to the
/// service's policies; this type only forwards the caller's credential.
#[derive(Clone)]
pub struct RecordStore {
    factory: ClientFactory,
}

impl RecordStore {
    pub fn new(factory: ClientFactory) -> Self {
        Self { factory }
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        table: &str,
        scope: ReadScope,
        limit: Option<usize>,
    ) -> Result<Vec<TenantRecord>> {
        let client = self.factory.for_context(ctx);
        let mut query = client.table(table)?.select("*");
        if scope == ReadScope::LiveOnly {
            query = query.is_null(DELETED_AT_COLUMN);
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let records: Vec<TenantRecord> = query.execute().await?.into_rows()?;
        debug!(
            "Listed {} rows from {} (scope={:?}, mode={})",
            records.len(),
            table,
            scope,
            client.access_mode()
        );
        Ok(records)
    }


    pub async fn get(
        &self,
        ctx: &RequestContext,
        table: &str,
        record_id: &str,
    ) -> Result<Option<TenantRecord>> {
        require_non_empty("record id", record_id)?;
        let client = self.factory.for_context(ctx);
        let mut records: Vec<TenantRecord> = client
            .table(table)?
            .select("*")
            .eq(ID_COLUMN, record_id)
            .limit(1)
            .execute()
            .await?
            .into_rows()?;
        Ok(records.pop())
    }

    /// Inserts one object or an array of objects and returns what the service stored.
    pub async fn insert(
        &self,
        ctx: &RequestContext,
        table: &str,
        rows: Value,
    ) -> Result<Vec<TenantRecord>> {
        let is_rows = match &rows {
            Value::Object(_) => true,
            Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_object),
            _ => false,
        };
        if !is_rows {
            return Err(TenantbaseError::InvalidArgument(
                "insert expects an object or a non-empty array of objects".to_string(),
            ));
        }
        let client = self.factory.authenticated(ctx)?;
        let stored: Vec<TenantRecord> = client
            .table(table)?
            .insert(rows)
            .execute()
            .await?
            .into_rows()?;
        info!("Inserted {} rows into {}", stored.len(), table);
        Ok(stored)
    }


    pub async fn update(
        &self,
        ctx: &RequestContext,
        table: &str,
        record_id: &str,
        patch: Value,
    ) -> Result<Vec<TenantRecord>> {
        require_non_empty("record id", record_id)?;
        let Value::Object(fields) = &patch else {
            return Err(TenantbaseError::InvalidArgument("update patch must be an object".to_string()));
        };
        if fields.contains_key(ID_COLUMN) {
            return Err(TenantbaseError::InvalidArgument("update patch must not change the id".to_string()));
        }
        let client = self.factory.authenticated(ctx)?;
        let updated: Vec<TenantRecord> = client
            .table(table)?
            .update(patch)
            .eq(ID_COLUMN, record_id)
            .execute()
            .await?
            .into_rows()?;
        info!("Updated {} rows in {} (id={})", updated.len(), table, record_id);
        Ok(updated)
    }
}
