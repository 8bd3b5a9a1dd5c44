use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::models::{DeletionAction, DeletionOutcome, DeletionResult};
use crate::core::error::Result;
use crate::core::session::RequestContext;
use crate::db::ClientFactory;
use crate::utils::{require_non_empty, validate_identifier};
use crate::{DELETED_AT_COLUMN, ID_COLUMN};


/// Body of a soft-delete update: `{"deleted_at": "<RFC 3339 UTC>"}`.
pub fn soft_delete_payload(at: DateTime<Utc>) -> Value {
    json!({ DELETED_AT_COLUMN: at.to_rfc3339_opts(SecondsFormat::Micros, true) })
}


/// Marks the row as deleted by stamping `deleted_at` with the current UTC instant.
///
/// Goes through a freshly obtained client for `ctx`; the context must carry a
/// token. Policies on the service are expected to hide the row afterwards,
/// which this function does not check.
pub async fn soft_delete(
    factory: &ClientFactory,
    ctx: &RequestContext,
    table: &str,
    record_id: &str,
) -> Result<DeletionResult> {
    let deleted_at = Utc::now();
    set_deleted_at(
        factory,
        ctx,
        table,
        record_id,
        soft_delete_payload(deleted_at),
        Some(deleted_at),
        DeletionAction::SoftDelete,
    )
    .await
}


/// Clears `deleted_at`. Rows the policies already hide come back as `NoVisibleRow`.
///
/// Policies that hide deleted rows from reads usually hide them from updates
/// too; restoring such rows needs a role the policy lets through.
pub async fn restore(
    factory: &ClientFactory,
    ctx: &RequestContext,
    table: &str,
    record_id: &str,
) -> Result<DeletionResult> {
    set_deleted_at(
        factory,
        ctx,
        table,
        record_id,
        json!({ DELETED_AT_COLUMN: Value::Null }),
        None,
        DeletionAction::Restore,
    )
    .await
}

async fn set_deleted_at(
    factory: &ClientFactory,
    ctx: &RequestContext,
    table: &str,
    record_id: &str,
    payload: Value,
    deleted_at: Option<DateTime<Utc>>,
    action: DeletionAction,
) -> Result<DeletionResult> {
    validate_identifier("table", table)?;
    require_non_empty("record id", record_id)?;
    let client = factory.authenticated(ctx)?;

    debug!("Attempting {} on {} id={} (request={})", action, table, record_id, ctx.request_id());

    // the stamped row may already be hidden from reads, so ask for a count only
    let response = client
        .table(table)?
        .update(payload)
        .eq(ID_COLUMN, record_id)
        .return_minimal()
        .count_exact()
        .execute()
        .await?;

    let rows = match response.count {
        Some(total) => usize::try_from(total).unwrap_or(usize::MAX),
        None => response.row_count(),
    };
    let outcome = if rows == 0 {
        warn!("{} on {} id={} matched no visible row", action, table, record_id);
        DeletionOutcome::NoVisibleRow
    } else {
        info!("{} on {} id={} applied to {} rows", action, table, record_id, rows);
        DeletionOutcome::Applied { rows }
    };

    Ok(DeletionResult {
        table: table.to_string(),
        record_id: record_id.to_string(),
        action,
        deleted_at: deleted_at.filter(|_| rows > 0),
        outcome,
        status: response.status,
    })
}
