use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeletionAction {
    SoftDelete,
    Restore,
}

/// What the service reported back for the update.
///
/// `NoVisibleRow` covers both "no such id" and "hidden by policy"; the
/// client has no way to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeletionOutcome {
    Applied { rows: usize },
    NoVisibleRow,
}

/// `deleted_at` is the instant written, set only when the soft delete applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionResult {
    pub table: String,
    pub record_id: String,
    pub action: DeletionAction,
    pub deleted_at: Option<DateTime<Utc>>,
    pub outcome: DeletionOutcome,
    pub status: u16,
}

impl DeletionResult {
    pub fn applied(&self) -> bool {
        matches!(self.outcome, DeletionOutcome::Applied { .. })
    }
}
