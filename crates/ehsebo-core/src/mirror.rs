//! Best-effort copy of saved records to a remote spreadsheet.
//!
//! Local persistence never depends on a mirror: callers run it after the local
//! write has succeeded and only report its failures.

use async_trait::async_trait;
use ehsebo_domain::BudgetRecord;

use crate::{CoreError, Result};

#[async_trait]
pub trait RecordMirror: Send + Sync {
    /// Appends or updates `record` remotely.
    async fn mirror(&self, record: &BudgetRecord) -> Result<()>;
    /// Removes the remote copy of `id`, if any.
    async fn remove(&self, id: &str) -> Result<()>;
}

/// Mirror used when no remote spreadsheet is connected. Every call reports
/// [`CoreError::MirrorUnavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMirror;

#[async_trait]
impl RecordMirror for DisabledMirror {
    async fn mirror(&self, record: &BudgetRecord) -> Result<()> {
        Err(CoreError::MirrorUnavailable(format!(
            "no spreadsheet connected; record {} kept locally",
            record.id
        )))
    }

    async fn remove(&self, id: &str) -> Result<()> {
        Err(CoreError::MirrorUnavailable(format!(
            "no spreadsheet connected; record {id} removed locally"
        )))
    }
}
