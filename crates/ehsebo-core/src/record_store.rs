//! Ordered, id-keyed collection of budget records backed by key-value storage.
//!
//! The whole collection is encoded as one JSON array under a single key and
//! rewritten on every mutation. An in-memory mirror is kept alongside it and is
//! only replaced after the durable write succeeds, so a failed write leaves the
//! mirror as it was.
//!
//! The store starts Unloaded. Mutations made while Unloaded load first; if that
//! load fails the mutation fails with it and nothing is written, so an
//! unreadable medium is never overwritten with an empty collection.
//!
//! A storage call that exceeds `io_timeout` fails with `StorageUnavailable`
//! and returns the store to Unloaded, since the medium may still apply it.

use std::{collections::HashSet, future::Future, sync::Arc, time::Duration};

use ehsebo_domain::BudgetRecord;
use tokio::sync::Mutex;

use crate::{storage::KeyValueStorage, CoreError, Result};

/// Storage key the collection lives under.
pub const RECORDS_KEY: &str = "budget_records";

/// Tunables for a [`RecordStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub key: String,
    /// Upper bound for each call into the storage medium. `None` waits indefinitely.
    pub io_timeout: Option<Duration>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key: RECORDS_KEY.to_string(),
            io_timeout: None,
        }
    }
}

enum StoreState {
    Unloaded,
    Loaded(Vec<BudgetRecord>),
}

pub struct RecordStore {
    storage: Arc<dyn KeyValueStorage>,
    options: StoreOptions,
    state: Mutex<StoreState>,
}

impl RecordStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_options(storage, StoreOptions::default())
    }

    pub fn with_options(storage: Arc<dyn KeyValueStorage>, options: StoreOptions) -> Self {
        Self {
            storage,
            options,
            state: Mutex::new(StoreState::Unloaded),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Reads the persisted collection, in persisted order, and refreshes the mirror.
    ///
    /// On failure the mirror keeps whatever it held before.
    pub async fn load_all(&self) -> Result<Vec<BudgetRecord>> {
        let mut state = self.state.lock().await;
        let records = self.read_records().await?;
        *state = StoreState::Loaded(records.clone());
        Ok(records)
    }

    /// Replaces the record with the same id in place, or appends it.
    pub async fn upsert(&self, record: BudgetRecord) -> Result<BudgetRecord> {
        let mut state = self.state.lock().await;
        let mut next = self.loaded(&mut state).await?.clone();
        match next.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => next.push(record.clone()),
        }
        self.persist(&mut state, next).await?;
        Ok(record)
    }

    /// Removes the record with `id`. An absent id is a successful no-op.
    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.delete_many(&[id]).await
    }

    /// Removes every record whose id is listed, persisting once at the end.
    /// Ids that are not present are ignored.
    pub async fn delete_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<()> {
        let doomed: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
        let mut state = self.state.lock().await;
        let current = self.loaded(&mut state).await?;
        let next: Vec<BudgetRecord> = current
            .iter()
            .filter(|record| !doomed.contains(record.id.as_str()))
            .cloned()
            .collect();
        if next.len() == current.len() {
            return Ok(());
        }
        self.persist(&mut state, next).await
    }

    /// Looks `id` up in the mirror. Never reads storage; `None` while Unloaded.
    pub async fn find_by_id(&self, id: &str) -> Option<BudgetRecord> {
        match &*self.state.lock().await {
            StoreState::Loaded(records) => records.iter().find(|record| record.id == id).cloned(),
            StoreState::Unloaded => None,
        }
    }

    /// Snapshot of the mirror. Empty while Unloaded.
    pub async fn records(&self) -> Vec<BudgetRecord> {
        match &*self.state.lock().await {
            StoreState::Loaded(records) => records.clone(),
            StoreState::Unloaded => Vec::new(),
        }
    }

    pub async fn len(&self) -> usize {
        match &*self.state.lock().await {
            StoreState::Loaded(records) => records.len(),
            StoreState::Unloaded => 0,
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_loaded(&self) -> bool {
        matches!(&*self.state.lock().await, StoreState::Loaded(_))
    }

    /// Deletes the persisted collection entirely and leaves an empty, loaded mirror.
    pub async fn clear_all(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        match self.within_limit(self.storage.remove(&self.options.key)).await {
            Ok(result) => {
                result?;
                *state = StoreState::Loaded(Vec::new());
                Ok(())
            }
            Err(limit) => {
                *state = StoreState::Unloaded;
                Err(timed_out(limit))
            }
        }
    }

    async fn loaded<'a>(&self, state: &'a mut StoreState) -> Result<&'a Vec<BudgetRecord>> {
        if let StoreState::Unloaded = *state {
            *state = StoreState::Loaded(self.read_records().await?);
        }
        match &*state {
            StoreState::Loaded(records) => Ok(records),
            StoreState::Unloaded => Err(CoreError::StorageUnavailable(
                "record collection is not loaded".into(),
            )),
        }
    }

    async fn read_records(&self) -> Result<Vec<BudgetRecord>> {
        let raw = self.guarded(self.storage.read(&self.options.key)).await?;
        match raw {
            Some(data) if !data.trim().is_empty() => Ok(serde_json::from_str(&data)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Writes `records` and, on success, makes them the mirror.
    ///
    /// A plain failure leaves the mirror as it was. A timeout drops the
    /// mirror back to Unloaded: the abandoned write may still land, so the
    /// next operation rereads storage instead of trusting either version.
    async fn persist(&self, state: &mut StoreState, records: Vec<BudgetRecord>) -> Result<()> {
        let data = serde_json::to_string(&records)?;
        match self
            .within_limit(self.storage.write(&self.options.key, &data))
            .await
        {
            Ok(result) => {
                result?;
                *state = StoreState::Loaded(records);
                Ok(())
            }
            Err(limit) => {
                *state = StoreState::Unloaded;
                Err(timed_out(limit))
            }
        }
    }

    async fn guarded<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.within_limit(call).await.map_err(timed_out)?
    }

    /// Runs `call` under the configured timeout. `Err` carries the elapsed limit.
    async fn within_limit<T, F>(&self, call: F) -> std::result::Result<T, Duration>
    where
        F: Future<Output = T>,
    {
        match self.options.io_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| limit),
            None => Ok(call.await),
        }
    }
}

fn timed_out(limit: Duration) -> CoreError {
    CoreError::StorageUnavailable(format!("storage did not respond within {:?}", limit))
}
