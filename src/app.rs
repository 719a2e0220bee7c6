//! Composition root: owns storage, the record store, the rate service, the
//! session store and the remote mirror, and runs the save/edit/delete flows.

use std::sync::Arc;

use chrono::Duration;
use ehsebo_config::AppConfig;
use ehsebo_core::{
    Clock, CoreError, DisabledMirror, ExchangeRateService, KeyValueStorage, RateProvider,
    RateQuote, RecordMirror, RecordStore, SelectionState, Session, SessionStore, SessionUser,
    StoreOptions, SystemClock,
};
use ehsebo_domain::{format_amount, new_record_id, BudgetFormData, BudgetRecord, BudgetSummary};
use ehsebo_storage_json::JsonFileStorage;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::{AppError, AppResult};

/// Subdirectory of the data dir holding the key-value files.
const STORE_DIR: &str = "store";

pub struct BudgetApp {
    config: AppConfig,
    storage: Arc<dyn KeyValueStorage>,
    store: RecordStore,
    rates: ExchangeRateService,
    sessions: SessionStore,
    mirror: Arc<dyn RecordMirror>,
    clock: Arc<dyn Clock>,
    runtime: Option<Handle>,
}

impl BudgetApp {
    /// Opens file-backed storage under the configured data directory.
    pub async fn open(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let root = config.resolve_data_dir().join(STORE_DIR);
        let storage = JsonFileStorage::open(root).await?;
        info!(path = %storage.root().display(), "opened budget storage");
        Self::with_storage(config, Arc::new(storage))
    }

    pub fn with_storage(config: AppConfig, storage: Arc<dyn KeyValueStorage>) -> AppResult<Self> {
        Self::with_clock(config, storage, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: AppConfig,
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        config.validate()?;
        let store = RecordStore::with_options(
            storage.clone(),
            StoreOptions {
                io_timeout: config.storage_timeout(),
                ..StoreOptions::default()
            },
        );
        let rates = ExchangeRateService::new(storage.clone(), clock.clone())
            .with_defaults(config.exchange_rate.mode, config.exchange_rate.manual_rate()?);
        let sessions = SessionStore::with_lifetime(
            storage.clone(),
            clock.clone(),
            Duration::days(i64::from(config.session_days)),
        );
        Ok(Self {
            config,
            storage,
            store,
            rates,
            sessions,
            mirror: Arc::new(DisabledMirror),
            clock,
            runtime: Handle::try_current().ok(),
        })
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn RecordMirror>) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_rate_provider(self, provider: Arc<dyn RateProvider>) -> Self {
        Self {
            rates: self.rates.with_provider(provider),
            ..self
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn rates(&self) -> &ExchangeRateService {
        &self.rates
    }

    /// Validates the form, stores a new record and hands a copy to the mirror.
    pub async fn save_budget(
        &self,
        name: &str,
        form: BudgetFormData,
        user_id: &str,
    ) -> AppResult<BudgetRecord> {
        let name = validate_budget(name, &form)?;
        let record =
            BudgetRecord::from_form(new_record_id(), name, form, user_id, self.clock.now());
        let saved = self.store.upsert(record).await.inspect_err(log_store_failure)?;
        info!(id = %saved.id, remaining = saved.remaining, "saved budget");
        self.spawn_mirror(saved.clone());
        Ok(saved)
    }

    /// Replaces an existing record's name and amounts, keeping its id,
    /// owner and creation time.
    pub async fn update_budget(
        &self,
        id: &str,
        name: &str,
        form: BudgetFormData,
    ) -> AppResult<BudgetRecord> {
        let name = validate_budget(name, &form)?;
        self.ensure_loaded().await?;
        let existing = self
            .store
            .find_by_id(id)
            .await
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let revised = existing.revise(name, form, self.clock.now());
        let saved = self.store.upsert(revised).await.inspect_err(log_store_failure)?;
        info!(id = %saved.id, "updated budget");
        self.spawn_mirror(saved.clone());
        Ok(saved)
    }

    /// Deletes one record. Unknown ids are not an error.
    pub async fn delete_budget(&self, id: &str) -> AppResult<()> {
        self.store.delete_by_id(id).await.inspect_err(log_store_failure)?;
        info!(%id, "deleted budget");
        self.spawn_mirror_removal(vec![id.to_string()]);
        Ok(())
    }

    /// Deletes every selected record in one write and clears the selection.
    /// Returns the number of records removed.
    pub async fn delete_selected(&self, selection: &mut SelectionState) -> AppResult<usize> {
        if selection.is_empty() {
            return Ok(0);
        }
        let records = self.store.load_all().await.inspect_err(log_store_failure)?;
        let ids = selection.ids_in_order(&records);
        self.store.delete_many(ids.as_slice()).await.inspect_err(log_store_failure)?;
        selection.clear();
        let removed = ids.len();
        info!(count = removed, "deleted selected budgets");
        self.spawn_mirror_removal(ids);
        Ok(removed)
    }

    pub async fn records(&self) -> AppResult<Vec<BudgetRecord>> {
        Ok(self.store.load_all().await.inspect_err(log_store_failure)?)
    }

    /// Records owned by `user_id`, in stored order.
    pub async fn records_for_user(&self, user_id: &str) -> AppResult<Vec<BudgetRecord>> {
        let mut records = self.records().await?;
        records.retain(|record| record.user_id == user_id);
        Ok(records)
    }

    pub async fn summary(&self, user_id: &str) -> AppResult<BudgetSummary> {
        let records = self.records_for_user(user_id).await?;
        Ok(BudgetSummary::from_records(&records))
    }

    pub async fn current_rate(&self) -> AppResult<RateQuote> {
        Ok(self.rates.current_rate().await?)
    }

    /// A record's remaining balance in the secondary currency at today's rate.
    pub async fn remaining_in_secondary(&self, record: &BudgetRecord) -> AppResult<f64> {
        let quote = self.current_rate().await?;
        Ok(quote.rate.to_secondary(record.remaining))
    }

    /// Formats a base amount in both configured currencies.
    pub async fn format_dual(&self, base_amount: f64) -> AppResult<(String, String)> {
        let quote = self.current_rate().await?;
        Ok((
            format_amount(base_amount, self.config.base_currency),
            format_amount(
                quote.rate.to_secondary(base_amount),
                self.config.secondary_currency,
            ),
        ))
    }

    pub async fn sign_in(&self, user: SessionUser) -> AppResult<Session> {
        let session = self.sessions.save(user).await?;
        info!(user = %session.user.id, "signed in");
        Ok(session)
    }

    pub async fn restore_session(&self) -> AppResult<Option<SessionUser>> {
        Ok(self.sessions.restore().await?)
    }

    pub async fn refresh_session(&self) -> AppResult<Option<Session>> {
        Ok(self.sessions.refresh().await?)
    }

    pub async fn sign_out(&self) -> AppResult<()> {
        self.sessions.clear().await?;
        info!("signed out");
        Ok(())
    }

    /// Signs out and removes every locally stored record.
    pub async fn sign_out_and_wipe(&self) -> AppResult<()> {
        self.sessions.clear().await?;
        self.store.clear_all().await.inspect_err(log_store_failure)?;
        info!("signed out and wiped local records");
        Ok(())
    }

    async fn ensure_loaded(&self) -> AppResult<()> {
        if !self.store.is_loaded().await {
            self.store.load_all().await.inspect_err(log_store_failure)?;
        }
        Ok(())
    }

    fn spawn_mirror(&self, record: BudgetRecord) {
        let Some(runtime) = self.runtime() else {
            warn!(id = %record.id, "no tokio runtime; record not mirrored");
            return;
        };
        let mirror = self.mirror.clone();
        runtime.spawn(async move {
            if let Err(err) = mirror.mirror(&record).await {
                log_mirror_failure(&record.id, &err);
            }
        });
    }

    fn spawn_mirror_removal(&self, ids: Vec<String>) {
        if ids.is_empty() {
            return;
        }
        let Some(runtime) = self.runtime() else {
            warn!(count = ids.len(), "no tokio runtime; removals not mirrored");
            return;
        };
        let mirror = self.mirror.clone();
        runtime.spawn(async move {
            for id in ids {
                if let Err(err) = mirror.remove(&id).await {
                    log_mirror_failure(&id, &err);
                }
            }
        });
    }

    /// The runtime the app was built in, else the caller's current one.
    fn runtime(&self) -> Option<Handle> {
        self.runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
    }
}

/// Checks a form before it reaches the store and returns the trimmed name.
pub fn validate_budget<'a>(name: &'a str, form: &BudgetFormData) -> Result<&'a str, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("budget name is required".into()));
    }
    if !form.is_finite() {
        return Err(CoreError::Validation("amounts must be finite numbers".into()));
    }
    if form.total_budget == 0.0 {
        return Err(CoreError::Validation("total budget must not be zero".into()));
    }
    Ok(name)
}

fn log_store_failure(err: &CoreError) {
    warn!(error = %err, "budget store operation failed");
}

fn log_mirror_failure(id: &str, err: &CoreError) {
    match err {
        CoreError::MirrorUnavailable(_) => debug!(%id, error = %err, "mirror skipped"),
        _ => warn!(%id, error = %err, "mirror failed"),
    }
}
