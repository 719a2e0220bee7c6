//! Exchange rate between the base and secondary currency.
//!
//! One rate is stored (secondary units per base unit) and inverted for the
//! opposite direction. In automatic mode the rate comes from a [`RateProvider`]
//! at most once per UTC calendar day; the fetched value is cached in storage and
//! reused until the day changes or a refresh is forced.

use std::{fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use ehsebo_domain::{convert_base_to_secondary, convert_secondary_to_base, DEFAULT_RATE};
use serde::{Deserialize, Serialize};

use crate::{storage::KeyValueStorage, time::Clock, CoreError, Result};

pub const RATE_KEY: &str = "exchange_rate";
pub const RATE_MODE_KEY: &str = "exchange_rate_mode";
pub const CACHED_RATE_KEY: &str = "cached_exchange_rate";
pub const LAST_FETCH_KEY: &str = "last_rate_fetch_date";

/// A validated, strictly positive and finite exchange rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ExchangeRate(f64);

impl ExchangeRate {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(CoreError::Validation(format!(
                "exchange rate must be a positive number, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Base units per secondary unit.
    pub fn inverse(self) -> f64 {
        1.0 / self.0
    }

    pub fn to_secondary(self, base_amount: f64) -> f64 {
        convert_base_to_secondary(base_amount, self.0)
    }

    pub fn to_base(self, secondary_amount: f64) -> f64 {
        convert_secondary_to_base(secondary_amount, self.0)
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self(DEFAULT_RATE)
    }
}

impl TryFrom<f64> for ExchangeRate {
    type Error = CoreError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ExchangeRate> for f64 {
    fn from(rate: ExchangeRate) -> Self {
        rate.0
    }
}

impl FromStr for ExchangeRate {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self> {
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| CoreError::Validation(format!("`{raw}` is not a number")))?;
        Self::new(value)
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the effective rate comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateMode {
    Manual,
    #[default]
    Automatic,
}

impl RateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RateMode::Manual => "manual",
            RateMode::Automatic => "automatic",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "manual" => Some(RateMode::Manual),
            "automatic" => Some(RateMode::Automatic),
            _ => None,
        }
    }
}

impl fmt::Display for RateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes how a quoted rate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    /// The user-entered rate (manual mode).
    Manual,
    /// Today's cached automatic rate.
    Cached,
    /// Freshly fetched from the provider.
    Fetched,
    /// The provider failed or is absent; the best stored value was used.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateQuote {
    pub rate: ExchangeRate,
    pub source: RateSource,
}

/// Supplies the current market rate (secondary units per base unit).
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rate(&self) -> Result<f64>;
}

pub struct ExchangeRateService {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    provider: Option<Arc<dyn RateProvider>>,
    default_mode: RateMode,
    default_rate: ExchangeRate,
}

impl ExchangeRateService {
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            provider: None,
            default_mode: RateMode::default(),
            default_rate: ExchangeRate::default(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn RateProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Mode and rate used when storage holds nothing yet.
    pub fn with_defaults(mut self, mode: RateMode, rate: ExchangeRate) -> Self {
        self.default_mode = mode;
        self.default_rate = rate;
        self
    }

    pub async fn mode(&self) -> Result<RateMode> {
        let stored = self.storage.read(RATE_MODE_KEY).await?;
        Ok(stored
            .as_deref()
            .and_then(RateMode::parse)
            .unwrap_or(self.default_mode))
    }

    pub async fn set_mode(&self, mode: RateMode) -> Result<()> {
        self.storage.write(RATE_MODE_KEY, mode.as_str()).await
    }

    /// The user-entered rate, or the default when none is stored or it is unreadable.
    pub async fn manual_rate(&self) -> Result<ExchangeRate> {
        Ok(self
            .stored_rate(RATE_KEY)
            .await?
            .unwrap_or(self.default_rate))
    }

    /// Validates and stores a user-entered rate. Invalid rates are rejected
    /// before anything is written.
    pub async fn set_rate(&self, value: f64) -> Result<ExchangeRate> {
        let rate = ExchangeRate::new(value)?;
        self.storage.write(RATE_KEY, &rate.to_string()).await?;
        Ok(rate)
    }

    /// The effective rate for the configured mode.
    pub async fn current_rate(&self) -> Result<RateQuote> {
        match self.mode().await? {
            RateMode::Manual => Ok(RateQuote {
                rate: self.manual_rate().await?,
                source: RateSource::Manual,
            }),
            RateMode::Automatic => self.automatic_rate().await,
        }
    }

    /// Today's automatic rate, fetching when the cache is from another day.
    pub async fn automatic_rate(&self) -> Result<RateQuote> {
        let today = self.clock.today().to_string();
        let last_fetch = self.storage.read(LAST_FETCH_KEY).await?;
        if last_fetch.as_deref() == Some(today.as_str()) {
            if let Some(rate) = self.stored_rate(CACHED_RATE_KEY).await? {
                return Ok(RateQuote {
                    rate,
                    source: RateSource::Cached,
                });
            }
        }
        match self.fetch().await {
            Ok(rate) => {
                self.cache(rate, &today).await;
                Ok(RateQuote {
                    rate,
                    source: RateSource::Fetched,
                })
            }
            Err(_) => self.fallback().await,
        }
    }

    /// Forgets today's fetch and asks the provider again.
    pub async fn refresh(&self) -> Result<RateQuote> {
        self.storage.remove(LAST_FETCH_KEY).await?;
        self.automatic_rate().await
    }

    async fn fetch(&self) -> Result<ExchangeRate> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| CoreError::RateProvider("no rate provider configured".into()))?;
        let value = provider.fetch_rate().await?;
        ExchangeRate::new(value)
            .map_err(|_| CoreError::RateProvider(format!("provider returned invalid rate {value}")))
    }

    /// Best effort: a fetched rate is returned even when caching it fails.
    /// The fetch date is only recorded once the rate itself is stored.
    async fn cache(&self, rate: ExchangeRate, today: &str) {
        if self
            .storage
            .write(CACHED_RATE_KEY, &rate.to_string())
            .await
            .is_ok()
        {
            let _ = self.storage.write(LAST_FETCH_KEY, today).await;
        }
    }

    async fn fallback(&self) -> Result<RateQuote> {
        let rate = match self.stored_rate(CACHED_RATE_KEY).await? {
            Some(rate) => rate,
            None => self.manual_rate().await?,
        };
        Ok(RateQuote {
            rate,
            source: RateSource::Fallback,
        })
    }

    async fn stored_rate(&self, key: &str) -> Result<Option<ExchangeRate>> {
        let stored = self.storage.read(key).await?;
        Ok(stored.and_then(|raw| raw.parse::<ExchangeRate>().ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{storage::MemoryStorage, time::FixedClock};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedProvider {
        answers: Mutex<Vec<Result<f64>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(answers: Vec<Result<f64>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for ScriptedProvider {
        async fn fetch_rate(&self) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                return Err(CoreError::RateProvider("script exhausted".into()));
            }
            answers.remove(0)
        }
    }

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn rejects_non_positive_and_non_finite_rates() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(ExchangeRate::new(bad), Err(CoreError::Validation(_))));
        }
        assert!("abc".parse::<ExchangeRate>().is_err());
        assert_eq!("92.5".parse::<ExchangeRate>().unwrap().value(), 92.5);
    }

    #[test]
    fn single_rate_converts_both_directions() {
        let rate = ExchangeRate::new(100.0).unwrap();
        assert_eq!(rate.to_secondary(3.0), 300.0);
        assert_eq!(rate.to_base(300.0), 3.0);
        assert_eq!(rate.inverse(), 0.01);
    }

    #[tokio::test]
    async fn manual_mode_uses_the_stored_rate() {
        let storage = Arc::new(MemoryStorage::new());
        let service = ExchangeRateService::new(storage.clone(), clock());
        service.set_mode(RateMode::Manual).await.unwrap();
        assert_eq!(service.manual_rate().await.unwrap().value(), DEFAULT_RATE);

        service.set_rate(90.0).await.unwrap();
        let quote = service.current_rate().await.unwrap();
        assert_eq!(quote.rate.value(), 90.0);
        assert_eq!(quote.source, RateSource::Manual);
    }

    #[tokio::test]
    async fn invalid_rate_is_rejected_before_writing() {
        let storage = Arc::new(MemoryStorage::new());
        let service = ExchangeRateService::new(storage.clone(), clock());
        assert!(service.set_rate(0.0).await.is_err());
        assert!(service.set_rate(-5.0).await.is_err());
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn automatic_rate_is_fetched_once_per_day() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = clock();
        let provider = ScriptedProvider::new(vec![Ok(91.0), Ok(95.0)]);
        let service =
            ExchangeRateService::new(storage.clone(), clock.clone()).with_provider(provider.clone());

        let first = service.current_rate().await.unwrap();
        assert_eq!((first.rate.value(), first.source), (91.0, RateSource::Fetched));

        clock.advance(Duration::hours(3));
        let second = service.current_rate().await.unwrap();
        assert_eq!((second.rate.value(), second.source), (91.0, RateSource::Cached));
        assert_eq!(provider.calls(), 1);

        clock.advance(Duration::days(1));
        let next_day = service.current_rate().await.unwrap();
        assert_eq!(next_day.rate.value(), 95.0);
        assert_eq!(provider.calls(), 2);
        assert_eq!(
            storage.peek(LAST_FETCH_KEY).await.as_deref(),
            Some("2025-05-11")
        );
    }

    #[tokio::test]
    async fn refresh_forces_a_new_fetch() {
        let storage = Arc::new(MemoryStorage::new());
        let provider = ScriptedProvider::new(vec![Ok(91.0), Ok(93.5)]);
        let service = ExchangeRateService::new(storage, clock()).with_provider(provider.clone());
        service.automatic_rate().await.unwrap();
        let refreshed = service.refresh().await.unwrap();
        assert_eq!(refreshed.rate.value(), 93.5);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_cache_then_manual_rate() {
        let storage = Arc::new(MemoryStorage::with_entries([(CACHED_RATE_KEY, "88")]));
        let provider = ScriptedProvider::new(vec![Err(CoreError::RateProvider("offline".into()))]);
        let service =
            ExchangeRateService::new(storage.clone(), clock()).with_provider(provider.clone());
        let quote = service.automatic_rate().await.unwrap();
        assert_eq!((quote.rate.value(), quote.source), (88.0, RateSource::Fallback));

        let bare = Arc::new(MemoryStorage::with_entries([(RATE_KEY, "77")]));
        let service = ExchangeRateService::new(bare, clock());
        let quote = service.automatic_rate().await.unwrap();
        assert_eq!((quote.rate.value(), quote.source), (77.0, RateSource::Fallback));
    }

    #[tokio::test]
    async fn provider_returning_garbage_is_not_cached() {
        let storage = Arc::new(MemoryStorage::new());
        let provider = ScriptedProvider::new(vec![Ok(-3.0)]);
        let service = ExchangeRateService::new(storage.clone(), clock()).with_provider(provider);
        let quote = service.automatic_rate().await.unwrap();
        assert_eq!(quote.rate, ExchangeRate::default());
        assert!(storage.peek(CACHED_RATE_KEY).await.is_none());
    }

    #[tokio::test]
    async fn fetched_rate_is_used_even_when_caching_fails() {
        let storage = Arc::new(MemoryStorage::new());
        let provider = ScriptedProvider::new(vec![Ok(91.0), Ok(92.0)]);
        let service =
            ExchangeRateService::new(storage.clone(), clock()).with_provider(provider.clone());

        storage.set_fail_writes(true);
        let quote = service.automatic_rate().await.unwrap();
        assert_eq!((quote.rate.value(), quote.source), (91.0, RateSource::Fetched));
        assert!(storage.peek(CACHED_RATE_KEY).await.is_none());
        assert!(storage.peek(LAST_FETCH_KEY).await.is_none());

        storage.set_fail_writes(false);
        let quote = service.automatic_rate().await.unwrap();
        assert_eq!((quote.rate.value(), quote.source), (92.0, RateSource::Fetched));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn unknown_stored_mode_uses_default() {
        let storage = Arc::new(MemoryStorage::with_entries([(RATE_MODE_KEY, "sometimes")]));
        let service = ExchangeRateService::new(storage, clock())
            .with_defaults(RateMode::Manual, ExchangeRate::new(80.0).unwrap());
        assert_eq!(service.mode().await.unwrap(), RateMode::Manual);
        assert_eq!(service.current_rate().await.unwrap().rate.value(), 80.0);
    }
}
