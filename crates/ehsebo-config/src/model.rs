use std::{fmt, path::PathBuf, time::Duration};

use ehsebo_core::{ExchangeRate, RateMode, DEFAULT_SESSION_DAYS};
use ehsebo_domain::{Currency, DEFAULT_RATE};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Stores user-configurable preferences for the budget application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub language: Language,
    #[serde(default = "AppConfig::default_base_currency")]
    pub base_currency: Currency,
    #[serde(default = "AppConfig::default_secondary_currency")]
    pub secondary_currency: Currency,
    #[serde(default)]
    pub exchange_rate: RateSettings,
    #[serde(default = "AppConfig::default_session_days")]
    pub session_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Upper bound, in milliseconds, for a single storage call.
    pub storage_timeout_ms: Option<u64>,
    #[serde(default)]
    pub mirror: MirrorSettings,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom data directory. Defaults to `<platform data dir>/ehsebo`.
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            base_currency: Self::default_base_currency(),
            secondary_currency: Self::default_secondary_currency(),
            exchange_rate: RateSettings::default(),
            session_days: Self::default_session_days(),
            storage_timeout_ms: None,
            mirror: MirrorSettings::default(),
            data_dir: None,
        }
    }
}

impl AppConfig {
    pub fn default_base_currency() -> Currency {
        Currency::BASE
    }

    pub fn default_secondary_currency() -> Currency {
        Currency::SECONDARY
    }

    pub fn default_session_days() -> u32 {
        DEFAULT_SESSION_DAYS as u32
    }

    /// Checks the cross-field rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_currency == self.secondary_currency {
            return Err(ConfigError::Invalid(format!(
                "base and secondary currency are both {}",
                self.base_currency
            )));
        }
        self.exchange_rate.manual_rate()?;
        if self.session_days == 0 {
            return Err(ConfigError::Invalid(
                "session_days must be at least 1".into(),
            ));
        }
        if self.storage_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "storage_timeout_ms must be positive when set".into(),
            ));
        }
        if self.mirror.enabled && self.mirror.spreadsheet_id.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Invalid(
                "mirror is enabled but no spreadsheet_id is set".into(),
            ));
        }
        Ok(())
    }

    pub fn storage_timeout(&self) -> Option<Duration> {
        self.storage_timeout_ms.map(Duration::from_millis)
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(path) = &self.data_dir {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("ehsebo")
    }
}

/// Exchange-rate preferences used until the user changes them at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSettings {
    #[serde(default)]
    pub mode: RateMode,
    #[serde(default = "RateSettings::default_manual_rate")]
    pub manual_rate: f64,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            mode: RateMode::default(),
            manual_rate: Self::default_manual_rate(),
        }
    }
}

impl RateSettings {
    pub fn default_manual_rate() -> f64 {
        DEFAULT_RATE
    }

    pub fn manual_rate(&self) -> Result<ExchangeRate, ConfigError> {
        ExchangeRate::new(self.manual_rate).map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
}

/// Interface language. Arabic is laid out right-to-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ar,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }

    pub fn is_rtl(self) -> bool {
        matches!(self, Language::Ar)
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::Ar => Language::En,
            Language::En => Language::Ar,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
