//! Configuration loaded from `clubfolio.toml`.
//!
//! Every section has defaults that reproduce the club's historical setup, so
//! a missing file is not an error. An explicitly requested file must exist.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::corrections::{validate_rules, Backfill, Correction, PriceAdjustment};
use crate::domain::ExchangeMap;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "clubfolio.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid correction rule {}: {reason}", .index + 1)]
    InvalidRule { index: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub storage: StorageConfig,
    pub fx: FxConfig,
    pub analysis: AnalysisConfig,
    pub exchanges: ExchangeMap,
    pub corrections: Vec<Correction>,
    pub backfills: Vec<Backfill>,
    pub price_adjustments: Vec<PriceAdjustment>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            storage: StorageConfig::default(),
            fx: FxConfig::default(),
            analysis: AnalysisConfig::default(),
            exchanges: ExchangeMap::default(),
            corrections: Correction::defaults(),
            backfills: Backfill::defaults(),
            price_adjustments: PriceAdjustment::defaults(),
        }
    }
}

impl Config {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] falling back to
    /// defaults when that file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    log::info!("no {DEFAULT_CONFIG_FILE} found, using built-in defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_rules(&self.corrections)?;
        if self.analysis.activity_window_days < 0 {
            return Err(ConfigError::Invalid(
                "analysis.activity_window_days must be >= 0".into(),
            ));
        }
        for (currency, rate) in &self.fx.rates {
            if !rate.is_finite() || *rate <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "fx rate for {currency} must be positive, got {rate}"
                )));
            }
        }
        for adj in &self.price_adjustments {
            if adj.divide_buy_price_by <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "price adjustment for {} must divide by a positive factor",
                    adj.instrument
                )));
            }
        }
        Ok(())
    }
}

/// Where the holdings page lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "https://www.home.saxo/da-dk/campaigns/millionaerklubben".into(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36".into(),
            timeout_secs: 30,
        }
    }
}

/// Snapshot archive and price database locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub price_db: PathBuf,
    pub file_prefix: String,
    /// First date requested for instruments with no stored prices.
    pub price_history_start: NaiveDate,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            price_db: PathBuf::from("data/MK_PRICES.db"),
            file_prefix: "mill_klubben_portf-".into(),
            price_history_start: NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date"),
        }
    }
}

/// Static conversion rates into the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxConfig {
    pub base: String,
    /// Units of base currency per unit of the keyed currency.
    pub rates: BTreeMap<String, f64>,
}

impl Default for FxConfig {
    fn default() -> Self {
        let rates = [
            ("USD", 7.058),
            ("EUR", 7.456),
            ("DKK", 1.0),
            ("SEK", 0.645),
            ("AUD", 4.49),
            ("CAD", 5.19),
            ("NOK", 0.657),
        ];
        Self {
            base: "DKK".into(),
            rates: rates
                .into_iter()
                .map(|(c, r)| (c.to_string(), r))
                .collect(),
        }
    }
}

impl FxConfig {
    /// Rate into the base currency. The base currency itself is always 1.
    pub fn rate(&self, currency: &str) -> Option<f64> {
        let currency = currency.trim().to_ascii_uppercase();
        if currency == self.base {
            return Some(1.0);
        }
        self.rates.get(&currency).copied()
    }
}

/// Analysis window and investor selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub start_date: NaiveDate,
    /// Investors to analyse; empty means everyone on the page.
    pub investors: Vec<String>,
    pub activity_window_days: i64,
    /// Days of price history shown around a trade.
    pub price_window_days: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            investors: vec![
                "Lars Persson".into(),
                "Lau Svenssen".into(),
                "Michael Friis Jørgensen".into(),
                "Anders Bæk".into(),
            ],
            activity_window_days: 14,
            price_window_days: 10,
        }
    }
}
