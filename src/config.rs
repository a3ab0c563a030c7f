//! Configuration management for Tarif EDF
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files. Every section has defaults, so a file only
//! needs to carry the values that differ (usually just the contract).

use crate::contract::ContractType;
use crate::error::{Result, TarifError};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod defaults;

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "TARIF_EDF_CONFIG";

/// Upper bound accepted for `contract.refresh_interval_days`
pub const MAX_REFRESH_INTERVAL_DAYS: u32 = 3650;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Contract being tracked
    pub contract: ContractConfig,

    /// Remote tariff and color endpoints
    pub endpoints: EndpointsConfig,

    /// Tempo publication constants
    pub tempo: TempoConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Status server binding configuration
    pub web: WebConfig,

    /// Tick interval in milliseconds
    pub poll_interval_ms: u64,

    /// Timezone used to decide what "today" and "now" mean
    pub timezone: String,
}

/// Contract parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Contract type (base, hphc, tempo)
    pub contract_type: ContractType,

    /// Contracted power tier in kVA, as written in the schedule (`P_SOUSCRITE`)
    pub contract_power: String,

    /// Days after which the tariff schedule is downloaded again
    pub refresh_interval_days: u32,

    /// Comma-separated off-peak windows, e.g. `22:00-06:00,12:00-14:00`
    pub off_peak_hours_ranges: Option<String>,
}

/// Remote endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Schedule for flat-rate contracts
    pub base_url: String,

    /// Schedule for peak / off-peak contracts
    pub hphc_url: String,

    /// Schedule for Tempo contracts
    pub tempo_url: String,

    /// Tempo color API; the date is appended as `/<YYYY-MM-DD>`
    pub tempo_color_api_url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

/// Tempo publication constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Time of day at which a day's color starts to apply (HH:MM)
    pub day_start_at: String,

    /// Time of day after which the next day's color is normally published (HH:MM)
    pub tomorrow_available_at: String,

    /// Off-peak windows used when the contract does not configure any
    pub default_off_peak_hours: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level
    pub console_level: Option<String>,

    /// Optional file-specific level
    pub file_level: Option<String>,

    /// Path to log file (its directory receives the rotated files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Status server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Whether to serve the status API at all
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the environment override or the default locations
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Self::from_file(path);
        }

        let default_paths = [
            "tarif_edf_config.yaml",
            "/data/tarif_edf_config.yaml",
            "/etc/tarif-edf/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Schedule URL for the configured contract type
    pub fn schedule_url(&self) -> &str {
        match self.contract.contract_type {
            ContractType::Base => &self.endpoints.base_url,
            ContractType::Hphc => &self.endpoints.hphc_url,
            ContractType::Tempo => &self.endpoints.tempo_url,
        }
    }

    /// Off-peak windows in effect: the configured list, else the Tempo default
    /// for Tempo contracts, else none.
    pub fn off_peak_hours_ranges(&self) -> Option<&str> {
        match self.contract.off_peak_hours_ranges.as_deref() {
            Some(ranges) => Some(ranges),
            None if self.contract.contract_type == ContractType::Tempo => {
                Some(self.tempo.default_off_peak_hours.as_str())
            }
            None => None,
        }
    }

    /// Parsed timezone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| TarifError::validation("timezone", "Unknown timezone"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.contract.contract_power.trim().is_empty() {
            return Err(TarifError::validation(
                "contract.contract_power",
                "Contracted power cannot be empty",
            ));
        }

        if self.contract.refresh_interval_days == 0 {
            return Err(TarifError::validation(
                "contract.refresh_interval_days",
                "Must be greater than 0",
            ));
        }

        if self.contract.refresh_interval_days > MAX_REFRESH_INTERVAL_DAYS {
            return Err(TarifError::validation(
                "contract.refresh_interval_days",
                "Must be at most 3650 (ten years)",
            ));
        }

        if self.schedule_url().trim().is_empty() {
            return Err(TarifError::validation(
                "endpoints",
                "Schedule URL for the contract type cannot be empty",
            ));
        }

        if self.contract.contract_type.uses_colors()
            && self.endpoints.tempo_color_api_url.trim().is_empty()
        {
            return Err(TarifError::validation(
                "endpoints.tempo_color_api_url",
                "Cannot be empty for Tempo contracts",
            ));
        }

        if self.endpoints.timeout_seconds == 0 {
            return Err(TarifError::validation(
                "endpoints.timeout_seconds",
                "Must be greater than 0",
            ));
        }

        self.tempo.day_start_time()?;
        self.tempo.tomorrow_available_time()?;
        self.tz()?;

        if self.poll_interval_ms == 0 {
            return Err(TarifError::validation(
                "poll_interval_ms",
                "Must be greater than 0",
            ));
        }

        if self.web.enabled && self.web.port == 0 {
            return Err(TarifError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl TempoConfig {
    /// Parsed `day_start_at`
    pub fn day_start_time(&self) -> Result<NaiveTime> {
        parse_hhmm("tempo.day_start_at", &self.day_start_at)
    }

    /// Parsed `tomorrow_available_at`
    pub fn tomorrow_available_time(&self) -> Result<NaiveTime> {
        parse_hhmm("tempo.tomorrow_available_at", &self.tomorrow_available_at)
    }
}

fn parse_hhmm(field: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| TarifError::validation(field, "Expected HH:MM"))
}
