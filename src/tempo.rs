//! Tempo day-color cache
//!
//! One record per calendar date, fetched from the color API and refreshed on
//! an adaptive period. A defined color fetched once its day has started is
//! final and never fetched again. Anything else is re-checked: hourly for a
//! defined color seen ahead of time, every 30 minutes for an unpublished color
//! until the publication time the day before, then every 15 minutes.

use crate::config::Config;
use crate::contract::TempoColor;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;

const DEFINED_REFRESH_MINUTES: i64 = 60;
const PENDING_REFRESH_MINUTES: i64 = 30;
const PENDING_REFRESH_AFTER_PUBLICATION_MINUTES: i64 = 15;

/// Days kept before "today"
pub const RETENTION_DAYS: i64 = 2;

/// Color API payload
#[derive(Debug, Deserialize)]
struct DayColorPayload {
    #[serde(rename = "codeJour")]
    code_jour: u8,
}

/// Color designation of one date, as last fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayColorRecord {
    pub date: NaiveDate,
    /// `codeJour`: 0 undetermined, 1 blue, 2 white, 3 red
    pub code: u8,
    pub fetched_at: NaiveDateTime,
}

impl DayColorRecord {
    pub fn color(&self) -> TempoColor {
        TempoColor::from_code(self.code)
    }
}

/// Per-date color cache shared by the three concurrent lookups of a tick
pub struct TempoDayCache {
    base_url: String,
    day_start: NaiveTime,
    tomorrow_available: NaiveTime,
    entries: Mutex<HashMap<NaiveDate, DayColorRecord>>,
    logger: StructuredLogger,
}

impl TempoDayCache {
    pub fn new(base_url: &str, day_start: NaiveTime, tomorrow_available: NaiveTime) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let logger =
            get_logger_with_context(LogContext::new("tempo").with_field("api", &base_url));
        Self {
            base_url,
            day_start,
            tomorrow_available,
            entries: Mutex::new(HashMap::new()),
            logger,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            &config.endpoints.tempo_color_api_url,
            config.tempo.day_start_time()?,
            config.tempo.tomorrow_available_time()?,
        ))
    }

    /// Time of day at which a color starts to apply
    pub fn day_start(&self) -> NaiveTime {
        self.day_start
    }

    /// A defined color fetched after its own day started cannot change anymore
    pub fn is_authoritative(&self, record: &DayColorRecord) -> bool {
        record.color().is_defined() && record.fetched_at >= record.date.and_time(self.day_start)
    }

    /// How long a non-authoritative record stays fresh when looked at `now`
    pub fn refresh_period(&self, record: &DayColorRecord, now: NaiveDateTime) -> Duration {
        if record.color().is_defined() {
            return Duration::minutes(DEFINED_REFRESH_MINUTES);
        }
        let publication = (record.date - Duration::days(1)).and_time(self.tomorrow_available);
        if now < publication {
            Duration::minutes(PENDING_REFRESH_MINUTES)
        } else {
            Duration::minutes(PENDING_REFRESH_AFTER_PUBLICATION_MINUTES)
        }
    }

    /// Whether `record` can be served at `now` without asking the API
    pub fn is_fresh(&self, record: &DayColorRecord, now: NaiveDateTime) -> bool {
        self.is_authoritative(record) || record.fetched_at + self.refresh_period(record, now) > now
    }

    /// Color record of `date`, from the cache when fresh, otherwise fetched.
    ///
    /// The lock is released while the request is in flight; a fetched record
    /// overwrites whatever the entry held.
    pub async fn resolve(
        &self,
        fetcher: &dyn Fetcher,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<DayColorRecord> {
        let cached = self.entries.lock().await.get(&date).copied();
        if let Some(record) = cached
            && self.is_fresh(&record, now)
        {
            return Ok(record);
        }

        let url = format!("{}/{}", self.base_url, date.format("%Y-%m-%d"));
        self.logger.debug(&format!("Fetching Tempo color: {}", url));
        let body = fetcher.fetch(&url).await?;
        let payload: DayColorPayload = serde_json::from_slice(&body)?;

        let record = DayColorRecord {
            date,
            code: payload.code_jour,
            fetched_at: now,
        };
        if cached.map(|c| c.code) != Some(record.code) {
            self.logger
                .info(&format!("Tempo color for {}: {}", date, record.color()));
        }
        self.entries.lock().await.insert(date, record);
        Ok(record)
    }

    /// Drop records dated more than [`RETENTION_DAYS`] before `today`.
    /// Returns the number of records removed.
    pub async fn evict(&self, today: NaiveDate) -> usize {
        let cutoff = today - Duration::days(RETENTION_DAYS);
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|date, _| *date >= cutoff);
        let removed = before - entries.len();
        if removed > 0 {
            self.logger
                .debug(&format!("Evicted {} Tempo color record(s)", removed));
        }
        removed
    }

    pub async fn get(&self, date: NaiveDate) -> Option<DayColorRecord> {
        self.entries.lock().await.get(&date).copied()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Seed or replace a record directly
    pub async fn insert(&self, record: DayColorRecord) {
        self.entries.lock().await.insert(record.date, record);
    }
}
