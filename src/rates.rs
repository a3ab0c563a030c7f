//! Active rate resolution
//!
//! Picks the one per-kWh price in effect at a given time of day from the
//! tariff figures, the configured off-peak windows and (for Tempo) the color
//! of the current Tempo day.

use crate::contract::{ContractType, PricePeriod, TempoColor};
use crate::logging::get_logger;
use crate::tariff::TariffFigures;
use chrono::NaiveTime;
use serde::Serialize;

/// Off-peak window `HH:MM-HH:MM`; an end before the start wraps past midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffPeakWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl OffPeakWindow {
    /// Parse one window. Hours take one or two digits (0-23), minutes exactly
    /// two (00-59). Surrounding whitespace is ignored; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (start, end) = raw.trim().split_once('-')?;
        Some(Self {
            start: parse_clock(start)?,
            end: parse_clock(end)?,
        })
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Start inclusive, end exclusive
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.wraps_midnight() {
            t >= self.start || t < self.end
        } else {
            self.start <= t && t < self.end
        }
    }
}

fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let (h, m) = raw.split_once(':')?;
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(h) || h.len() > 2 || !digits(m) || m.len() != 2 {
        return None;
    }
    NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, 0)
}

/// Parse a comma-separated window list, skipping malformed entries
pub fn parse_windows(ranges: &str) -> Vec<OffPeakWindow> {
    let mut windows = Vec::new();
    for raw in ranges.split(',') {
        match OffPeakWindow::parse(raw) {
            Some(w) => windows.push(w),
            None => get_logger("rates").debug(&format!("Ignoring off-peak window '{}'", raw)),
        }
    }
    windows
}

/// Off-peak when any window contains `t`, peak otherwise
pub fn current_period(windows: &[OffPeakWindow], t: NaiveTime) -> PricePeriod {
    if windows.iter().any(|w| w.contains(t)) {
        PricePeriod::OffPeak
    } else {
        PricePeriod::Peak
    }
}

/// Peak / off-peak prices of the current Tempo color
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ColorAliases {
    pub hp: Option<f64>,
    pub hc: Option<f64>,
}

impl ColorAliases {
    pub fn for_color(figures: Option<&TariffFigures>, color: Option<TempoColor>) -> Self {
        let Some(figures) = figures else {
            return Self::default();
        };
        if !matches!(figures, TariffFigures::Tempo { .. }) {
            return Self::default();
        }
        Self {
            hp: figures.variable(PricePeriod::Peak, color),
            hc: figures.variable(PricePeriod::OffPeak, color),
        }
    }

    pub fn get(&self, period: PricePeriod) -> Option<f64> {
        match period {
            PricePeriod::Peak => self.hp,
            PricePeriod::OffPeak => self.hc,
        }
    }
}

/// Rate in effect at `t`.
///
/// Flat-rate contracts ignore windows. Peak / off-peak contracts without any
/// configured window list stay unresolved. Tempo prices come from `aliases`,
/// so an undetermined current color leaves the rate unresolved as well.
pub fn resolve_active_rate(
    contract_type: ContractType,
    figures: Option<&TariffFigures>,
    aliases: &ColorAliases,
    off_peak_ranges: Option<&str>,
    t: NaiveTime,
) -> Option<f64> {
    match contract_type {
        ContractType::Base => figures?.variable(PricePeriod::Peak, None),
        ContractType::Hphc => {
            let period = current_period(&parse_windows(off_peak_ranges?), t);
            figures?.variable(period, None)
        }
        ContractType::Tempo => {
            let period = current_period(&parse_windows(off_peak_ranges?), t);
            aliases.get(period)
        }
    }
}
