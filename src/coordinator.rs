//! Refresh coordinator
//!
//! Once per tick: re-download the tariff schedule when it is stale, resolve the
//! Tempo colors of yesterday, today and tomorrow, pick the active rate and
//! publish the result. Each tick works on a copy of the last state; a fetch or
//! parse failure stops the tick at the failing step and publishes whatever the
//! earlier steps produced, flagged as unsuccessful.

use crate::config::Config;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::rates::{ColorAliases, resolve_active_rate};
use crate::snapshot::{EngineState, Snapshot};
use crate::tariff::parse_schedule;
use crate::tempo::TempoDayCache;
use chrono::{Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval};

pub struct TarifCoordinator {
    config: Config,
    tz: Tz,
    fetcher: Arc<dyn Fetcher>,
    cache: TempoDayCache,
    state: EngineState,
    active_rate_seen: bool,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    logger: StructuredLogger,
    total_ticks: u64,
    overrun_count: u64,
}

impl TarifCoordinator {
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        config.validate()?;
        let tz = config.tz()?;
        let cache = TempoDayCache::from_config(&config)?;

        let contract = &config.contract;
        let state = EngineState::new(contract.contract_type, &contract.contract_power);
        let (snapshot_tx, _) = watch::channel(Arc::new(Snapshot::initial(
            contract.contract_type,
            &contract.contract_power,
        )));
        let logger = get_logger_with_context(LogContext::new("coordinator").with_contract(
            format!("{} {}kVA", contract.contract_type, contract.contract_power),
        ));

        Ok(Self {
            config,
            tz,
            fetcher,
            cache,
            state,
            active_rate_seen: false,
            snapshot_tx,
            logger,
            total_ticks: 0,
            overrun_count: 0,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Last published state
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn cache(&self) -> &TempoDayCache {
        &self.cache
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn overrun_count(&self) -> u64 {
        self.overrun_count
    }

    /// Current wall-clock time in the configured timezone
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }

    pub async fn tick(&mut self) -> Result<()> {
        let now = self.now();
        self.tick_at(now).await
    }

    /// Run one refresh as of `now` and publish the outcome.
    ///
    /// The snapshot is published even when a step fails; the error is
    /// returned afterwards so the caller can log it.
    pub async fn tick_at(&mut self, now: NaiveDateTime) -> Result<()> {
        let mut next = self.state.clone();
        let outcome = self.refresh(&mut next, now).await;
        if let Err(e) = &outcome {
            self.logger.error(&format!("Refresh failed: {}", e));
        }
        self.publish(next, outcome.is_ok(), now);
        outcome
    }

    async fn refresh(&self, state: &mut EngineState, now: NaiveDateTime) -> Result<()> {
        if self.tariff_is_stale(state, now) {
            self.refresh_tariff(state, now).await?;
        }
        if self.config.contract.contract_type.uses_colors() {
            self.resolve_colors(state, now).await?;
        }
        state.active_rate = resolve_active_rate(
            self.config.contract.contract_type,
            state.figures.as_ref(),
            &state.current_color_rates,
            self.config.off_peak_hours_ranges(),
            now.time(),
        );
        Ok(())
    }

    fn tariff_is_stale(&self, state: &EngineState, now: NaiveDateTime) -> bool {
        let max_age = Duration::days(i64::from(self.config.contract.refresh_interval_days));
        // A limit before the calendar's first day means the schedule never expires
        state.last_tariff_refresh_at.is_none_or(|last| {
            now.checked_sub_signed(max_age)
                .is_some_and(|limit| last < limit)
        })
    }

    async fn refresh_tariff(&self, state: &mut EngineState, now: NaiveDateTime) -> Result<()> {
        let contract = &self.config.contract;
        let url = self.config.schedule_url();
        self.logger.debug(&format!("Downloading tariff schedule: {}", url));

        let raw = self.fetcher.fetch(url).await?;
        match parse_schedule(
            &raw,
            contract.contract_type,
            &contract.contract_power,
            now.date(),
        )? {
            Some(figures) => {
                if state.figures.as_ref() != Some(&figures) {
                    self.logger.info(&format!(
                        "Tariff updated: {:.2} EUR/month fixed",
                        figures.fixed_monthly_ttc()
                    ));
                }
                state.figures = Some(figures);
                state.last_tariff_refresh_at = Some(now);
                // Prices of the current color follow the new figures even if
                // the color step fails later in this tick
                if contract.contract_type.uses_colors() {
                    state.current_color_rates =
                        ColorAliases::for_color(state.figures.as_ref(), state.tempo.current);
                }
            }
            None => {
                self.logger.warn(&format!(
                    "No schedule row valid on {} for {}kVA; keeping previous figures",
                    now.date(),
                    contract.contract_power
                ));
            }
        }
        Ok(())
    }

    async fn resolve_colors(&self, state: &mut EngineState, now: NaiveDateTime) -> Result<()> {
        let today = now.date();
        if state
            .last_color_refresh_at
            .is_none_or(|last| last.date() != today)
        {
            self.cache.evict(today).await;
        }

        let fetcher = self.fetcher.as_ref();
        let (yesterday, current_day, tomorrow) = tokio::join!(
            self.cache.resolve(fetcher, today - Duration::days(1), now),
            self.cache.resolve(fetcher, today, now),
            self.cache.resolve(fetcher, today + Duration::days(1), now),
        );
        let (yesterday, current_day, tomorrow) = (yesterday?, current_day?, tomorrow?);

        // The Tempo day runs from day_start to day_start
        let (current, next) = if now.time() < self.cache.day_start() {
            (yesterday.color(), current_day.color())
        } else {
            (current_day.color(), tomorrow.color())
        };

        state.tempo.yesterday = Some(yesterday.color());
        state.tempo.today = Some(current_day.color());
        state.tempo.tomorrow = Some(tomorrow.color());
        state.tempo.current = Some(current);
        state.tempo.next = Some(next);
        state.current_color_rates = ColorAliases::for_color(state.figures.as_ref(), Some(current));
        state.last_color_refresh_at = Some(now);
        Ok(())
    }

    fn publish(&mut self, state: EngineState, success: bool, now: NaiveDateTime) {
        self.active_rate_seen |= state.active_rate.is_some();
        let snapshot = Snapshot {
            state: state.clone(),
            last_update_success: success,
            updated_at: Some(now),
            active_rate_seen: self.active_rate_seen,
        };
        self.state = state;
        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }

    /// Tick on the configured interval until `shutdown` resolves.
    ///
    /// Shutdown is only observed between ticks.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.logger.info("Starting refresh loop");

        let period_ms = self.config.poll_interval_ms;
        let mut poll_interval = interval(std::time::Duration::from_millis(period_ms));
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    let started = Instant::now();
                    // Errors are already logged and published
                    let _ = self.tick().await;
                    let dur_ms = started.elapsed().as_millis() as u64;
                    self.total_ticks = self.total_ticks.saturating_add(1);
                    if dur_ms > period_ms {
                        self.overrun_count = self.overrun_count.saturating_add(1);
                    }
                    self.logger.debug(&format!(
                        "Tick {} took {} ms (overruns: {})",
                        self.total_ticks, dur_ms, self.overrun_count
                    ));
                }
                _ = &mut shutdown => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractType;
    use crate::error::TarifError;
    use async_trait::async_trait;

    struct Offline;

    #[async_trait]
    impl Fetcher for Offline {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            Err(TarifError::fetch(format!("offline: {}", url)))
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn failed_tick_is_published_as_unsuccessful() {
        let mut coordinator = TarifCoordinator::new(Config::default(), Arc::new(Offline)).unwrap();
        let rx = coordinator.subscribe();
        assert!(rx.borrow().updated_at.is_none());

        assert!(coordinator.tick_at(at(12, 0)).await.is_err());
        let snapshot = rx.borrow().clone();
        assert!(!snapshot.last_update_success);
        assert_eq!(snapshot.updated_at, Some(at(12, 0)));
        assert!(snapshot.state.figures.is_none());
        assert!(snapshot.state.last_tariff_refresh_at.is_none());
    }

    #[test]
    fn out_of_range_refresh_limit_is_never_stale() {
        let mut coordinator = TarifCoordinator::new(Config::default(), Arc::new(Offline)).unwrap();
        let mut state = coordinator.state().clone();
        assert!(coordinator.tariff_is_stale(&state, at(12, 0)));

        state.last_tariff_refresh_at = Some(at(12, 0));
        coordinator.config.contract.refresh_interval_days = u32::MAX;
        assert!(!coordinator.tariff_is_stale(&state, at(12, 1)));
        assert!(!coordinator.tariff_is_stale(&state, NaiveDateTime::MAX));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut config = Config::default();
        config.contract.contract_type = ContractType::Tempo;
        config.endpoints.tempo_color_api_url = String::new();
        assert!(TarifCoordinator::new(config, Arc::new(Offline)).is_err());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let mut config = Config::default();
        config.poll_interval_ms = 10;
        let mut coordinator = TarifCoordinator::new(config, Arc::new(Offline)).unwrap();
        coordinator
            .run(tokio::time::sleep(std::time::Duration::from_millis(35)))
            .await
            .unwrap();
        assert!(coordinator.total_ticks() >= 1);
        assert!(!coordinator.snapshot().last_update_success);
    }
}
