//! # Tarif EDF - current electricity rate for EDF regulated contracts
//!
//! Keeps track of the regulated French electricity tariffs for a single
//! contract and tells which per-kWh price applies right now.
//!
//! ## Features
//!
//! - **Tariff schedules**: Base, HP/HC and Tempo schedules downloaded from
//!   data.gouv.fr and filtered down to the row valid today
//! - **Tempo colors**: yesterday / today / tomorrow colors with an adaptive
//!   per-day cache
//! - **Active rate**: off-peak windows and the current Tempo day applied to
//!   the figures
//! - **Status API**: read-only JSON snapshot over HTTP
//! - **Configuration**: YAML-based configuration with validation
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `fetch`: HTTP fetcher behind the `Fetcher` trait
//! - `tariff`: Tariff schedule parsing
//! - `tempo`: Tempo day-color cache
//! - `rates`: Off-peak windows and active rate resolution
//! - `snapshot`: Published state and its named-field projection
//! - `coordinator`: Periodic refresh loop
//! - `web`: HTTP status API

pub mod config;
pub mod contract;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod rates;
pub mod snapshot;
pub mod tariff;
pub mod tempo;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use contract::{ContractType, PricePeriod, TempoColor};
pub use coordinator::TarifCoordinator;
pub use error::{Result, TarifError};
pub use fetch::{Fetcher, HttpFetcher};
pub use snapshot::{EngineState, Snapshot};
