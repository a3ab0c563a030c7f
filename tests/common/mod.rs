#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Mutex;
use tarif_edf::config::Config;
use tarif_edf::contract::ContractType;
use tarif_edf::error::{Result, TarifError};
use tarif_edf::fetch::Fetcher;
use tokio::sync::Barrier;

pub const BASE_URL: &str = "http://tariffs.test/base.csv";
pub const HPHC_URL: &str = "http://tariffs.test/hphc.csv";
pub const TEMPO_URL: &str = "http://tariffs.test/tempo.csv";
pub const COLOR_API: &str = "http://colors.test/api/jourTempo";

pub const BASE_SCHEDULE: &str = "DATE_DEBUT;DATE_FIN;P_SOUSCRITE;PART_FIXE_HT;PART_FIXE_TTC;PART_VARIABLE_HT;PART_VARIABLE_TTC
01/08/2023;31/01/2024;6;100,00;114,00;0,1900;0,2276
01/02/2024;;6;100,00;120,00;0,2000;0,2500
01/02/2024;;9;120,00;144,00;0,2000;0,2500
";

pub const HPHC_SCHEDULE: &str = "DATE_DEBUT;DATE_FIN;P_SOUSCRITE;PART_FIXE_TTC;PART_VARIABLE_HC_TTC;PART_VARIABLE_HP_TTC
01/02/2024;;6;180,00;0,2068;0,2700
";

pub const TEMPO_SCHEDULE: &str = "DATE_DEBUT;DATE_FIN;P_SOUSCRITE;PART_FIXE_TTC;PART_VARIABLE_HCBleu_TTC;PART_VARIABLE_HPBleu_TTC;PART_VARIABLE_HCBlanc_TTC;PART_VARIABLE_HPBlanc_TTC;PART_VARIABLE_HCRouge_TTC;PART_VARIABLE_HPRouge_TTC
01/02/2024;;6;156,00;0,1296;0,1609;0,1486;0,1894;0,1568;0,7562
";

/// In-memory fetcher answering from a URL table and recording every request
#[derive(Default)]
pub struct MockFetcher {
    routes: Mutex<HashMap<String, Option<Vec<u8>>>>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Some(body.as_bytes().to_vec()));
    }

    pub fn fail(&self, url: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), None);
    }

    pub fn color(&self, date: NaiveDate, code: u8) {
        self.respond(&color_url(date), &format!("{{\"codeJour\":{}}}", code));
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.routes.lock().unwrap().get(url) {
            Some(Some(body)) => Ok(body.clone()),
            Some(None) => Err(TarifError::fetch(format!("GET {} returned 503", url))),
            None => Err(TarifError::fetch(format!("no route for {}", url))),
        }
    }
}

/// Holds every color request until `parties` of them are in flight at once
pub struct GatedColorFetcher {
    pub inner: MockFetcher,
    gate: Barrier,
}

impl GatedColorFetcher {
    pub fn new(inner: MockFetcher, parties: usize) -> Self {
        Self {
            inner,
            gate: Barrier::new(parties),
        }
    }
}

#[async_trait]
impl Fetcher for GatedColorFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if url.starts_with(COLOR_API) {
            self.gate.wait().await;
        }
        self.inner.fetch(url).await
    }
}

pub fn config(contract_type: ContractType) -> Config {
    let mut config = Config::default();
    config.contract.contract_type = contract_type;
    config.contract.contract_power = "6".to_string();
    config.endpoints.base_url = BASE_URL.to_string();
    config.endpoints.hphc_url = HPHC_URL.to_string();
    config.endpoints.tempo_url = TEMPO_URL.to_string();
    config.endpoints.tempo_color_api_url = COLOR_API.to_string();
    config.web.enabled = false;
    config
}

pub fn color_url(date: NaiveDate) -> String {
    format!("{}/{}", COLOR_API, date.format("%Y-%m-%d"))
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

pub fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    day(d).and_hms_opt(h, m, 0).unwrap()
}
