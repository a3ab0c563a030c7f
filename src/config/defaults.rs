use super::*;

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            contract_type: ContractType::Base,
            contract_power: "6".to_string(),
            refresh_interval_days: 7,
            off_peak_hours_ranges: None,
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.data.gouv.fr/fr/datasets/r/c13d05e5-9e55-4d03-bf7e-042a2ade7e49"
                .to_string(),
            hphc_url: "https://www.data.gouv.fr/fr/datasets/r/f7303b3a-93c7-4242-813d-84919034c416"
                .to_string(),
            tempo_url: "https://www.data.gouv.fr/fr/datasets/r/0c3d1d36-c412-4620-8566-e5cbb4fa2b5a"
                .to_string(),
            tempo_color_api_url: "https://www.api-couleur-tempo.fr/api/jourTempo".to_string(),
            user_agent: concat!("tarif-edf/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            day_start_at: "06:00".to_string(),
            tomorrow_available_at: "11:00".to_string(),
            default_off_peak_hours: "22:00-06:00".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/tarif-edf.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contract: ContractConfig::default(),
            endpoints: EndpointsConfig::default(),
            tempo: TempoConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
            poll_interval_ms: 60_000,
            timezone: "Europe/Paris".to_string(),
        }
    }
}
