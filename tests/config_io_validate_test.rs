use std::fs;
use tarif_edf::config::{Config, MAX_REFRESH_INTERVAL_DAYS};
use tarif_edf::contract::ContractType;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.contract.contract_type = ContractType::Tempo;
    cfg.contract.contract_power = "9".to_string();
    cfg.contract.off_peak_hours_ranges = Some("23:00-07:00".to_string());
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.contract.contract_type, ContractType::Tempo);
    assert_eq!(loaded.contract.contract_power, "9");
    assert_eq!(loaded.off_peak_hours_ranges(), Some("23:00-07:00"));
    assert_eq!(loaded.logging.file, cfg.logging.file);
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();

    // Empty power tier
    cfg.contract.contract_power.clear();
    assert!(cfg.validate().is_err());

    // Zero refresh interval
    cfg = Config::default();
    cfg.contract.refresh_interval_days = 0;
    assert!(cfg.validate().is_err());

    // Refresh interval beyond ten years
    cfg.contract.refresh_interval_days = MAX_REFRESH_INTERVAL_DAYS;
    assert!(cfg.validate().is_ok());
    cfg.contract.refresh_interval_days = MAX_REFRESH_INTERVAL_DAYS + 1;
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("contract.refresh_interval_days"));

    // Malformed publication time
    cfg = Config::default();
    cfg.tempo.tomorrow_available_at = "11".to_string();
    assert!(cfg.validate().is_err());

    // Zero timeout
    cfg = Config::default();
    cfg.endpoints.timeout_seconds = 0;
    assert!(cfg.validate().is_err());

    // Poll interval zero
    cfg = Config::default();
    cfg.poll_interval_ms = 0;
    assert!(cfg.validate().is_err());

    // Port zero only matters with the server enabled
    cfg = Config::default();
    cfg.web.port = 0;
    assert!(cfg.validate().is_err());
    cfg.web.enabled = false;
    assert!(cfg.validate().is_ok());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"contract: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn unknown_contract_type_is_rejected() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"contract:\n  contract_type: ejp\n").unwrap();
    assert!(Config::from_file(tmp.path()).is_err());
}
