#![no_main]
use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use tarif_edf::contract::ContractType;
use tarif_edf::tariff::parse_schedule;

fuzz_target!(|data: &[u8]| {
    let Some(today) = NaiveDate::from_ymd_opt(2024, 3, 15) else {
        return;
    };
    // Any input must end in figures, no match, or an error; never a panic
    for contract_type in [ContractType::Base, ContractType::Hphc, ContractType::Tempo] {
        let _ = parse_schedule(data, contract_type, "6", today);
    }
});
