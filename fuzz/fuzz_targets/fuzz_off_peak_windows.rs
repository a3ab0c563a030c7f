#![no_main]
use chrono::NaiveTime;
use libfuzzer_sys::fuzz_target;
use tarif_edf::rates::{current_period, parse_windows};

fuzz_target!(|data: &[u8]| {
    let Ok(ranges) = std::str::from_utf8(data) else {
        return;
    };
    let windows = parse_windows(ranges);
    for w in &windows {
        assert!(w.wraps_midnight() || w.start <= w.end);
    }
    for h in 0..24 {
        if let Some(t) = NaiveTime::from_hms_opt(h, 30, 0) {
            let _ = current_period(&windows, t);
        }
    }
});
