//! Fallback dataset shown when live data is unavailable.
//!
//! The demo readings go through the same aggregator as live data, so every
//! branch/silo invariant holds for them as well.

use chrono::{DateTime, Duration, Utc};

use crate::models::{HistoryPoint, RawReading, DEFAULT_CAPACITY};

// ---

/// (device_id, volume, plant_type, province, site_code, silo_no)
const DEMO_SILOS: [(&str, f64, &str, &str, &str, &str); 7] = [
    ("DEV001", 500.0, "ข้าวสาร", "สระบุรี", "SB001", "1"),
    ("DEV002", 750.0, "ข้าวโพด", "สระบุรี", "SB001", "2"),
    ("DEV003", 250.0, "ข้าวสาร", "สระบุรี", "SB002", "1"),
    ("DEV004", 600.0, "ข้าวสาร", "ราชบุรี", "RB001", "1"),
    ("DEV005", 600.0, "ข้าวโพด", "ราชบุรี", "RB001", "2"),
    ("DEV006", 400.0, "ข้าวสาร", "นครราชสีมา", "NK001", "1"),
    ("DEV007", 400.0, "ข้าวโพด", "นครราชสีมา", "NK001", "2"),
];

const HISTORY_DAYS: i64 = 7;

/// The fixed demo readings: three provinces, seven silos, 1000 t each.
pub fn demo_readings() -> Vec<RawReading> {
    DEMO_SILOS
        .iter()
        .map(
            |&(device_id, volume, plant_type, province, site_code, silo_no)| RawReading {
                device_id: Some(device_id.to_string()),
                province: Some(province.to_string()),
                capacity: Some(DEFAULT_CAPACITY),
                volume: Some(volume),
                plant_type: Some(plant_type.to_string()),
                site_code: Some(site_code.to_string()),
                silo_no: Some(silo_no.to_string()),
                timestamp: None,
            },
        )
        .collect()
}

/// Seven daily points ending at `now`, volumes between 300 and 800.
///
/// Derived from the device id so the same silo always shows the same curve.
pub fn demo_history(device_id: &str, now: DateTime<Utc>) -> Vec<HistoryPoint> {
    // ---
    let seed = device_id
        .bytes()
        .fold(17u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));

    (0..HISTORY_DAYS)
        .rev()
        .map(|days_ago| {
            let step = seed.wrapping_add(days_ago as u64 * 7919) % 50_000;
            let volume = 300.0 + step as f64 / 100.0;
            HistoryPoint {
                timestamp: now - Duration::days(days_ago),
                volume: Some(volume),
                volume_percentage: Some((volume / DEFAULT_CAPACITY * 100.0).round()),
            }
        })
        .collect()
}
