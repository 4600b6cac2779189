use chrono::{Local, TimeZone};

const SIZE_UNITS: &[&str] = &["KiBi", "MiBi", "GiBi", "TiBi"];

/// Human-readable byte count with two decimals, e.g. `1.50 KiBi`.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = "B";
    for name in SIZE_UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = name;
    }
    format!("{:.2} {}", value, unit)
}

/// Local date and time for a Unix timestamp in seconds.
pub fn format_mod_time(seconds: f64) -> String {
    let secs = seconds.floor();
    let nanos = ((seconds - secs) * 1e9) as u32;
    Local
        .timestamp_opt(secs as i64, nanos.min(999_999_999))
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
