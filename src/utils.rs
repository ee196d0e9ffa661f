//! Utility functions for derived metrics and formatting

use time::{format_description, format_description::well_known::Rfc3339, OffsetDateTime};

use crate::models::{Reading, Snapshot, Source};

// Placeholder values published when the API cannot be reached
pub const FALLBACK_TEMPERATURE: f64 = 24.5;
pub const FALLBACK_HUMIDITY: f64 = 55.0;
pub const FALLBACK_VPD: f64 = 1.2;

/// Round a value to the given number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Saturation vapor pressure in kPa (Tetens approximation)
pub fn saturation_vapor_pressure(temperature: f64) -> f64 {
    0.6108 * ((17.27 * temperature) / (temperature + 237.3)).exp()
}

/// Calculate vapor pressure deficit in kPa, rounded to 2 decimal places
///
/// # Arguments
/// * `temperature` - Air temperature in °C
/// * `humidity` - Relative humidity in %
pub fn calculate_vpd(temperature: f64, humidity: f64) -> f64 {
    let svp = saturation_vapor_pressure(temperature);
    let avp = (humidity / 100.0) * svp;
    ((svp - avp) * 100.0).round() / 100.0
}

/// Build the display snapshot for a live reading
///
/// VPD is derived from the raw values; temperature is rounded to one
/// decimal and humidity to a whole percent afterwards.
pub fn live_snapshot(reading: &Reading) -> Snapshot {
    Snapshot {
        reading_id: Some(reading.id),
        temperature: round_to(reading.temperature, 1),
        humidity: round_to(reading.humidity, 0),
        vpd: calculate_vpd(reading.temperature, reading.humidity),
        timestamp: Some(reading.timestamp.clone()),
        source: Source::Live,
    }
}

pub fn fallback_snapshot() -> Snapshot {
    Snapshot {
        reading_id: None,
        temperature: FALLBACK_TEMPERATURE,
        humidity: FALLBACK_HUMIDITY,
        vpd: FALLBACK_VPD,
        timestamp: None,
        source: Source::Fallback,
    }
}

/// Format an API timestamp for human-readable logging
///
/// RFC 3339 timestamps are shown as DD.MM.YYYY - HH:MM:SS. Anything else
/// is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(dt) => format_datetime(&dt),
        Err(_) => raw.to_string(),
    }
}

pub fn format_datetime(dt: &OffsetDateTime) -> String {
    match format_description::parse("[day].[month].[year] - [hour]:[minute]:[second]") {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_vpd(t: f64, h: f64) -> f64 {
        let svp = 0.6108 * ((17.27 * t) / (t + 237.3)).exp();
        (((svp - (h / 100.0) * svp) * 100.0).round()) / 100.0
    }

    #[test]
    fn vpd_for_typical_flowering_conditions() {
        assert!((saturation_vapor_pressure(24.5) - 3.0746).abs() < 0.001);
        assert_eq!(calculate_vpd(24.5, 55.0), 1.38);
    }

    #[test]
    fn vpd_matches_formula_across_realistic_range() {
        let mut t = 10.0;
        while t <= 35.0 {
            for h in [20.0, 40.0, 55.5, 70.0, 90.0] {
                assert_eq!(calculate_vpd(t, h), reference_vpd(t, h), "T={t} H={h}");
            }
            t += 0.7;
        }
    }

    #[test]
    fn saturated_air_has_no_deficit() {
        assert_eq!(calculate_vpd(22.0, 100.0), 0.0);
    }

    #[test]
    fn live_snapshot_rounds_for_display() {
        let reading = Reading {
            id: 7,
            temperature: 24.46,
            humidity: 55.4,
            timestamp: "2024-01-01T00:00:00Z".into(),
        };
        let snap = live_snapshot(&reading);
        assert_eq!(snap.temperature, 24.5);
        assert_eq!(snap.humidity, 55.0);
        assert_eq!(snap.vpd, calculate_vpd(24.46, 55.4));
        assert_eq!(snap.source, Source::Live);
        assert_eq!(snap.reading_id, Some(7));
    }

    #[test]
    fn fallback_snapshot_is_marked_synthetic() {
        let snap = fallback_snapshot();
        assert_eq!(snap.source, Source::Fallback);
        assert_eq!(snap.timestamp, None);
        assert_eq!(snap.temperature, FALLBACK_TEMPERATURE);
    }

    #[test]
    fn timestamps_are_formatted_when_parseable() {
        assert_eq!(
            format_timestamp("2024-01-02T03:04:05Z"),
            "02.01.2024 - 03:04:05"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
