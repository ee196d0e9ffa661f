use log::{debug, info};
use std::env;
use std::str::FromStr;
use tokio::time::Duration;
use url::Url;

use crate::models::SensorMapping;

const DEFAULT_API_BASE_URL: &str = "https://autogrow-api-mbmc.onrender.com";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STATUS_MESSAGE_SECS: u64 = 3;
const DEFAULT_ROOM_NAME: &str = "Flowering";

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub api_base_url: Url,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub status_message_ttl: Duration,
    pub room_name: String,
    pub mappings: Vec<SensorMapping>,
}

impl MonitorConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        let raw_url = env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.into());
        let api_base_url =
            Url::parse(&raw_url).map_err(|e| format!("Invalid API_BASE_URL '{}': {}", raw_url, e))?;

        let poll_interval =
            Duration::from_secs(parse_var("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?);
        if poll_interval.is_zero() {
            return Err("POLL_INTERVAL_SECS must be greater than zero".into());
        }
        let request_timeout = Duration::from_secs(parse_var(
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        let status_message_ttl = Duration::from_secs(parse_var(
            "STATUS_MESSAGE_SECS",
            DEFAULT_STATUS_MESSAGE_SECS,
        )?);
        let room_name = env::var("ROOM_NAME").unwrap_or_else(|_| DEFAULT_ROOM_NAME.into());

        // Try SENSOR_MAP format first
        let mappings = match env::var("SENSOR_MAP") {
            Ok(map) => parse_sensor_map(&map)?,
            Err(_) => {
                debug!("SENSOR_MAP environment variable not found, trying individual variables");
                mappings_from_vars(env::vars())
            }
        };

        info!("Total sensor mappings loaded: {}", mappings.len());
        for entry in &mappings {
            debug!(
                "Mapping {}: {}/{} -> {} ({})",
                entry.id,
                entry.device_id,
                entry.sensor_id,
                entry.room_id,
                if entry.active { "active" } else { "inactive" }
            );
        }

        Ok(MonitorConfig {
            api_base_url,
            poll_interval,
            request_timeout,
            status_message_ttl,
            room_name,
            mappings,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e| {
            let msg = format!("Invalid {} '{}': {}", key, value, e);
            Box::<dyn std::error::Error>::from(msg)
        }),
        Err(_) => Ok(default),
    }
}

/// Parse `DEVICE:SENSOR=ROOM` pairs separated by commas
///
/// A leading `!` marks the sensor inactive. Entries are numbered in the
/// order they appear, starting from 1.
pub fn parse_sensor_map(map: &str) -> Result<Vec<SensorMapping>, String> {
    let mut mappings = Vec::new();

    for pair in map.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        let (active, pair) = match pair.strip_prefix('!') {
            Some(rest) => (false, rest.trim()),
            None => (true, pair),
        };

        let (ids, room) = pair
            .split_once('=')
            .ok_or_else(|| format!("Failed to split sensor mapping '{}'", pair))?;
        let (device, sensor) = ids
            .split_once(':')
            .ok_or_else(|| format!("Missing device:sensor in mapping '{}'", pair))?;

        let (device, sensor, room) = (device.trim(), sensor.trim(), room.trim());
        if device.is_empty() || sensor.is_empty() || room.is_empty() {
            return Err(format!("Empty field in sensor mapping '{}'", pair));
        }

        mappings.push(SensorMapping {
            id: (mappings.len() + 1).to_string(),
            device_id: device.to_string(),
            sensor_id: sensor.to_string(),
            room_id: room.to_string(),
            active,
        });
    }

    Ok(mappings)
}

/// Collect `SENSOR_<N>_DEVICE` / `_SENSOR` / `_ROOM` / `_ACTIVE` variables
///
/// Incomplete groups are skipped. Rows are ordered by `<N>`.
pub fn mappings_from_vars<I>(vars: I) -> Vec<SensorMapping>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: Vec<(String, String)> = vars.into_iter().collect();
    let lookup = |key: &str| {
        vars.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim().to_string())
    };

    let mut indices: Vec<String> = vars
        .iter()
        .filter_map(|(key, _)| {
            key.strip_prefix("SENSOR_")
                .and_then(|s| s.strip_suffix("_DEVICE"))
                .map(str::to_string)
        })
        .collect();
    indices.sort_by_key(|index| (index.parse::<u64>().unwrap_or(u64::MAX), index.clone()));

    let mut mappings = Vec::new();
    for index in indices {
        let device = lookup(&format!("SENSOR_{}_DEVICE", index));
        let sensor = lookup(&format!("SENSOR_{}_SENSOR", index));
        let room = lookup(&format!("SENSOR_{}_ROOM", index));

        if let (Some(device_id), Some(sensor_id), Some(room_id)) = (device, sensor, room) {
            let active = lookup(&format!("SENSOR_{}_ACTIVE", index))
                .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true);
            mappings.push(SensorMapping {
                id: index,
                device_id,
                sensor_id,
                room_id,
                active,
            });
        } else {
            debug!("Skipping incomplete sensor mapping SENSOR_{}", index);
        }
    }

    mappings
}
