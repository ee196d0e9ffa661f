use serde::{Deserialize, Serialize};

/// One row of `/api/log`: `[id, temperature, humidity, timestamp]`
pub type LogRow = (i64, f64, f64, String);

/// Body of `GET /api/log`, newest row first
///
/// Rows stay undecoded; only the newest one is ever read, so a bad
/// historical row does not invalidate the response.
#[derive(Debug, Clone, Deserialize)]
pub struct LogResponse {
    pub registros: Vec<serde_json::Value>,
}

impl LogResponse {
    /// Decode the first row, `Ok(None)` when the log is empty
    pub fn newest(&self) -> Result<Option<Reading>, serde_json::Error> {
        match self.registros.first() {
            Some(row) => {
                <LogRow as Deserialize>::deserialize(row).map(|row| Some(Reading::from(row)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
impl From<Vec<LogRow>> for LogResponse {
    fn from(rows: Vec<LogRow>) -> Self {
        LogResponse {
            registros: rows
                .into_iter()
                .map(|(id, t, h, ts)| serde_json::json!([id, t, h, ts]))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub id: i64,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: String,
}

impl From<LogRow> for Reading {
    fn from((id, temperature, humidity, timestamp): LogRow) -> Self {
        Reading {
            id,
            temperature,
            humidity,
            timestamp,
        }
    }
}

/// Target values the external climate controller should hold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Setpoint {
    #[serde(rename = "temp_set")]
    pub temperature_target: f64,
    #[serde(rename = "hum_set")]
    pub humidity_target: f64,
}

impl Default for Setpoint {
    fn default() -> Self {
        Setpoint {
            temperature_target: 24.0,
            humidity_target: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Loading,
    Disconnected,
}

/// Where the values of a published snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Live,
    Fallback,
}

/// Reading as published to consumers, rounded for display
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub reading_id: Option<i64>,
    pub temperature: f64,
    pub humidity: f64,
    pub vpd: f64,
    pub timestamp: Option<String>,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub status: ConnectionStatus,
    pub current: Snapshot,
    /// Most recent live snapshot, never replaced by fallback values
    pub last_good: Option<Snapshot>,
    pub last_applied_seq: u64,
}

/// Row of the static device/sensor/room mapping table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorMapping {
    pub id: String,
    pub device_id: String,
    pub sensor_id: String,
    pub room_id: String,
    pub active: bool,
}
