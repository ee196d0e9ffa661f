//! Summary of the static device/sensor/room mapping table

use std::collections::{BTreeMap, HashSet};

use crate::models::SensorMapping;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomSensors {
    pub active: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingSummary {
    pub total_entries: usize,
    pub active_sensors: usize,
    pub unique_devices: usize,
    pub rooms_configured: usize,
    /// Sensor counts keyed by room id
    pub rooms: BTreeMap<String, RoomSensors>,
}

pub fn summarize(mappings: &[SensorMapping]) -> MappingSummary {
    let devices: HashSet<&str> = mappings.iter().map(|m| m.device_id.as_str()).collect();

    let mut rooms: BTreeMap<String, RoomSensors> = BTreeMap::new();
    for entry in mappings {
        let room = rooms.entry(entry.room_id.clone()).or_default();
        room.total += 1;
        if entry.active {
            room.active += 1;
        }
    }

    MappingSummary {
        total_entries: mappings.len(),
        active_sensors: mappings.iter().filter(|m| m.active).count(),
        unique_devices: devices.len(),
        rooms_configured: rooms.len(),
        rooms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_sensor_map;

    #[test]
    fn summary_counts_devices_rooms_and_active_sensors() {
        let mappings = parse_sensor_map(
            "ESP32_001:DHT001=ROOM_A,ESP32_001:DHT002=ROOM_A,ESP32_002:DHT003=ROOM_A,\
             !ESP32_002:DHT004=ROOM_A,ESP32_003:DHT005=ROOM_B,ESP32_003:DHT006=ROOM_B",
        )
        .unwrap();
        let summary = summarize(&mappings);

        assert_eq!(summary.total_entries, 6);
        assert_eq!(summary.active_sensors, 5);
        assert_eq!(summary.unique_devices, 3);
        assert_eq!(summary.rooms_configured, 2);
        assert_eq!(summary.rooms["ROOM_A"], RoomSensors { active: 3, total: 4 });
        assert_eq!(summary.rooms["ROOM_B"], RoomSensors { active: 2, total: 2 });
    }

    #[test]
    fn empty_table() {
        assert_eq!(summarize(&[]), MappingSummary::default());
    }
}
