// ── Capability id scheme and registry ──
//
// Alarm slots surface on the platform as per-slot toggle capabilities
// named `alarm.{slot}`. The registry tracks which slots currently have a
// capability so toggle events for removed slots can be dropped instead
// of hitting the device.

use std::collections::BTreeMap;

use dawnlink_api::AlarmSlot;

/// Fixed sensor and control capability ids on the device entry.
pub mod ids {
    pub const MAIN_LIGHT: &str = "onoff.mainlight";
    pub const NIGHT_LIGHT: &str = "onoff.nightlight";
    pub const SUNSET: &str = "onoff.sunset";
    pub const RELAX_BREATHE: &str = "onoff.relax_breathe";
    pub const BEDTIME_TRACKING: &str = "onoff.bedtime_tracking";
    pub const DIM: &str = "dim";
    pub const TEMPERATURE: &str = "measure_temperature";
    pub const HUMIDITY: &str = "measure_humidity";
    pub const LUMINANCE: &str = "measure_luminance";
    pub const NOISE: &str = "measure_noise";
}

/// Capability id for a device alarm slot.
pub fn alarm_capability_id(slot: u8) -> String {
    format!("alarm.{slot}")
}

/// Parse an `alarm.{slot}` id back to its slot number.
pub fn parse_alarm_capability(id: &str) -> Option<u8> {
    id.strip_prefix("alarm.")?.parse().ok()
}

/// Display title for an alarm capability: the wake time, with a bolt
/// marking power-wake alarms.
pub fn alarm_title(slot: &AlarmSlot) -> String {
    let time = slot.formatted_time();
    if slot.power_wake {
        format!("{time} ⚡")
    } else {
        time
    }
}

/// Slots that currently have an alarm capability on the device entry.
#[derive(Debug, Default)]
pub struct AlarmRegistry {
    slots: BTreeMap<u8, String>,
}

impl AlarmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, slot: u8) -> String {
        let id = alarm_capability_id(slot);
        self.slots.insert(slot, id.clone());
        id
    }

    pub fn unbind(&mut self, slot: u8) -> Option<String> {
        self.slots.remove(&slot)
    }

    pub fn contains(&self, slot: u8) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> impl Iterator<Item = u8> + '_ {
        self.slots.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dawnlink_api::{Repetition, WeekdaySet};

    fn slot(power_wake: bool) -> AlarmSlot {
        AlarmSlot {
            slot: 2,
            enabled: true,
            power_wake,
            hour: 7,
            minute: 5,
            repetition: Repetition::Weekly(WeekdaySet::WEEKDAYS),
        }
    }

    #[test]
    fn alarm_ids_round_trip() {
        assert_eq!(alarm_capability_id(7), "alarm.7");
        assert_eq!(parse_alarm_capability("alarm.7"), Some(7));
        assert_eq!(parse_alarm_capability("alarm.x"), None);
        assert_eq!(parse_alarm_capability("onoff.mainlight"), None);
    }

    #[test]
    fn title_pads_time_and_marks_power_wake() {
        assert_eq!(alarm_title(&slot(false)), "07:05");
        assert_eq!(alarm_title(&slot(true)), "07:05 ⚡");
    }

    #[test]
    fn registry_tracks_bound_slots() {
        let mut registry = AlarmRegistry::new();
        assert!(registry.is_empty());

        assert_eq!(registry.bind(3), "alarm.3");
        assert!(registry.contains(3));
        assert!(!registry.contains(4));

        assert_eq!(registry.unbind(3), Some("alarm.3".into()));
        assert!(!registry.contains(3));
        assert_eq!(registry.unbind(3), None);
    }
}
