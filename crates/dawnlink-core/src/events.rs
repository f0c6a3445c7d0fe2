// ── Device event → capability mapping ──
//
// The device records the last notable thing it did (sunrise started,
// night light off, ...). The fast poll reads that event and folds it
// into the program toggles so the platform reflects what the hardware
// is actually doing.

use dawnlink_api::models::event_names as ev;

use crate::capability::ids;

/// A device function mirrored as an on/off capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFunction {
    MainLight,
    NightLight,
    Sunset,
    RelaxBreathe,
    BedtimeTracking,
}

impl DeviceFunction {
    pub fn capability_id(self) -> &'static str {
        match self {
            DeviceFunction::MainLight => ids::MAIN_LIGHT,
            DeviceFunction::NightLight => ids::NIGHT_LIGHT,
            DeviceFunction::Sunset => ids::SUNSET,
            DeviceFunction::RelaxBreathe => ids::RELAX_BREATHE,
            DeviceFunction::BedtimeTracking => ids::BEDTIME_TRACKING,
        }
    }
}

/// Map a last-event name to the function it switched and its new state.
/// Unknown events answer `None` and are ignored.
pub fn function_transition(event: &str) -> Option<(DeviceFunction, bool)> {
    match event {
        ev::MAIN_LIGHT_ON => Some((DeviceFunction::MainLight, true)),
        ev::MAIN_LIGHT_OFF => Some((DeviceFunction::MainLight, false)),
        ev::NIGHT_LIGHT_ON => Some((DeviceFunction::NightLight, true)),
        ev::NIGHT_LIGHT_OFF => Some((DeviceFunction::NightLight, false)),
        ev::SUNSET_ON => Some((DeviceFunction::Sunset, true)),
        ev::SUNSET_OFF => Some((DeviceFunction::Sunset, false)),
        ev::RELAX_ON => Some((DeviceFunction::RelaxBreathe, true)),
        ev::RELAX_OFF => Some((DeviceFunction::RelaxBreathe, false)),
        ev::BEDTIME_ON => Some((DeviceFunction::BedtimeTracking, true)),
        ev::BEDTIME_OFF => Some((DeviceFunction::BedtimeTracking, false)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_events_map_to_function_states() {
        assert_eq!(
            function_transition(ev::SUNSET_ON),
            Some((DeviceFunction::Sunset, true))
        );
        assert_eq!(
            function_transition(ev::NIGHT_LIGHT_OFF),
            Some((DeviceFunction::NightLight, false))
        );
        assert_eq!(
            function_transition(ev::BEDTIME_ON),
            Some((DeviceFunction::BedtimeTracking, true))
        );
    }

    #[test]
    fn unknown_events_are_ignored() {
        assert_eq!(function_transition("wurdewurde"), None);
        assert_eq!(function_transition(""), None);
    }

    #[test]
    fn every_function_has_a_distinct_capability() {
        let ids = [
            DeviceFunction::MainLight,
            DeviceFunction::NightLight,
            DeviceFunction::Sunset,
            DeviceFunction::RelaxBreathe,
            DeviceFunction::BedtimeTracking,
        ]
        .map(DeviceFunction::capability_id);
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
