// ── Bridge configuration ──
//
// Describes how the session polls the device and what the program
// toggles write. Built by the platform glue and handed in; core never
// reads config files. Validation happens at the config-change boundary:
// an invalid config is rejected and the previous one stays in force.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Bidirectional alarm sync settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSyncConfig {
    /// Mirror device alarms into the platform's alarm manager and adopt
    /// prefixed platform alarms onto the device.
    pub enabled: bool,
    /// Name prefix marking platform alarms that belong to this bridge.
    pub name_prefix: String,
}

impl Default for AlarmSyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            name_prefix: "Wake-up light".into(),
        }
    }
}

/// Sunset program settings applied when the sunset toggle turns on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunsetConfig {
    pub duration_min: u8,
    pub light_intensity: u8,
    pub color_scheme: u8,
    /// Ambient sound selection: a numeric string picks a built-in sound
    /// ("1".."8", device source "dus"), "fmr" plays the configured radio
    /// channel, "aux" and "off" pass through.
    pub ambient_sound: String,
    /// Radio channel preset used when `ambient_sound` is "fmr".
    pub radio_channel: String,
    pub volume: u8,
}

impl Default for SunsetConfig {
    fn default() -> Self {
        Self {
            duration_min: 30,
            light_intensity: 20,
            color_scheme: 0,
            ambient_sound: "1".into(),
            radio_channel: "1".into(),
            volume: 12,
        }
    }
}

/// Relax-breathe guidance selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceKind {
    Light,
    Sound,
}

/// Relax-breathe program settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaxConfig {
    pub duration_min: u8,
    /// Breathing pace as shown in the UI; the device takes `pace - 3`.
    pub pace: u8,
    pub guidance: GuidanceKind,
    pub light_intensity: u8,
    pub volume: u8,
}

impl Default for RelaxConfig {
    fn default() -> Self {
        Self {
            duration_min: 10,
            pace: 4,
            guidance: GuidanceKind::Light,
            light_intensity: 20,
            volume: 12,
        }
    }
}

/// Display settings pushed to the device when they change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub always_on: bool,
    /// 1..=6 on current firmware.
    pub brightness: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            always_on: false,
            brightness: 4,
        }
    }
}

/// Sunrise preview settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SunrisePreviewConfig {
    pub enabled: bool,
    pub color_scheme: u8,
}

/// Full bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Environment sensor poll period.
    pub sensors_interval: Duration,
    /// Fast function refresh period (light state + last event).
    pub functions_interval: Duration,
    /// Alarm reconciliation period.
    pub alarms_interval: Duration,
    pub alarm_sync: AlarmSyncConfig,
    pub sunset: SunsetConfig,
    pub relax: RelaxConfig,
    pub display: DisplayConfig,
    pub sunrise_preview: SunrisePreviewConfig,
    /// Display names for the five radio channel presets, in order.
    /// Empty means unconfigured: channel-name queries return nothing.
    pub radio_channel_names: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sensors_interval: Duration::from_secs(30),
            functions_interval: Duration::from_secs(5),
            alarms_interval: Duration::from_secs(300),
            alarm_sync: AlarmSyncConfig::default(),
            sunset: SunsetConfig::default(),
            relax: RelaxConfig::default(),
            display: DisplayConfig::default(),
            sunrise_preview: SunrisePreviewConfig::default(),
            radio_channel_names: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Validate at the config-change boundary.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.sensors_interval.is_zero()
            || self.functions_interval.is_zero()
            || self.alarms_interval.is_zero()
        {
            return Err(invalid("polling intervals must be non-zero"));
        }
        if self.alarm_sync.enabled && self.alarm_sync.name_prefix.trim().is_empty() {
            return Err(invalid("alarm sync requires a non-empty name prefix"));
        }
        if self.relax.pace < 3 {
            return Err(invalid("relax pace must be at least 3"));
        }
        if !(1..=6).contains(&self.display.brightness) {
            return Err(invalid("display brightness must be within 1..=6"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> CoreError {
    CoreError::Config {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(BridgeConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_intervals() {
        let config = BridgeConfig {
            alarms_interval: Duration::ZERO,
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config { .. })));
    }

    #[test]
    fn rejects_empty_prefix_when_sync_enabled() {
        let config = BridgeConfig {
            alarm_sync: AlarmSyncConfig {
                enabled: true,
                name_prefix: "  ".into(),
            },
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config { .. })));
    }

    #[test]
    fn rejects_out_of_range_brightness() {
        let config = BridgeConfig {
            display: DisplayConfig {
                always_on: false,
                brightness: 9,
            },
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config { .. })));
    }
}
