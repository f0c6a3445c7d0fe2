// Wire types for the device's JSON API.
//
// Field names are the firmware's own abbreviations (`mslux`, `prfen`,
// `daynm`, ...) — the device is partially typed and inconsistent about
// field presence, so reads use `#[serde(default)]` liberally and writes
// are partial objects built per operation with `skip_serializing_if`.

use serde::{Deserialize, Serialize};

use crate::repetition::Repetition;

// ── Sensors ──────────────────────────────────────────────────────────

/// Environment sensor snapshot from `GET /wusrd`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SensorReadings {
    /// Ambient light, lux.
    #[serde(default)]
    pub mslux: f64,
    /// Temperature, °C (or °F, per device region setting).
    #[serde(default)]
    pub mstmp: f64,
    /// Relative humidity, %.
    #[serde(default)]
    pub msrhu: f64,
    /// Sound level, dB.
    #[serde(default)]
    pub mssnd: f64,
}

// ── Display ──────────────────────────────────────────────────────────

/// Display state from `GET|PUT /wusts`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DisplayState {
    /// Display permanently on vs. auto-dimming after a timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dspon: Option<bool>,
    /// Display brightness level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brght: Option<u8>,
}

// ── Light ────────────────────────────────────────────────────────────

/// Light channel state from `GET|PUT /wulgt`.
///
/// One hardware light channel backs the main light, the night light, and
/// the sunrise preview; the write helpers on `DeviceClient` encode the
/// mutual exclusion between them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LightState {
    /// Main light on/off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onoff: Option<bool>,
    /// Main light brightness level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ltlvl: Option<u8>,
    /// Sunrise preview active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempy: Option<bool>,
    /// Sunrise color scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctype: Option<u8>,
    /// Night light on/off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ngtlt: Option<bool>,
}

// ── Programs ─────────────────────────────────────────────────────────

/// Sunset program settings, `GET|PUT /wudsk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SunsetSettings {
    /// Duration in minutes.
    pub durat: u8,
    pub onoff: bool,
    /// Light intensity curve.
    pub curve: u8,
    /// Color scheme.
    pub ctype: u8,
    /// Sound source: "off", "dus" (ambient), "fmr" (radio), "aux".
    pub snddv: String,
    /// Channel or preset for the selected source.
    pub sndch: String,
    /// Sound volume.
    pub sndlv: u8,
}

/// Guidance mode for the relax-breathe program.
///
/// The firmware rejects payloads that carry both the light-intensity and
/// volume fields, so the write side is a tagged union: exactly one of the
/// two is serialized per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxGuidance {
    /// Light-guided breathing at the given intensity.
    Light { intensity: u8 },
    /// Sound-guided breathing at the given volume.
    Sound { volume: u8 },
}

/// Relax-breathe program settings as read from `GET /wurlx`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RelaxState {
    #[serde(default)]
    pub durat: u8,
    #[serde(default)]
    pub onoff: bool,
    /// Breathing pace (UI pace minus 3).
    #[serde(default)]
    pub progr: u8,
    /// Guidance type: 0 = light, 1 = sound.
    #[serde(default)]
    pub rtype: u8,
    #[serde(default)]
    pub intny: Option<u8>,
    #[serde(default)]
    pub sndlv: Option<u8>,
}

/// Write payload for `PUT /wurlx`; built from [`RelaxGuidance`].
#[derive(Debug, Clone, Serialize)]
pub struct RelaxWrite {
    pub durat: u8,
    pub onoff: bool,
    pub progr: u8,
    pub rtype: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intny: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sndlv: Option<u8>,
}

/// Bedtime tracking state, `GET|PUT /wungt`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BedtimeState {
    pub night: bool,
}

// ── Alarms ───────────────────────────────────────────────────────────

/// Alarm enablement arrays from `GET /wualm/aenvs`.
///
/// Positional: index `i` describes slot `i + 1`. `prfvs[i]` is the
/// *activated* flag (slot holds a live alarm vs. free); `prfen[i]` is the
/// *enabled* flag of that alarm. The two are distinct: "deleting" an alarm
/// only clears `prfvs`, the record itself stays.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlarmStates {
    #[serde(default)]
    pub prfen: Vec<bool>,
    #[serde(default)]
    pub prfvs: Vec<bool>,
    /// Power-wake active per slot (0/1).
    #[serde(default)]
    pub pwrsv: Vec<u8>,
}

/// Alarm schedule arrays from `GET /wualm/aalms`, joined positionally
/// with [`AlarmStates`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlarmSchedules {
    #[serde(default)]
    pub almhr: Vec<u8>,
    #[serde(default)]
    pub almmn: Vec<u8>,
    #[serde(default)]
    pub daynm: Vec<u8>,
}

/// Single-slot write payload for `PUT /wualm/prfwu`.
///
/// Partial object: absent fields are left untouched by the firmware.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlarmSlotWrite {
    /// Slot number, 1-based.
    pub prfnr: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prfen: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prfvs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub almhr: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub almmn: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daynm: Option<u8>,
    /// Power-wake on/off (0/1).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pwrsz: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pszhr: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pszmn: Option<u8>,
}

/// Response to a single-slot write.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlarmSlotState {
    #[serde(default)]
    pub prfnr: u8,
    #[serde(default)]
    pub prfen: bool,
    #[serde(default)]
    pub prfvs: bool,
    #[serde(default)]
    pub almhr: u8,
    #[serde(default)]
    pub almmn: u8,
    #[serde(default)]
    pub daynm: Option<u8>,
}

// ── Domain alarm types ───────────────────────────────────────────────

/// One activated alarm slot, decoded from the positional arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmSlot {
    /// Slot number, 1-based, dense up to the device capacity.
    pub slot: u8,
    pub enabled: bool,
    /// Early supplementary wake trigger active.
    pub power_wake: bool,
    pub hour: u8,
    pub minute: u8,
    pub repetition: Repetition,
}

impl AlarmSlot {
    /// `HH:MM`, as shown in capability titles and platform alarms.
    pub fn formatted_time(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

/// New alarm definition for claiming a free slot.
#[derive(Debug, Clone, Copy)]
pub struct AlarmSpec {
    pub enabled: bool,
    pub hour: u8,
    pub minute: u8,
    pub repetition: Repetition,
    /// Minutes before the main time to fire the power-wake trigger.
    pub power_wake_offset: Option<u8>,
}

/// The device's full alarm table: activated slots plus the slot ceiling.
#[derive(Debug, Clone)]
pub struct AlarmTable {
    pub slots: Vec<AlarmSlot>,
    /// Total slot count on the device (16 on current firmware).
    pub capacity: usize,
}

impl AlarmTable {
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    pub fn get(&self, slot: u8) -> Option<&AlarmSlot> {
        self.slots.iter().find(|s| s.slot == slot)
    }
}

// ── Events ───────────────────────────────────────────────────────────

/// Wire names of the device-triggered transitions reported by the
/// last-event feed. Anything else the feed produces is ignorable noise.
pub mod event_names {
    pub const MAIN_LIGHT_ON: &str = "startlight";
    pub const MAIN_LIGHT_OFF: &str = "stoplight";
    pub const NIGHT_LIGHT_ON: &str = "nightlighton";
    pub const NIGHT_LIGHT_OFF: &str = "nightlightoff";
    pub const SUNSET_ON: &str = "startdusk";
    pub const SUNSET_OFF: &str = "enddusk";
    pub const RELAX_ON: &str = "startrelax";
    pub const RELAX_OFF: &str = "endrelax";
    pub const BEDTIME_ON: &str = "go2bed";
    pub const BEDTIME_OFF: &str = "endbed";
}

/// Most recent device-triggered transition, `GET /dataupload/event.1/data`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceEvent {
    #[serde(default)]
    pub event: String,
    /// Main light level at the time of the event.
    #[serde(default)]
    pub ltlvl: Option<u8>,
}

// ── Player / radio ───────────────────────────────────────────────────

/// Audio player state, `GET|PUT /wuply`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onoff: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdvol: Option<u8>,
    /// Source: "off", "dus", "fmr", "aux".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snddv: Option<String>,
    /// Channel or preset for the selected source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sndch: Option<String>,
}

/// FM preset frequency table, `GET|PUT /wufmr`.
///
/// Keys are preset numbers "1".."5", values are frequencies ("92.60").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RadioPresets {
    #[serde(flatten)]
    pub frequencies: std::collections::BTreeMap<String, String>,
}
