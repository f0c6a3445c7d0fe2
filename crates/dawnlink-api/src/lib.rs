// dawnlink-api: async client for the wake-up light's local control API.

pub mod client;
pub mod error;
pub mod models;
pub mod repetition;
pub mod transport;

pub use client::DeviceClient;
pub use error::Error;
pub use models::{
    AlarmSlot, AlarmSpec, AlarmTable, BedtimeState, DeviceEvent, DisplayState, LightState,
    PlayerState, RadioPresets, RelaxGuidance, RelaxState, SensorReadings, SunsetSettings,
    event_names,
};
pub use repetition::{Repetition, Weekday, WeekdaySet};
pub use transport::{Transport, TransportConfig};
