// dawnlink-core: session lifecycle and alarm reconciliation between a
// wake-up light and its home-automation platform.

pub mod capability;
pub mod config;
pub mod error;
pub mod events;
pub mod platform;
mod reconcile;
pub mod scheduler;
pub mod session;
pub mod store;

pub use capability::{alarm_capability_id, alarm_title, parse_alarm_capability};
pub use config::{
    AlarmSyncConfig, BridgeConfig, DisplayConfig, GuidanceKind, RelaxConfig, SunrisePreviewConfig,
    SunsetConfig,
};
pub use error::CoreError;
pub use events::{DeviceFunction, function_transition};
pub use platform::{
    AlarmManager, AlarmPatch, CapabilityHost, ExternalAlarm, NewAlarm, Notifier, PlatformError,
};
pub use session::{DeviceSession, SessionHandles};
pub use store::{AlarmLink, JsonFileStore, MemoryStore, PersistedState, StateStore};
