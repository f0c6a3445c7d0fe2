// ── Platform collaborator traits ──
//
// The home-automation platform side of the bridge: its alarm manager,
// the per-device capability surface, and user notifications. These are
// external collaborators specified only at their interface; the platform
// glue implements them, tests use fakes.

use async_trait::async_trait;
use dawnlink_api::WeekdaySet;
use serde_json::Value;
use thiserror::Error;

/// Failure from a platform collaborator.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The target entity no longer exists. Callers treat this as
    /// "already gone", never as a hard failure.
    #[error("target no longer exists")]
    Gone,

    #[error("{0}")]
    Other(String),
}

/// An alarm as stored by the platform's alarm manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalAlarm {
    /// Opaque platform-assigned id.
    pub id: String,
    pub name: String,
    /// `HH:MM`.
    pub time: String,
    pub enabled: bool,
    pub repetition: WeekdaySet,
}

/// Definition for a new platform alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlarm {
    pub name: String,
    pub time: String,
    pub enabled: bool,
    pub repetition: WeekdaySet,
}

/// Fields to change on an existing platform alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmPatch {
    pub time: String,
    pub enabled: bool,
    pub repetition: WeekdaySet,
}

/// The platform's alarm storage, consumed only through CRUD.
///
/// The platform serializes its own writes; no extra locking is needed
/// around concurrent calls.
#[async_trait]
pub trait AlarmManager: Send + Sync {
    async fn list(&self) -> Result<Vec<ExternalAlarm>, PlatformError>;

    /// Create an alarm, returning its platform-assigned id.
    async fn create(&self, alarm: NewAlarm) -> Result<String, PlatformError>;

    /// May answer [`PlatformError::Gone`] if the alarm was deleted on
    /// the platform since the last pass.
    async fn update(&self, id: &str, patch: AlarmPatch) -> Result<(), PlatformError>;

    /// May answer [`PlatformError::Gone`]; callers treat that as success.
    async fn delete(&self, id: &str) -> Result<(), PlatformError>;
}

/// The platform's per-device capability surface.
#[async_trait]
pub trait CapabilityHost: Send + Sync {
    /// Ids of all capabilities currently present on the device entry.
    async fn capabilities(&self) -> Vec<String>;

    async fn add_capability(&self, id: &str) -> Result<(), PlatformError>;

    async fn remove_capability(&self, id: &str) -> Result<(), PlatformError>;

    async fn set_value(&self, id: &str, value: Value) -> Result<(), PlatformError>;

    /// Update the display title of a capability.
    async fn set_title(&self, id: &str, title: &str) -> Result<(), PlatformError>;

    async fn set_available(&self);

    async fn set_unavailable(&self, reason: &str);
}

/// Transient user-visible messages (slot exhaustion, polling toggles,
/// created alarms). Formatting is the platform's concern.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, excerpt: &str);
}
