// ── Core error types ──
//
// User-facing errors from dawnlink-core. Consumers never see raw HTTP
// statuses or JSON parse failures; the `From<dawnlink_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

use crate::platform::PlatformError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Device errors ────────────────────────────────────────────────
    #[error("Device not responding: {reason}")]
    DeviceUnavailable { reason: String },

    #[error("All alarm slots on the device are occupied")]
    SlotsExhausted,

    /// The device rejected a request or answered nonsense.
    #[error("Device API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Platform errors ──────────────────────────────────────────────
    #[error("Platform error: {message}")]
    Platform { message: String },

    /// A referenced entity vanished on the other side. Resolved by
    /// pruning the local link, not surfaced to the user.
    #[error("Stale reference: {entity}")]
    StaleReference { entity: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("State store error: {message}")]
    Store { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dawnlink_api::Error> for CoreError {
    fn from(err: dawnlink_api::Error) -> Self {
        match err {
            dawnlink_api::Error::SlotsExhausted => CoreError::SlotsExhausted,
            dawnlink_api::Error::Transport(ref e) if e.is_timeout() || e.is_connect() => {
                CoreError::DeviceUnavailable {
                    reason: e.to_string(),
                }
            }
            dawnlink_api::Error::Transport(e) => CoreError::Api {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            dawnlink_api::Error::Http { status, body } => CoreError::Api {
                message: body,
                status: Some(status),
            },
            dawnlink_api::Error::Serialization(message) => {
                CoreError::Internal(format!("Serialization error: {message}"))
            }
            dawnlink_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            dawnlink_api::Error::InconsistentAlarmData(detail) => CoreError::Api {
                message: format!("Inconsistent alarm arrays: {detail}"),
                status: None,
            },
            dawnlink_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            dawnlink_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
        }
    }
}

impl From<PlatformError> for CoreError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Gone => CoreError::StaleReference {
                entity: "platform alarm".into(),
            },
            PlatformError::Other(message) => CoreError::Platform { message },
        }
    }
}
