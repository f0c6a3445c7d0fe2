use thiserror::Error;

/// Top-level error type for the `dawnlink-api` crate.
///
/// Covers transport failures, HTTP-level rejections, and the one
/// domain error the device itself can produce (a full alarm table).
/// `dawnlink-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, reset, timeout, ...).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status after retries were exhausted.
    ///
    /// 4xx statuses are never retried; 5xx statuses land here only
    /// once the retry budget is spent.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// A request body failed to serialize; nothing was sent.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The two alarm endpoint arrays disagree on length; the device
    /// returned a torn snapshot.
    #[error("Inconsistent alarm arrays from device: {0}")]
    InconsistentAlarmData(String),

    // ── Domain ──────────────────────────────────────────────────────
    /// Every alarm slot on the device is occupied (device ceiling 16).
    #[error("All alarm slots on the device are occupied")]
    SlotsExhausted,
}

impl Error {
    /// Returns `true` if this is a transient failure worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the device rejected the request outright (4xx).
    pub fn is_permanent_rejection(&self) -> bool {
        matches!(self, Self::Http { status, .. } if (400..500).contains(status))
    }

    /// The HTTP status code, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
