// Sunset, relax-breathe, and bedtime-tracking program endpoints.

use serde_json::json;
use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{BedtimeState, RelaxGuidance, RelaxState, RelaxWrite, SunsetSettings};

impl DeviceClient {
    /// Read the sunset program settings.
    ///
    /// `GET /wudsk`
    pub async fn sunset_settings(&self) -> Result<SunsetSettings, Error> {
        self.transport().get("wudsk").await
    }

    /// Write the sunset program as one composite settings object.
    ///
    /// `PUT /wudsk`
    pub async fn set_sunset(&self, settings: &SunsetSettings) -> Result<SunsetSettings, Error> {
        debug!(onoff = settings.onoff, durat = settings.durat, "writing sunset program");
        self.transport().put("wudsk", settings).await
    }

    /// Read the relax-breathe program settings.
    ///
    /// `GET /wurlx`
    pub async fn relax_state(&self) -> Result<RelaxState, Error> {
        self.transport().get("wurlx").await
    }

    /// Write the relax-breathe program.
    ///
    /// The payload is conditionally shaped by guidance mode: light guidance
    /// sends only `intny`, sound guidance sends only `sndlv`. The firmware
    /// rejects payloads carrying the other combination.
    ///
    /// `PUT /wurlx`
    pub async fn set_relax(
        &self,
        enabled: bool,
        duration: u8,
        pace: u8,
        guidance: RelaxGuidance,
    ) -> Result<RelaxState, Error> {
        let (rtype, intny, sndlv) = match guidance {
            RelaxGuidance::Light { intensity } => (0, Some(intensity), None),
            RelaxGuidance::Sound { volume } => (1, None, Some(volume)),
        };
        debug!(enabled, duration, pace, rtype, "writing relax program");

        let body = RelaxWrite {
            durat: duration,
            onoff: enabled,
            progr: pace,
            rtype,
            intny,
            sndlv,
        };
        self.transport().put("wurlx", &body).await
    }

    /// Read the bedtime-tracking state.
    ///
    /// `GET /wungt`
    pub async fn bedtime_state(&self) -> Result<BedtimeState, Error> {
        self.transport().get("wungt").await
    }

    /// Switch bedtime tracking.
    ///
    /// `PUT /wungt`
    pub async fn set_bedtime_tracking(&self, enabled: bool) -> Result<BedtimeState, Error> {
        debug!(enabled, "switching bedtime tracking");
        self.transport().put("wungt", &json!({ "night": enabled })).await
    }
}
