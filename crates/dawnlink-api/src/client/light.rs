// Light channel endpoints.
//
// One hardware light channel backs three logical functions: the main
// light, the night light, and the sunrise preview. The device does not
// reject conflicting writes — it silently keeps whatever arrived last —
// so every write here spells out the fields that force the other two
// functions off. This mutual exclusion mirrors the firmware and must
// not be "simplified" away.

use serde_json::json;
use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::LightState;

impl DeviceClient {
    /// Read the light channel state.
    ///
    /// `GET /wulgt`
    pub async fn light_state(&self) -> Result<LightState, Error> {
        self.transport().get("wulgt").await
    }

    /// Switch the main light, optionally setting brightness in the same
    /// write. Always cancels the sunrise preview and the night light.
    ///
    /// `PUT /wulgt`
    pub async fn set_main_light(
        &self,
        enabled: bool,
        brightness: Option<u8>,
    ) -> Result<LightState, Error> {
        debug!(enabled, ?brightness, "switching main light");
        let body = match brightness {
            Some(level) => json!({
                "onoff": enabled,
                "tempy": false,
                "ngtlt": false,
                "ltlvl": level,
            }),
            None => json!({ "onoff": enabled, "tempy": false, "ngtlt": false }),
        };
        self.transport().put("wulgt", &body).await
    }

    /// Adjust main light brightness without touching the on/off state.
    ///
    /// `PUT /wulgt`
    pub async fn set_main_light_brightness(&self, level: u8) -> Result<LightState, Error> {
        debug!(level, "changing main light brightness");
        self.transport().put("wulgt", &json!({ "ltlvl": level })).await
    }

    /// Switch the night light. Forces the main light and preview off.
    ///
    /// `PUT /wulgt`
    pub async fn set_night_light(&self, enabled: bool) -> Result<LightState, Error> {
        debug!(enabled, "switching night light");
        self.transport()
            .put("wulgt", &json!({ "onoff": false, "tempy": false, "ngtlt": enabled }))
            .await
    }

    /// Switch the sunrise preview with a color scheme. Preview rides the
    /// main light channel (`onoff` and `tempy` move together) and forces
    /// the night light off.
    ///
    /// `PUT /wulgt`
    pub async fn set_sunrise_preview(
        &self,
        enabled: bool,
        color_scheme: u8,
    ) -> Result<LightState, Error> {
        debug!(enabled, color_scheme, "switching sunrise preview");
        self.transport()
            .put(
                "wulgt",
                &json!({
                    "onoff": enabled,
                    "tempy": enabled,
                    "ctype": color_scheme,
                    "ngtlt": false,
                }),
            )
            .await
    }
}
