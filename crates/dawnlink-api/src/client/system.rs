// Display, last-event, and factory-reset endpoints.

use serde_json::json;
use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{DeviceEvent, DisplayState};

impl DeviceClient {
    /// Read the display state.
    ///
    /// `GET /wusts`
    pub async fn display_state(&self) -> Result<DisplayState, Error> {
        self.transport().get("wusts").await
    }

    /// Write display always-on and brightness.
    ///
    /// `PUT /wusts`
    pub async fn set_display(
        &self,
        always_on: bool,
        brightness: u8,
    ) -> Result<DisplayState, Error> {
        debug!(always_on, brightness, "writing display settings");
        self.transport()
            .put("wusts", &json!({ "dspon": always_on, "brght": brightness }))
            .await
    }

    /// Read the most recent device-triggered transition (physical
    /// controls). The feed holds exactly one event; consumers poll it.
    ///
    /// `GET /dataupload/event.1/data`
    pub async fn last_event(&self) -> Result<DeviceEvent, Error> {
        self.transport().get("dataupload/event.1/data").await
    }

    /// Factory-reset the device. The device reboots and drops the
    /// connection; the empty response body is expected.
    ///
    /// `PUT /fac`
    pub async fn factory_reset(&self) -> Result<(), Error> {
        debug!("factory reset requested");
        self.transport().put_discard("fac", &json!({ "reset": 1 })).await
    }
}
