// Audio player and FM radio endpoints.

use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{PlayerState, RadioPresets};

impl DeviceClient {
    /// Read the player state.
    ///
    /// `GET /wuply`
    pub async fn player_state(&self) -> Result<PlayerState, Error> {
        self.transport().get("wuply").await
    }

    /// Write the player state (partial object).
    ///
    /// `PUT /wuply`
    pub async fn set_player(&self, state: &PlayerState) -> Result<PlayerState, Error> {
        debug!(onoff = ?state.onoff, source = ?state.snddv, "writing player state");
        self.transport().put("wuply", state).await
    }

    /// Read the FM preset frequency table.
    ///
    /// `GET /wufmr`
    pub async fn radio_presets(&self) -> Result<RadioPresets, Error> {
        self.transport().get("wufmr").await
    }

    /// Write the FM preset frequency table.
    ///
    /// `PUT /wufmr`
    pub async fn set_radio_presets(&self, presets: &RadioPresets) -> Result<RadioPresets, Error> {
        debug!("writing radio presets");
        self.transport().put("wufmr", presets).await
    }
}
