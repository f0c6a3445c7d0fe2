// Environment sensor endpoint.

use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::SensorReadings;

impl DeviceClient {
    /// Read the environment sensors.
    ///
    /// `GET /wusrd`
    pub async fn sensors(&self) -> Result<SensorReadings, Error> {
        debug!("reading sensors");
        self.transport().get("wusrd").await
    }
}
