// Device client modules
//
// Hand-written client for the appliance's local control endpoints. Each
// resource (sensors, light, programs, alarms, player, system) implements
// its operations as inherent methods in its own file, keeping this module
// focused on construction and path plumbing.

use url::Url;

use crate::error::Error;
use crate::transport::{Transport, TransportConfig};

mod alarms;
mod light;
mod player;
mod programs;
mod sensors;
mod system;

/// Typed client for one wake-up-light appliance.
///
/// A thin layer over [`Transport`]: every method is a single GET or
/// partial-object PUT with payload shaping. All calls share the
/// transport's single-flight pacing, so the client is safe to share
/// across concurrent tasks.
pub struct DeviceClient {
    transport: Transport,
}

impl DeviceClient {
    /// Connect to a device by host address.
    ///
    /// The control API lives under `https://{host}/di/v1/products/1`.
    pub fn new(host: &str, config: TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("https://{host}/di/v1/products/1"))?;
        Ok(Self {
            transport: Transport::new(base_url, config)?,
        })
    }

    /// Build a client against an explicit base URL.
    ///
    /// Intended for tests pointing at a local mock server.
    pub fn with_base_url(base_url: Url, config: TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            transport: Transport::new(base_url, config)?,
        })
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        self.transport.base_url()
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }
}
