// ── Device session ──
//
// One session per paired device. Owns the HTTP client, the platform
// collaborators, the persisted slot links, and the three poll timers.
// All mutation funnels through here so the reconciler sees a consistent
// view of the link table.

use std::collections::BTreeMap;
use std::sync::Arc;

use dawnlink_api::models::SunsetSettings;
use dawnlink_api::{DeviceClient, RelaxGuidance};
use serde_json::json;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capability::{AlarmRegistry, ids, parse_alarm_capability};
use crate::config::{BridgeConfig, GuidanceKind, SunsetConfig};
use crate::error::CoreError;
use crate::events::function_transition;
use crate::platform::{AlarmManager, CapabilityHost, Notifier};
use crate::scheduler::{Timers, spawn_interval};
use crate::store::{AlarmLink, PersistedState, StateStore};

/// Main light brightness ceiling on the wire (`ltlvl`).
const MAX_BRIGHTNESS: u8 = 25;

/// Number of FM radio presets on the device.
const RADIO_PRESET_COUNT: usize = 5;

/// Collaborators handed in by the platform glue.
pub struct SessionHandles {
    pub device: DeviceClient,
    pub alarms: Arc<dyn AlarmManager>,
    pub host: Arc<dyn CapabilityHost>,
    pub notifier: Arc<dyn Notifier>,
    pub store: Arc<dyn StateStore>,
}

pub(crate) struct SessionInner {
    pub(crate) device: DeviceClient,
    pub(crate) alarms: Arc<dyn AlarmManager>,
    pub(crate) host: Arc<dyn CapabilityHost>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) store: Arc<dyn StateStore>,
    pub(crate) config: Mutex<BridgeConfig>,
    /// Slot → platform link table. Held across a whole reconcile pass.
    pub(crate) links: Mutex<BTreeMap<u8, AlarmLink>>,
    /// Slots that currently have an alarm capability; toggle events for
    /// slots outside the registry are stale and dropped.
    pub(crate) registry: Mutex<AlarmRegistry>,
    pub(crate) polling: Mutex<bool>,
    available: watch::Sender<bool>,
    cancel: CancellationToken,
    timers: Mutex<Timers>,
}

/// Handle to a running session. Cheap to clone.
#[derive(Clone)]
pub struct DeviceSession {
    inner: Arc<SessionInner>,
}

impl DeviceSession {
    pub fn new(handles: SessionHandles, config: BridgeConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let (available, _) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(SessionInner {
                device: handles.device,
                alarms: handles.alarms,
                host: handles.host,
                notifier: handles.notifier,
                store: handles.store,
                config: Mutex::new(config),
                links: Mutex::new(BTreeMap::new()),
                registry: Mutex::new(AlarmRegistry::new()),
                polling: Mutex::new(true),
                available,
                cancel: CancellationToken::new(),
                timers: Mutex::new(Timers::default()),
            }),
        })
    }

    /// Observe device availability as seen by the fast function poll.
    pub fn availability(&self) -> watch::Receiver<bool> {
        self.inner.available.subscribe()
    }

    /// Load persisted state, rebuild the capability surface, run the
    /// initial sync passes, and start the poll timers.
    pub async fn start(&self) -> Result<(), CoreError> {
        let inner = &self.inner;
        let state = inner.store.load().await?;
        info!(
            links = state.links.len(),
            polling = state.polling_enabled,
            "starting device session"
        );

        {
            let mut links = inner.links.lock().await;
            let mut registry = inner.registry.lock().await;
            *links = state.links;
            for slot in links.keys().copied() {
                registry.bind(slot);
            }

            // Drop alarm capabilities that outlived their link (e.g. the
            // state file was reset while the platform entry kept them).
            for id in inner.host.capabilities().await {
                let stale = parse_alarm_capability(&id)
                    .is_some_and(|slot| !links.contains_key(&slot));
                if stale {
                    if let Err(e) = inner.host.remove_capability(&id).await {
                        warn!(capability = %id, error = %e, "failed to sweep stale capability");
                    }
                }
            }
        }
        *inner.polling.lock().await = state.polling_enabled;

        // Initial passes run once regardless of the polling flag; their
        // failures are logged, not fatal — an unplugged device must not
        // prevent the session from coming up.
        if let Err(e) = inner.sync_functions().await {
            warn!(error = %e, "initial function sync failed");
        }
        if let Err(e) = inner.sync_sensors().await {
            warn!(error = %e, "initial sensor sync failed");
        }
        if let Err(e) = inner.sync_alarms().await {
            warn!(error = %e, "initial alarm sync failed");
        }

        if *inner.polling.lock().await {
            inner.spawn_timers().await;
        }
        Ok(())
    }

    /// Stop the timers and persist the final state. In-flight poll
    /// passes run to completion first.
    pub async fn stop(&self) -> Result<(), CoreError> {
        let inner = &self.inner;
        inner.cancel.cancel();
        inner.timers.lock().await.shutdown_all().await;
        inner.persist().await
    }

    /// Run all three sync passes now.
    pub async fn force_sync(&self) -> Result<(), CoreError> {
        self.inner.sync_functions().await?;
        self.inner.sync_sensors().await?;
        self.inner.sync_alarms().await
    }

    /// Reconcile device alarm slots with the platform's alarm manager.
    pub async fn sync_alarms(&self) -> Result<(), CoreError> {
        self.inner.sync_alarms().await
    }

    pub async fn sync_sensors(&self) -> Result<(), CoreError> {
        self.inner.sync_sensors().await
    }

    pub async fn sync_functions(&self) -> Result<(), CoreError> {
        self.inner.sync_functions().await
    }

    /// Handle an on/off capability change coming from the platform.
    pub async fn on_capability_toggle(&self, id: &str, enabled: bool) -> Result<(), CoreError> {
        let inner = &self.inner;
        if let Some(slot) = parse_alarm_capability(id) {
            return inner.toggle_alarm_capability(slot, enabled).await;
        }
        match id {
            ids::MAIN_LIGHT => {
                inner.device.set_main_light(enabled, None).await?;
            }
            ids::NIGHT_LIGHT => {
                inner.device.set_night_light(enabled).await?;
            }
            ids::SUNSET => {
                let config = inner.config.lock().await.sunset.clone();
                inner
                    .device
                    .set_sunset(&sunset_payload(&config, enabled))
                    .await?;
            }
            ids::RELAX_BREATHE => {
                let relax = inner.config.lock().await.relax.clone();
                let guidance = match relax.guidance {
                    GuidanceKind::Light => RelaxGuidance::Light {
                        intensity: relax.light_intensity,
                    },
                    GuidanceKind::Sound => RelaxGuidance::Sound {
                        volume: relax.volume,
                    },
                };
                inner
                    .device
                    .set_relax(enabled, relax.duration_min, relax.pace - 3, guidance)
                    .await?;
            }
            ids::BEDTIME_TRACKING => {
                inner.device.set_bedtime_tracking(enabled).await?;
            }
            other => {
                return Err(CoreError::Internal(format!(
                    "toggle for unknown capability {other}"
                )));
            }
        }
        Ok(())
    }

    /// Handle a dim change (0.0..=1.0) from the platform.
    pub async fn set_dim(&self, level: f64) -> Result<(), CoreError> {
        let level = (level.clamp(0.0, 1.0) * f64::from(MAX_BRIGHTNESS)).round() as u8;
        self.inner.device.set_main_light_brightness(level).await?;
        Ok(())
    }

    /// Replace the configuration. An invalid config is rejected and the
    /// previous one stays in force; on success only the affected side
    /// effects run (display push, preview switch, timer restarts).
    pub async fn update_config(&self, new: BridgeConfig) -> Result<(), CoreError> {
        new.validate()?;
        let inner = &self.inner;
        let old = {
            let mut config = inner.config.lock().await;
            std::mem::replace(&mut *config, new.clone())
        };

        if new.display != old.display {
            inner
                .device
                .set_display(new.display.always_on, new.display.brightness)
                .await?;
        }

        if new.sunrise_preview != old.sunrise_preview {
            // A scheme change while the preview is lit needs an explicit
            // off first; the firmware ignores a bare scheme swap.
            if old.sunrise_preview.enabled && new.sunrise_preview.enabled {
                inner
                    .device
                    .set_sunrise_preview(false, old.sunrise_preview.color_scheme)
                    .await?;
            }
            inner
                .device
                .set_sunrise_preview(
                    new.sunrise_preview.enabled,
                    new.sunrise_preview.color_scheme,
                )
                .await?;
        }

        // Only the timer whose period changed is restarted; the others
        // keep their phase.
        if *inner.polling.lock().await {
            if new.sensors_interval != old.sensors_interval {
                inner.restart_sensors_timer().await;
            }
            if new.functions_interval != old.functions_interval {
                inner.restart_functions_timer().await;
            }
            if new.alarms_interval != old.alarms_interval {
                inner.restart_alarms_timer().await;
            }
        }

        let sync_turned_on = new.alarm_sync.enabled
            && (!old.alarm_sync.enabled || new.alarm_sync.name_prefix != old.alarm_sync.name_prefix);
        if sync_turned_on {
            inner.sync_alarms().await?;
        }
        Ok(())
    }

    /// Switch background polling on or off and persist the choice.
    pub async fn set_polling_enabled(&self, enabled: bool) -> Result<(), CoreError> {
        let inner = &self.inner;
        {
            let mut polling = inner.polling.lock().await;
            if *polling == enabled {
                return Ok(());
            }
            *polling = enabled;
        }
        if enabled {
            inner.spawn_timers().await;
        } else {
            inner.timers.lock().await.shutdown_all().await;
        }
        inner.persist().await?;
        inner
            .notifier
            .notify(if enabled {
                "Polling resumed"
            } else {
                "Polling paused"
            })
            .await;
        Ok(())
    }

    /// Factory-reset the device. The session keeps running; the next
    /// function poll reports the device unavailable while it reboots.
    pub async fn factory_reset(&self) -> Result<(), CoreError> {
        self.inner.device.factory_reset().await?;
        self.inner.notifier.notify("Factory reset requested").await;
        Ok(())
    }

    /// Display names for the radio channel presets, `(preset, name)`.
    /// Empty when no names are configured.
    pub async fn radio_channel_options(&self) -> Vec<(String, String)> {
        let names = self.inner.config.lock().await.radio_channel_names.clone();
        names
            .into_iter()
            .take(RADIO_PRESET_COUNT)
            .enumerate()
            .map(|(i, name)| ((i + 1).to_string(), name))
            .collect()
    }
}

impl SessionInner {
    async fn spawn_timers(self: &Arc<Self>) {
        self.restart_sensors_timer().await;
        self.restart_functions_timer().await;
        self.restart_alarms_timer().await;
    }

    async fn restart_sensors_timer(self: &Arc<Self>) {
        let period = self.config.lock().await.sensors_interval;
        let mut timers = self.timers.lock().await;
        if let Some(handle) = timers.sensors.take() {
            handle.shutdown().await;
        }
        let inner = Arc::clone(self);
        timers.sensors = Some(spawn_interval("sensors", period, &self.cancel, move || {
            let inner = Arc::clone(&inner);
            async move { inner.sync_sensors().await }
        }));
    }

    async fn restart_functions_timer(self: &Arc<Self>) {
        let period = self.config.lock().await.functions_interval;
        let mut timers = self.timers.lock().await;
        if let Some(handle) = timers.functions.take() {
            handle.shutdown().await;
        }
        let inner = Arc::clone(self);
        timers.functions = Some(spawn_interval("functions", period, &self.cancel, move || {
            let inner = Arc::clone(&inner);
            async move { inner.sync_functions().await }
        }));
    }

    async fn restart_alarms_timer(self: &Arc<Self>) {
        let period = self.config.lock().await.alarms_interval;
        let mut timers = self.timers.lock().await;
        if let Some(handle) = timers.alarms.take() {
            handle.shutdown().await;
        }
        let inner = Arc::clone(self);
        timers.alarms = Some(spawn_interval("alarms", period, &self.cancel, move || {
            let inner = Arc::clone(&inner);
            async move { inner.sync_alarms().await }
        }));
    }

    /// Poll the environment sensors. Failures here never flip
    /// availability; the function poll is the availability probe.
    pub(crate) async fn sync_sensors(&self) -> Result<(), CoreError> {
        let readings = self.device.sensors().await?;
        for (id, value) in [
            (ids::TEMPERATURE, readings.mstmp),
            (ids::HUMIDITY, readings.msrhu),
            (ids::LUMINANCE, readings.mslux),
            (ids::NOISE, readings.mssnd),
        ] {
            if let Err(e) = self.host.set_value(id, json!(value)).await {
                warn!(capability = id, error = %e, "failed to publish sensor value");
            }
        }
        Ok(())
    }

    /// Fast poll: light channel plus the last device-triggered event.
    /// Doubles as the availability probe.
    pub(crate) async fn sync_functions(&self) -> Result<(), CoreError> {
        let light = match self.device.light_state().await {
            Ok(light) => light,
            Err(e) => {
                let err = CoreError::from(e);
                self.host.set_unavailable(&err.to_string()).await;
                self.available.send_replace(false);
                return Err(err);
            }
        };
        self.host.set_available().await;
        self.available.send_replace(true);

        let preview = light.tempy.unwrap_or(false);
        let main_on = light.onoff.unwrap_or(false) && !preview;
        self.publish(ids::MAIN_LIGHT, json!(main_on)).await;
        self.publish(ids::NIGHT_LIGHT, json!(light.ngtlt.unwrap_or(false)))
            .await;
        if let Some(level) = light.ltlvl {
            let dim = f64::from(level.min(MAX_BRIGHTNESS)) / f64::from(MAX_BRIGHTNESS);
            self.publish(ids::DIM, json!(dim)).await;
        }

        match self.device.last_event().await {
            Ok(event) => {
                if let Some((function, on)) = function_transition(&event.event) {
                    self.publish(function.capability_id(), json!(on)).await;
                } else if !event.event.is_empty() {
                    debug!(event = %event.event, "ignoring unmapped device event");
                }
            }
            Err(e) => warn!(error = %e, "failed to read last device event"),
        }
        Ok(())
    }

    async fn toggle_alarm_capability(&self, slot: u8, enabled: bool) -> Result<(), CoreError> {
        if !self.registry.lock().await.contains(slot) {
            // Toggle raced a removal; the capability is already gone.
            debug!(slot, "dropping toggle for unbound alarm slot");
            return Ok(());
        }
        self.device.toggle_alarm(slot, enabled).await?;
        self.sync_alarms().await
    }

    async fn publish(&self, id: &str, value: serde_json::Value) {
        if let Err(e) = self.host.set_value(id, value).await {
            warn!(capability = id, error = %e, "failed to publish capability value");
        }
    }

    /// Snapshot links + polling flag and save them.
    pub(crate) async fn persist(&self) -> Result<(), CoreError> {
        let state = PersistedState {
            links: self.links.lock().await.clone(),
            polling_enabled: *self.polling.lock().await,
        };
        self.store.save(&state).await
    }
}

/// Build the composite sunset write from the configured program.
fn sunset_payload(config: &SunsetConfig, enabled: bool) -> SunsetSettings {
    let (snddv, sndch) = match config.ambient_sound.as_str() {
        "off" => ("off".to_owned(), "0".to_owned()),
        "aux" => ("aux".to_owned(), "0".to_owned()),
        "fmr" => ("fmr".to_owned(), config.radio_channel.clone()),
        numbered => ("dus".to_owned(), numbered.to_owned()),
    };
    SunsetSettings {
        durat: config.duration_min,
        onoff: enabled,
        curve: config.light_intensity,
        ctype: config.color_scheme,
        snddv,
        sndch,
        sndlv: config.volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sunset_payload_maps_ambient_sound_sources() {
        let mut config = SunsetConfig {
            ambient_sound: "3".into(),
            radio_channel: "2".into(),
            ..SunsetConfig::default()
        };
        let settings = sunset_payload(&config, true);
        assert!(settings.onoff);
        assert_eq!(settings.snddv, "dus");
        assert_eq!(settings.sndch, "3");

        config.ambient_sound = "fmr".into();
        let settings = sunset_payload(&config, true);
        assert_eq!(settings.snddv, "fmr");
        assert_eq!(settings.sndch, "2");

        config.ambient_sound = "off".into();
        assert_eq!(sunset_payload(&config, false).snddv, "off");
    }
}
