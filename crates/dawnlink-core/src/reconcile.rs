// ── Alarm reconciliation ──
//
// One pass aligns three views of the alarm set: the device's slot table,
// the platform's alarm manager, and the per-slot capabilities. The
// device is the source of truth for linked alarms; the platform feeds in
// new alarms only through prefix-named entries, which get adopted onto a
// free slot. Failures are contained per entity — one broken alarm never
// aborts the pass — and the platform list is fetched exactly once, so a
// pass over an unchanged world performs no writes.

use tracing::{debug, info, warn};

use dawnlink_api::models::{AlarmSlot, AlarmSpec};
use dawnlink_api::Repetition;

use crate::capability::alarm_title;
use crate::error::CoreError;
use crate::platform::{AlarmPatch, ExternalAlarm, NewAlarm, PlatformError};
use crate::session::SessionInner;
use crate::store::AlarmLink;

impl SessionInner {
    /// Run one reconciliation pass.
    ///
    /// Capability mirroring (add/title/value/prune) always runs; the
    /// sync flag gates only the platform alarm CRUD — mirroring to the
    /// external list, adoption, and deletes of linked externals.
    pub(crate) async fn sync_alarms(&self) -> Result<(), CoreError> {
        let sync = self.config.lock().await.alarm_sync.clone();

        let table = self.device.list_alarms().await?;
        let externals = if sync.enabled {
            self.alarms.list().await?
        } else {
            Vec::new()
        };

        let mut links = self.links.lock().await;
        let mut registry = self.registry.lock().await;
        let before = links.clone();

        // Phase 1: prune links whose device slot was freed.
        let gone: Vec<u8> = links
            .keys()
            .copied()
            .filter(|slot| table.get(*slot).is_none())
            .collect();
        for slot in gone {
            let Some(link) = links.get(&slot).cloned() else {
                continue;
            };
            if sync.enabled {
                if let Some(ext) = &link.external_id {
                    match self.alarms.delete(ext).await {
                        Ok(()) | Err(PlatformError::Gone) => {}
                        Err(e) => {
                            // Keep the link; the next pass retries the delete.
                            warn!(slot, error = %e, "failed to delete platform alarm");
                            continue;
                        }
                    }
                }
            }
            self.drop_capability(&link.capability_id).await;
            registry.unbind(slot);
            links.remove(&slot);
            debug!(slot, "pruned freed alarm slot");
        }

        // Phase 2: converge every activated slot.
        for device_alarm in &table.slots {
            let slot = device_alarm.slot;
            if !registry.contains(slot) {
                let id = registry.bind(slot);
                if let Err(e) = self.host.add_capability(&id).await {
                    warn!(slot, error = %e, "failed to add alarm capability");
                    registry.unbind(slot);
                    continue;
                }
            }
            let capability_id = crate::capability::alarm_capability_id(slot);
            // Every bound slot has a link from the moment its capability
            // exists, mirror or no mirror, so pruning always finds it.
            links.entry(slot).or_insert_with(|| AlarmLink {
                capability_id: capability_id.clone(),
                external_id: None,
            });
            if let Err(e) = self
                .host
                .set_title(&capability_id, &alarm_title(device_alarm))
                .await
            {
                warn!(slot, error = %e, "failed to set alarm title");
            }
            if let Err(e) = self
                .host
                .set_value(&capability_id, serde_json::json!(device_alarm.enabled))
                .await
            {
                warn!(slot, error = %e, "failed to set alarm value");
            }

            if !sync.enabled {
                continue;
            }

            let linked_external = links.get(&slot).and_then(|l| l.external_id.clone());
            match linked_external {
                Some(ext_id) => match externals.iter().find(|e| e.id == ext_id) {
                    Some(external) => {
                        if let Err(e) = self.push_update(device_alarm, external).await {
                            match e {
                                PlatformError::Gone => {
                                    self.retire_slot(slot, &capability_id, &mut links, &mut registry)
                                        .await;
                                }
                                PlatformError::Other(msg) => {
                                    warn!(slot, error = %msg, "failed to update platform alarm");
                                }
                            }
                        }
                    }
                    None => {
                        // Deleted on the platform since the last pass.
                        self.retire_slot(slot, &capability_id, &mut links, &mut registry)
                            .await;
                    }
                },
                None => match self.create_external(&sync.name_prefix, device_alarm).await {
                    Ok(ext_id) => {
                        if let Some(link) = links.get_mut(&slot) {
                            link.external_id = Some(ext_id);
                        }
                    }
                    Err(e) => warn!(slot, error = %e, "failed to create platform alarm"),
                },
            }
        }

        // Phase 3: adopt prefix-named platform alarms onto free slots.
        if sync.enabled {
            let mut occupied = table.slots.len();
            for external in &externals {
                if !external.name.starts_with(&sync.name_prefix) {
                    continue;
                }
                let already_linked = links
                    .values()
                    .any(|l| l.external_id.as_deref() == Some(external.id.as_str()));
                if already_linked {
                    continue;
                }
                if occupied >= table.capacity {
                    self.notifier
                        .notify("The wake-up light has no free alarm slots left")
                        .await;
                    break;
                }
                match self.adopt_external(external).await {
                    Ok(device_alarm) => {
                        occupied += 1;
                        let id = registry.bind(device_alarm.slot);
                        if let Err(e) = self.host.add_capability(&id).await {
                            warn!(slot = device_alarm.slot, error = %e, "failed to add alarm capability");
                            // The next pass retries the add.
                            registry.unbind(device_alarm.slot);
                        } else {
                            if let Err(e) =
                                self.host.set_title(&id, &alarm_title(&device_alarm)).await
                            {
                                warn!(slot = device_alarm.slot, error = %e, "failed to set alarm title");
                            }
                            if let Err(e) = self
                                .host
                                .set_value(&id, serde_json::json!(device_alarm.enabled))
                                .await
                            {
                                warn!(slot = device_alarm.slot, error = %e, "failed to set alarm value");
                            }
                        }
                        links.insert(
                            device_alarm.slot,
                            AlarmLink {
                                capability_id: id,
                                external_id: Some(external.id.clone()),
                            },
                        );
                        info!(
                            slot = device_alarm.slot,
                            alarm = %external.name,
                            "adopted platform alarm onto device"
                        );
                    }
                    Err(CoreError::SlotsExhausted) => {
                        self.notifier
                            .notify("The wake-up light has no free alarm slots left")
                            .await;
                        break;
                    }
                    Err(e) => {
                        warn!(alarm = %external.name, error = %e, "failed to adopt platform alarm");
                    }
                }
            }
        }

        if *links != before {
            drop(registry);
            let snapshot = links.clone();
            drop(links);
            let state = crate::store::PersistedState {
                links: snapshot,
                polling_enabled: *self.polling.lock().await,
            };
            self.store.save(&state).await?;
        }
        Ok(())
    }

    /// Push the device's state for a linked alarm, skipping the write
    /// when the platform copy already matches.
    async fn push_update(
        &self,
        device_alarm: &AlarmSlot,
        external: &ExternalAlarm,
    ) -> Result<(), PlatformError> {
        let time = device_alarm.formatted_time();
        let repetition = device_alarm.repetition.weekdays();
        if external.time == time
            && external.enabled == device_alarm.enabled
            && external.repetition == repetition
        {
            return Ok(());
        }
        self.alarms
            .update(
                &external.id,
                AlarmPatch {
                    time,
                    enabled: device_alarm.enabled,
                    repetition,
                },
            )
            .await
    }

    /// Create the platform mirror for a device-born alarm.
    async fn create_external(
        &self,
        prefix: &str,
        device_alarm: &AlarmSlot,
    ) -> Result<String, PlatformError> {
        let time = device_alarm.formatted_time();
        let id = self
            .alarms
            .create(NewAlarm {
                name: format!("{prefix} {time}"),
                time: time.clone(),
                enabled: device_alarm.enabled,
                repetition: device_alarm.repetition.weekdays(),
            })
            .await?;
        self.notifier
            .notify(&format!("Added alarm {time} from the wake-up light"))
            .await;
        Ok(id)
    }

    /// Claim a free device slot for a platform alarm.
    async fn adopt_external(&self, external: &ExternalAlarm) -> Result<AlarmSlot, CoreError> {
        let (hour, minute) = parse_time(&external.time).ok_or_else(|| CoreError::Platform {
            message: format!("alarm {} has unparseable time {:?}", external.id, external.time),
        })?;
        let repetition = if external.repetition.is_empty() {
            Repetition::Tomorrow
        } else {
            Repetition::Weekly(external.repetition)
        };
        let spec = AlarmSpec {
            enabled: external.enabled,
            hour,
            minute,
            repetition,
            power_wake_offset: None,
        };
        let slot = self.device.set_alarm(&spec).await?;
        self.notifier
            .notify(&format!(
                "Copied alarm {} to the wake-up light",
                external.time
            ))
            .await;
        Ok(slot)
    }

    /// A linked platform alarm vanished: free the device slot and drop
    /// the capability and link.
    async fn retire_slot(
        &self,
        slot: u8,
        capability_id: &str,
        links: &mut std::collections::BTreeMap<u8, AlarmLink>,
        registry: &mut crate::capability::AlarmRegistry,
    ) {
        if let Err(e) = self.device.delete_alarm(slot).await {
            warn!(slot, error = %e, "failed to free device alarm slot");
            return;
        }
        self.drop_capability(capability_id).await;
        registry.unbind(slot);
        links.remove(&slot);
        info!(slot, "freed device slot for alarm deleted on the platform");
    }

    async fn drop_capability(&self, id: &str) {
        match self.host.remove_capability(id).await {
            Ok(()) | Err(PlatformError::Gone) => {}
            Err(e) => warn!(capability = id, error = %e, "failed to remove capability"),
        }
    }
}

/// Parse `HH:MM` into hour and minute.
fn parse_time(time: &str) -> Option<(u8, u8)> {
    let (h, m) = time.split_once(':')?;
    let hour: u8 = h.parse().ok()?;
    let minute: u8 = m.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_times() {
        assert_eq!(parse_time("07:30"), Some((7, 30)));
        assert_eq!(parse_time("00:00"), Some((0, 0)));
        assert_eq!(parse_time("23:59"), Some((23, 59)));
    }

    #[test]
    fn rejects_out_of_range_and_garbage_times() {
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("12:60"), None);
        assert_eq!(parse_time("noon"), None);
        assert_eq!(parse_time(""), None);
    }
}
