// Alarm slot endpoints.
//
// The device stores alarms in a dense table of at most 16 slots and
// exposes them as two positional arrays that must be joined by index.
// Slots are never removed, only deactivated: `prfvs[i] == false` means
// slot `i + 1` is free and may be re-claimed.

use serde_json::json;
use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{
    AlarmSchedules, AlarmSlot, AlarmSlotState, AlarmSlotWrite, AlarmSpec, AlarmStates, AlarmTable,
};
use crate::repetition::Repetition;

impl DeviceClient {
    /// List the activated alarm slots.
    ///
    /// Joins `GET /wualm/aenvs` (activation/enablement/power-wake arrays)
    /// with `GET /wualm/aalms` (time/repetition arrays) by position,
    /// keeping only activated slots. Also reports the table capacity so
    /// callers can detect exhaustion without a write probe.
    pub async fn list_alarms(&self) -> Result<AlarmTable, Error> {
        let states: AlarmStates = self.transport().get("wualm/aenvs").await?;
        let schedules: AlarmSchedules = self.transport().get("wualm/aalms").await?;

        let len = states.prfvs.len();
        if states.prfen.len() != len
            || schedules.almhr.len() < len
            || schedules.almmn.len() < len
            || schedules.daynm.len() < len
        {
            return Err(Error::InconsistentAlarmData(format!(
                "prfvs={} prfen={} almhr={} almmn={} daynm={}",
                len,
                states.prfen.len(),
                schedules.almhr.len(),
                schedules.almmn.len(),
                schedules.daynm.len(),
            )));
        }

        let slots = (0..len)
            .filter(|&i| states.prfvs[i])
            .map(|i| AlarmSlot {
                slot: (i + 1) as u8,
                enabled: states.prfen[i],
                power_wake: states.pwrsv.get(i).copied().unwrap_or(0) == 1,
                hour: schedules.almhr[i],
                minute: schedules.almmn[i],
                repetition: Repetition::from_mask(schedules.daynm[i]),
            })
            .collect();

        Ok(AlarmTable {
            slots,
            capacity: len,
        })
    }

    /// Claim the first free slot for a new alarm.
    ///
    /// First-fit, ascending: a freed slot 3 is re-used before an untouched
    /// slot 9. Fails with [`Error::SlotsExhausted`] when every slot is
    /// activated.
    ///
    /// `PUT /wualm/prfwu`
    pub async fn set_alarm(&self, spec: &AlarmSpec) -> Result<AlarmSlot, Error> {
        let states: AlarmStates = self.transport().get("wualm/aenvs").await?;
        let free = states
            .prfvs
            .iter()
            .position(|activated| !activated)
            .ok_or(Error::SlotsExhausted)?;
        let slot = (free + 1) as u8;
        debug!(slot, "claiming free alarm slot");

        let mut write = AlarmSlotWrite {
            prfnr: slot,
            prfvs: Some(true),
            prfen: Some(spec.enabled),
            almhr: Some(spec.hour),
            almmn: Some(spec.minute),
            daynm: Some(spec.repetition.mask()),
            ..AlarmSlotWrite::default()
        };
        if let Some(offset) = spec.power_wake_offset {
            let total = u16::from(spec.hour) * 60 + u16::from(spec.minute);
            // Wraps across midnight; offsets are minutes, well under a day.
            let early = (total + 24 * 60 - u16::from(offset)) % (24 * 60);
            write.pwrsz = Some(1);
            write.pszhr = Some((early / 60) as u8);
            write.pszmn = Some((early % 60) as u8);
        } else {
            write.pwrsz = Some(0);
        }

        let _: AlarmSlotState = self.transport().put("wualm/prfwu", &write).await?;

        Ok(AlarmSlot {
            slot,
            enabled: spec.enabled,
            power_wake: spec.power_wake_offset.is_some(),
            hour: spec.hour,
            minute: spec.minute,
            repetition: spec.repetition,
        })
    }

    /// Enable or disable an existing slot.
    ///
    /// `PUT /wualm/prfwu`
    pub async fn toggle_alarm(&self, slot: u8, enabled: bool) -> Result<AlarmSlotState, Error> {
        debug!(slot, enabled, "toggling alarm");
        self.transport()
            .put("wualm/prfwu", &json!({ "prfnr": slot, "prfen": enabled }))
            .await
    }

    /// Free a slot.
    ///
    /// The record is deactivated, not removed: the firmware keeps the
    /// time and repetition around and reports the slot as free.
    ///
    /// `PUT /wualm/prfwu`
    pub async fn delete_alarm(&self, slot: u8) -> Result<(), Error> {
        debug!(slot, "deactivating alarm slot");
        let _: AlarmSlotState = self
            .transport()
            .put("wualm/prfwu", &json!({ "prfnr": slot, "prfvs": false }))
            .await?;
        Ok(())
    }
}
