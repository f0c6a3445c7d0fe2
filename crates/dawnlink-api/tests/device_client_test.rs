#![allow(clippy::unwrap_used)]
// Integration tests for `DeviceClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dawnlink_api::models::AlarmSpec;
use dawnlink_api::{DeviceClient, Error, RelaxGuidance, Repetition, TransportConfig, WeekdaySet};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DeviceClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let config = TransportConfig {
        min_interval: Duration::ZERO,
        initial_backoff: Duration::from_millis(5),
        ..TransportConfig::default()
    };
    let client = DeviceClient::with_base_url(base_url, config).unwrap();
    (server, client)
}

// ── Sensors ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_sensors() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/wusrd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mslux": 12.5, "mstmp": 21.3, "msrhu": 48.0, "mssnd": 33.1
        })))
        .mount(&server)
        .await;

    let readings = client.sensors().await.unwrap();
    assert_eq!(readings.mstmp, 21.3);
    assert_eq!(readings.msrhu, 48.0);
}

// ── Light mutual exclusion ──────────────────────────────────────────

#[tokio::test]
async fn test_main_light_write_cancels_preview_and_night_light() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/wulgt"))
        .and(body_json(json!({
            "onoff": true, "tempy": false, "ngtlt": false, "ltlvl": 18
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "onoff": true, "ltlvl": 18, "tempy": false, "ngtlt": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = client.set_main_light(true, Some(18)).await.unwrap();
    assert_eq!(state.onoff, Some(true));
    assert_eq!(state.tempy, Some(false));
}

#[tokio::test]
async fn test_sunrise_preview_forces_night_light_off() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/wulgt"))
        .and(body_json(json!({
            "onoff": true, "tempy": true, "ctype": 2, "ngtlt": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "onoff": true, "tempy": true, "ctype": 2, "ngtlt": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.set_sunrise_preview(true, 2).await.unwrap();
}

#[tokio::test]
async fn test_night_light_forces_main_light_off() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/wulgt"))
        .and(body_json(json!({ "onoff": false, "tempy": false, "ngtlt": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ngtlt": true })))
        .expect(1)
        .mount(&server)
        .await;

    let state = client.set_night_light(true).await.unwrap();
    assert_eq!(state.ngtlt, Some(true));
}

// ── Relax-breathe conditional payload ───────────────────────────────

#[tokio::test]
async fn test_relax_light_guidance_sends_intensity_only() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/wurlx"))
        .and(body_json(json!({
            "durat": 10, "onoff": true, "progr": 1, "rtype": 0, "intny": 20
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "durat": 10, "onoff": true, "progr": 1, "rtype": 0, "intny": 20
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = client
        .set_relax(true, 10, 1, RelaxGuidance::Light { intensity: 20 })
        .await
        .unwrap();
    assert!(state.onoff);
}

#[tokio::test]
async fn test_relax_sound_guidance_sends_volume_only() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/wurlx"))
        .and(body_json(json!({
            "durat": 15, "onoff": true, "progr": 2, "rtype": 1, "sndlv": 12
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "durat": 15, "onoff": true, "progr": 2, "rtype": 1, "sndlv": 12
        })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .set_relax(true, 15, 2, RelaxGuidance::Sound { volume: 12 })
        .await
        .unwrap();
}

// ── Alarms ──────────────────────────────────────────────────────────

async fn mount_alarm_arrays(
    server: &MockServer,
    prfen: serde_json::Value,
    prfvs: serde_json::Value,
    pwrsv: serde_json::Value,
    schedules: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path("/wualm/aenvs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "prfen": prfen, "prfvs": prfvs, "pwrsv": pwrsv
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wualm/aalms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(schedules))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_list_alarms_joins_and_filters_activated() {
    let (server, client) = setup().await;

    mount_alarm_arrays(
        &server,
        json!([true, false, false]),
        json!([true, false, true]),
        json!([1, 0, 0]),
        json!({
            "almhr": [7, 0, 9],
            "almmn": [30, 0, 15],
            "daynm": [254, 0, 62]
        }),
    )
    .await;

    let table = client.list_alarms().await.unwrap();

    assert_eq!(table.capacity, 3);
    assert_eq!(table.slots.len(), 2);

    let first = &table.slots[0];
    assert_eq!(first.slot, 1);
    assert!(first.enabled);
    assert!(first.power_wake);
    assert_eq!(first.formatted_time(), "07:30");
    assert_eq!(first.repetition, Repetition::Weekly(WeekdaySet::EVERY_DAY));

    let second = &table.slots[1];
    assert_eq!(second.slot, 3);
    assert!(!second.enabled);
    assert_eq!(second.repetition, Repetition::Weekly(WeekdaySet::WEEKDAYS));
}

#[tokio::test]
async fn test_set_alarm_claims_first_free_slot() {
    let (server, client) = setup().await;

    // Slot 3 was freed earlier; slots 1, 2, and 4 are live.
    mount_alarm_arrays(
        &server,
        json!([true, true, false, true]),
        json!([true, true, false, true]),
        json!([0, 0, 0, 0]),
        json!({ "almhr": [6, 7, 0, 8], "almmn": [0, 0, 0, 0], "daynm": [254, 254, 0, 254] }),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path("/wualm/prfwu"))
        .and(body_partial_json(json!({
            "prfnr": 3, "prfvs": true, "prfen": true, "almhr": 7, "almmn": 45
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "prfnr": 3, "prfen": true, "prfvs": true, "almhr": 7, "almmn": 45
        })))
        .expect(1)
        .mount(&server)
        .await;

    let slot = client
        .set_alarm(&AlarmSpec {
            enabled: true,
            hour: 7,
            minute: 45,
            repetition: Repetition::Weekly(WeekdaySet::WEEKDAYS),
            power_wake_offset: None,
        })
        .await
        .unwrap();

    assert_eq!(slot.slot, 3);
}

#[tokio::test]
async fn test_set_alarm_with_power_wake_writes_early_trigger() {
    let (server, client) = setup().await;

    mount_alarm_arrays(
        &server,
        json!([false]),
        json!([false]),
        json!([0]),
        json!({ "almhr": [0], "almmn": [0], "daynm": [0] }),
    )
    .await;

    // 07:00 alarm with a 15-minute early power-wake → 06:45.
    Mock::given(method("PUT"))
        .and(path("/wualm/prfwu"))
        .and(body_partial_json(json!({
            "prfnr": 1, "pwrsz": 1, "pszhr": 6, "pszmn": 45
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "prfnr": 1, "prfen": true, "prfvs": true, "almhr": 7, "almmn": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let slot = client
        .set_alarm(&AlarmSpec {
            enabled: true,
            hour: 7,
            minute: 0,
            repetition: Repetition::Tomorrow,
            power_wake_offset: Some(15),
        })
        .await
        .unwrap();

    assert!(slot.power_wake);
}

#[tokio::test]
async fn test_set_alarm_fails_when_all_slots_activated() {
    let (server, client) = setup().await;

    mount_alarm_arrays(
        &server,
        json!(vec![true; 16]),
        json!(vec![true; 16]),
        json!(vec![0; 16]),
        json!({ "almhr": vec![7; 16], "almmn": vec![0; 16], "daynm": vec![254; 16] }),
    )
    .await;

    // No write may be attempted against a full table.
    Mock::given(method("PUT"))
        .and(path("/wualm/prfwu"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client
        .set_alarm(&AlarmSpec {
            enabled: true,
            hour: 7,
            minute: 0,
            repetition: Repetition::Tomorrow,
            power_wake_offset: None,
        })
        .await;

    assert!(matches!(result, Err(Error::SlotsExhausted)));
}

#[tokio::test]
async fn test_toggle_and_delete_payloads() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/wualm/prfwu"))
        .and(body_json(json!({ "prfnr": 1, "prfen": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "prfnr": 1, "prfen": true, "prfvs": true, "almhr": 7, "almmn": 30
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = client.toggle_alarm(1, true).await.unwrap();
    assert!(state.prfen);
    assert_eq!(state.almhr, 7);

    Mock::given(method("PUT"))
        .and(path("/wualm/prfwu"))
        .and(body_json(json!({ "prfnr": 2, "prfvs": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "prfnr": 2, "prfen": false, "prfvs": false, "almhr": 0, "almmn": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_alarm(2).await.unwrap();
}

#[tokio::test]
async fn test_list_alarms_rejects_torn_arrays() {
    let (server, client) = setup().await;

    mount_alarm_arrays(
        &server,
        json!([true, true]),
        json!([true, true]),
        json!([0, 0]),
        json!({ "almhr": [7], "almmn": [30], "daynm": [254] }),
    )
    .await;

    let result = client.list_alarms().await;
    assert!(matches!(result, Err(Error::InconsistentAlarmData(_))));
}

// ── Events ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_last_event() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dataupload/event.1/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "event": "startdusk", "ltlvl": 10
        })))
        .mount(&server)
        .await;

    let event = client.last_event().await.unwrap();
    assert_eq!(event.event, dawnlink_api::event_names::SUNSET_ON);
}

// ── Display / reset ─────────────────────────────────────────────────

#[tokio::test]
async fn test_display_write_and_factory_reset() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/wusts"))
        .and(body_json(json!({ "dspon": true, "brght": 4 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dspon": true, "brght": 4 })))
        .expect(1)
        .mount(&server)
        .await;

    let state = client.set_display(true, 4).await.unwrap();
    assert_eq!(state.brght, Some(4));

    Mock::given(method("PUT"))
        .and(path("/fac"))
        .and(body_json(json!({ "reset": 1 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.factory_reset().await.unwrap();
}
