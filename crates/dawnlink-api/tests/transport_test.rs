#![allow(clippy::unwrap_used)]
// Transport behavior tests: retry policy and single-flight pacing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use tokio::sync::Mutex;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dawnlink_api::{Error, Transport, TransportConfig};

fn config(min_interval: Duration) -> TransportConfig {
    TransportConfig {
        min_interval,
        initial_backoff: Duration::from_millis(5),
        ..TransportConfig::default()
    }
}

async fn transport(server: &MockServer, min_interval: Duration) -> Transport {
    let base_url = Url::parse(&server.uri()).unwrap();
    Transport::new(base_url, config(min_interval)).unwrap()
}

// ── Retry policy ────────────────────────────────────────────────────

#[tokio::test]
async fn test_retries_transient_server_errors() {
    let server = MockServer::start().await;
    let transport = transport(&server, Duration::ZERO).await;

    Mock::given(method("GET"))
        .and(path("/wusrd"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wusrd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let value: serde_json::Value = transport.get("wusrd").await.unwrap();
    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn test_does_not_retry_client_errors() {
    let server = MockServer::start().await;
    let transport = transport(&server, Duration::ZERO).await;

    Mock::given(method("GET"))
        .and(path("/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .expect(1)
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, Error> = transport.get("nope").await;
    match result {
        Err(e) => {
            assert!(e.is_permanent_rejection());
            assert_eq!(e.status(), Some(404));
        }
        Ok(v) => panic!("expected 404 error, got {v}"),
    }
}

#[tokio::test]
async fn test_gives_up_after_retry_budget() {
    let server = MockServer::start().await;
    let transport = transport(&server, Duration::ZERO).await;

    // Default budget is 4 attempts total.
    Mock::given(method("GET"))
        .and(path("/wusrd"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, Error> = transport.get("wusrd").await;
    assert!(matches!(result, Err(Error::Http { status: 500, .. })));
}

#[tokio::test]
async fn test_unserializable_body_fails_before_any_request() {
    struct Broken;
    impl serde::Serialize for Broken {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not representable"))
        }
    }

    let server = MockServer::start().await;
    let transport = transport(&server, Duration::ZERO).await;

    Mock::given(method("PUT"))
        .and(path("/wulgt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, Error> = transport.put("wulgt", &Broken).await;
    assert!(matches!(result, Err(Error::Serialization(_))));
}

// ── Pacing ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_requests_are_paced_in_submission_order() {
    let server = MockServer::start().await;
    let min_interval = Duration::from_millis(120);
    let transport = Arc::new(transport(&server, min_interval).await);

    for p in ["a", "b", "c"] {
        Mock::given(method("GET"))
            .and(path(format!("/{p}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "path": p })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let started = Instant::now();

    let run = |p: &'static str| {
        let transport = Arc::clone(&transport);
        let order = Arc::clone(&order);
        async move {
            let _: serde_json::Value = transport.get(p).await.unwrap();
            order.lock().await.push(p);
        }
    };

    // join! polls in declaration order, so the gate is acquired a, b, c.
    tokio::join!(run("a"), run("b"), run("c"));

    let elapsed = started.elapsed();
    assert_eq!(*order.lock().await, vec!["a", "b", "c"]);
    assert!(
        elapsed >= min_interval * 2,
        "three paced requests finished in {elapsed:?}, expected at least {:?}",
        min_interval * 2
    );
}
