/*
[INPUT]:  Mocked snapshot endpoint with controllable latency
[OUTPUT]: Poll supersession, gating, and diff behavior verification
[POS]:    Integration tests - backlog synchronization
[UPDATE]: When poll scheduling or cancellation semantics change
*/

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use floorlink_adapter::{ClientConfig, FloorClient, StationContext};
use floorlink_console::BacklogSync;

fn client_for(server: &MockServer) -> Arc<FloorClient> {
    let mut client = FloorClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client for mock server");
    client.set_context(StationContext {
        station_id: "st-01".to_string(),
        operator_id: "op-42".to_string(),
        auth_token: "test-token".to_string(),
    });
    Arc::new(client)
}

fn snapshot_json(ids_and_picked: &[(&str, u32)]) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = ids_and_picked
        .iter()
        .map(|(id, picked)| {
            serde_json::json!({
                "id": id,
                "reference": format!("ORD-{id}"),
                "status": "open",
                "priority": "normal",
                "total_units": 20,
                "picked_units": picked,
                "line_count": 2,
                "created_at": "2026-07-01T08:00:00Z"
            })
        })
        .collect();
    serde_json::Value::Array(entries)
}

async fn snapshot_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|req| req.url.path() == "/api/backlog_snapshot")
        .count()
}

#[tokio::test]
async fn test_superseded_poll_never_applies() {
    let server = MockServer::start().await;

    // P1: slow, stale data. Consumed by the first poll only.
    Mock::given(method("GET"))
        .and(path("/api/backlog_snapshot"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(snapshot_json(&[("1", 0)]))
                .set_delay(Duration::from_millis(500)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // P2: fast, newer data.
    Mock::given(method("GET"))
        .and(path("/api/backlog_snapshot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_json(&[("1", 9)])))
        .mount(&server)
        .await;

    let shutdown = CancellationToken::new();
    // Long interval: only explicit refreshes poll.
    let sync = BacklogSync::spawn(client_for(&server), Duration::from_secs(60), shutdown.clone());
    let mut view = sync.view();

    // Let P1 get in flight, then supersede it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    sync.refresh_now();

    // Exactly one snapshot is applied, and it is P2's.
    tokio::time::timeout(Duration::from_secs(2), view.changed())
        .await
        .expect("a view within the deadline")
        .expect("watch alive");
    {
        let applied = view.borrow_and_update();
        assert_eq!(applied.revision, 1);
        assert_eq!(applied.rows.len(), 1);
        assert_eq!(applied.rows[0].detail, "2 lines, 9/20 units");
    }

    // P1's delayed response arrives after this sleep; it must not surface.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!view.has_changed().unwrap());
    assert_eq!(view.borrow().revision, 1);

    shutdown.cancel();
}

#[tokio::test]
async fn test_poll_interval_measured_from_settlement() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/backlog_snapshot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_json(&[("1", 0)])))
        .mount(&server)
        .await;

    let shutdown = CancellationToken::new();
    let sync = BacklogSync::spawn(
        client_for(&server),
        Duration::from_millis(150),
        shutdown.clone(),
    );
    let _keepalive = sync.view();

    tokio::time::sleep(Duration::from_millis(500)).await;
    let count = snapshot_count(&server).await;
    // Immediate poll plus roughly one per interval; overlap would give far
    // more.
    assert!((2..=5).contains(&count), "unexpected poll count {count}");

    shutdown.cancel();
}

#[tokio::test]
async fn test_pause_stops_polling_resume_polls_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/backlog_snapshot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_json(&[("1", 0)])))
        .mount(&server)
        .await;

    let shutdown = CancellationToken::new();
    let sync = BacklogSync::spawn(
        client_for(&server),
        Duration::from_millis(100),
        shutdown.clone(),
    );

    tokio::time::sleep(Duration::from_millis(250)).await;
    sync.pause();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let paused_at = snapshot_count(&server).await;

    // Hidden view: no polls at all.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(snapshot_count(&server).await, paused_at);

    // Refocus: an out-of-cycle poll fires straight away.
    sync.resume();
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(snapshot_count(&server).await > paused_at);

    shutdown.cancel();
}

#[tokio::test]
async fn test_failed_poll_keeps_last_view_and_throttles_notices() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/backlog_snapshot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_json(&[("1", 4)])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/backlog_snapshot"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "code": 500,
            "message": "backlog unavailable"
        })))
        .mount(&server)
        .await;

    let shutdown = CancellationToken::new();
    let mut sync = BacklogSync::spawn(
        client_for(&server),
        Duration::from_millis(100),
        shutdown.clone(),
    );
    let mut notices = sync.take_notices().expect("first take");
    let mut view = sync.view();

    tokio::time::timeout(Duration::from_secs(2), view.changed())
        .await
        .expect("initial snapshot")
        .expect("watch alive");
    assert_eq!(view.borrow_and_update().rows.len(), 1);

    // Several failing polls elapse; the good view stays and only one notice
    // fits in the cooldown window.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(view.borrow().rows.len(), 1);

    let mut notice_count = 0;
    while notices.try_recv().is_ok() {
        notice_count += 1;
    }
    assert_eq!(notice_count, 1, "notices must be throttled");

    // Polling continued on the fixed interval despite the failures.
    assert!(snapshot_count(&server).await >= 4);

    shutdown.cancel();
}
