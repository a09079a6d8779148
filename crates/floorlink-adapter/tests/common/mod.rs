/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for floorlink-adapter tests

use floorlink_adapter::{ClientConfig, FloorClient, StationContext};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Build a client pointed at the mock server with a test station context
pub fn test_client(server: &MockServer) -> FloorClient {
    let mut client = FloorClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client for mock server");
    client.set_context(StationContext {
        station_id: "st-01".to_string(),
        operator_id: "op-42".to_string(),
        auth_token: "test-token".to_string(),
    });
    client
}

/// A pick task payload as the service would hand it out
#[allow(dead_code)]
pub fn pick_task_json(task_id: &str) -> serde_json::Value {
    serde_json::json!({
        "task": {
            "task_id": task_id,
            "kind": "pick",
            "steps": [
                {"kind": "scan_location", "expected": "A-01-R02", "label": "Rack A-01"},
                {"kind": "scan_product", "expected": "SKU123"},
                {"kind": "confirm_quantity"}
            ],
            "max_quantity": 5,
            "source_id": "A-01-R02",
            "item_ref": "SKU123",
            "description": "5x widget, order ORD-1001"
        }
    })
}
