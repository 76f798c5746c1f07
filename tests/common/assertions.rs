//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert response is a valid PNG image
pub fn assert_png(response: &TestResponse) {
    assert_ok(response);
    assert!(
        response.is_png(),
        "Expected PNG image, got {} bytes starting with {:?}",
        response.body.len(),
        &response.body[..8.min(response.body.len())]
    );

    // Check Content-Type header
    let content_type = response
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());
    assert_eq!(
        content_type,
        Some("image/png"),
        "Expected Content-Type: image/png"
    );
}

/// Assert an error response: HTTP status plus the JSON `{status, error}` body
pub fn assert_api_error(response: &TestResponse, expected: StatusCode) {
    assert_status(response, expected);
    let json: serde_json::Value = response.json();
    assert_eq!(
        json["status"].as_u64(),
        Some(expected.as_u16() as u64),
        "Expected JSON status {}, got {:?}. Full response: {}",
        expected.as_u16(),
        json["status"],
        serde_json::to_string_pretty(&json).unwrap()
    );
    assert!(json["error"].is_string(), "Expected error message");
}

/// Assert a pass report's counters
pub fn assert_pass(response: &TestResponse, succeeded: u64, failed: u64) {
    assert_ok(response);
    let json: serde_json::Value = response.json();
    assert_eq!(
        (json["succeeded"].as_u64(), json["failed"].as_u64()),
        (Some(succeeded), Some(failed)),
        "Unexpected pass report: {json}"
    );
}

/// Statuses of all items in batch order
pub fn item_statuses(list: &TestResponse) -> Vec<String> {
    let json: serde_json::Value = list.json();
    json["items"]
        .as_array()
        .expect("Expected items array")
        .iter()
        .map(|i| i["status"].as_str().unwrap().to_string())
        .collect()
}
