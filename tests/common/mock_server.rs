//! Mock analysis service.

use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Path the mock analysis endpoint is mounted on
pub const ANALYZE_PATH: &str = "/v1/analyze";

/// Wrapper around wiremock MockServer with convenience methods
pub struct MockAnalysisServer {
    pub server: MockServer,
}

impl MockAnalysisServer {
    /// Start a new mock HTTP server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the analysis endpoint URL
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.server.uri(), ANALYZE_PATH)
    }

    /// Respond to every analysis request with `response` as JSON
    pub async fn mock_json(&self, response: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .and(header("content-type", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(response)
                    .insert_header("content-type", "application/json"),
            )
            .mount(&self.server)
            .await;
    }

    /// Respond only to requests in `mode`
    pub async fn mock_json_for_mode(&self, mode: &str, response: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .and(body_partial_json(serde_json::json!({ "analysisMode": mode })))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    /// Require a bearer token
    pub async fn mock_with_bearer(&self, token: &str, response: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .and(header("authorization", format!("Bearer {token}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    /// Respond with a plain text body
    pub async fn mock_text(&self, body: &str) {
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Respond with an error status
    pub async fn mock_error(&self, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(message))
            .mount(&self.server)
            .await;
    }

    /// Requests received so far
    pub async fn received(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}
