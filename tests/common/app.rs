//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use imgpro::models::AppConfig;
use imgpro::server::{build_router, create_app_state_with, AppState};
use imgpro::services::{AnalysisService, ImagePipeline, SharedBatch};

/// Test application with router and direct access to the batch
pub struct TestApp {
    router: axum::Router,
    pub batch: SharedBatch,
}

impl TestApp {
    /// Create a test application with default config and no analysis service
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Create a test application with custom config and optional analyzer
    pub fn with_config(config: AppConfig, analyzer: Option<Arc<dyn AnalysisService>>) -> Self {
        let state = Self::create_state(config, analyzer);
        let batch = state.batch.clone();

        // Build router using shared server module (same as production)
        let router = build_router(state);

        Self { router, batch }
    }

    /// Create state with the production pipeline
    pub fn create_state(
        config: AppConfig,
        analyzer: Option<Arc<dyn AnalysisService>>,
    ) -> AppState {
        create_app_state_with(config, Arc::new(ImagePipeline::new()), analyzer)
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a DELETE request to the given path
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(Request::delete(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request without a body
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request(Request::post(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> TestResponse {
        let request = Request::post(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    /// Make a PUT request with JSON body
    pub async fn put_json(&self, path: &str, body: &serde_json::Value) -> TestResponse {
        let request = Request::put(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Upload files and return their ids
    pub async fn upload<B: AsRef<[u8]>>(&self, files: &[(&str, B)]) -> Vec<String> {
        let body = super::fixtures::upload_body(files);
        let response = self.post_json("/api/items", &body).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "upload failed: {}",
            response.text()
        );

        let json: serde_json::Value = response.json();
        json["ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Check if response is a PNG image
    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }
}
