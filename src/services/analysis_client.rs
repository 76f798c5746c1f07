//! Client for the external analysis service.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use regex::Regex;
use serde::Serialize;

use crate::error::AnalysisError;
use crate::models::{AnalysisConfig, AnalysisMode, AnalysisResult, ParsedAnalysis};
use crate::services::batch::AnalysisJob;
use crate::services::knowledge::KnowledgeProvider;

/// Longest error body kept in [`AnalysisError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// One analysis call
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: Arc<[u8]>,
    pub mime_type: String,
    pub mode: AnalysisMode,
    pub context: Option<String>,
}

impl From<AnalysisJob> for AnalysisRequest {
    fn from(job: AnalysisJob) -> Self {
        Self {
            image: job.image,
            mime_type: job.mime_type,
            mode: job.mode,
            context: None,
        }
    }
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisPayload<'a> {
    image_bytes_base64: String,
    mime_type: &'a str,
    analysis_mode: AnalysisMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<String>,
}

/// JSON-over-HTTP analysis client
pub struct HttpAnalysisClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    knowledge: Option<Arc<dyn KnowledgeProvider>>,
}

impl HttpAnalysisClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
            knowledge: None,
        })
    }

    /// Build from the `analysis` config section. The API key is read from the
    /// environment variable the config names.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(AnalysisError::NotConfigured)?;
        let mut client = Self::new(endpoint, Duration::from_secs(config.timeout_secs))?;
        client.api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty());
        if client.api_key.is_none() {
            tracing::debug!(var = %config.api_key_env, "No analysis API key set");
        }
        Ok(client)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeProvider>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn context_for(&self, request: &AnalysisRequest) -> Option<String> {
        let hints = self
            .knowledge
            .as_ref()
            .filter(|k| k.is_ready())
            .and_then(|k| k.hints(request.mode));
        match (request.context.clone(), hints) {
            (Some(context), Some(hints)) => Some(format!("{context}\n\n{hints}")),
            (context, hints) => context.or(hints),
        }
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let payload = AnalysisPayload {
            image_bytes_base64: base64::engine::general_purpose::STANDARD.encode(&request.image),
            mime_type: &request.mime_type,
            analysis_mode: request.mode,
            context: self.context_for(&request),
        };

        let mut builder = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Analysis service rejected request");
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let result = parse_analysis_response(&body);
        tracing::debug!(kind = result.kind_name(), mode = %request.mode, "Analysis received");
        Ok(result)
    }
}

fn code_fence() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```[a-zA-Z]*\s*(.*?)```").expect("fence pattern is valid")
    })
}

fn try_parse(candidate: &str) -> Option<ParsedAnalysis> {
    serde_json::from_str::<ParsedAnalysis>(candidate.trim())
        .ok()
        .filter(ParsedAnalysis::has_content)
}

/// Interpret a service response body.
///
/// Accepts bare JSON, JSON inside a markdown code fence, or a JSON object
/// embedded in prose. Anything else becomes [`AnalysisResult::RawText`].
pub fn parse_analysis_response(body: &str) -> AnalysisResult {
    let fenced = code_fence()
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str());

    let embedded = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&body[start..=end]),
        _ => None,
    };

    let parsed = std::iter::once(body)
        .chain(fenced)
        .chain(embedded)
        .find_map(try_parse);

    match parsed {
        Some(analysis) => AnalysisResult::Parsed(analysis.normalized()),
        None => {
            tracing::warn!(len = body.len(), "Analysis response not structured, keeping raw text");
            AnalysisResult::RawText {
                description: body.trim().to_string(),
            }
        }
    }
}
