//! Gemini-backed classification oracle (generative language API).

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::OracleConfig;
use crate::error::{OracleError, Result};
use crate::metrics::{get_metrics, Metrics};
use crate::utils::truncate_str;

use super::{prompts, ClassificationOracle, OracleFile};

/// Oracle implementation talking to a Gemini-style REST endpoint.
///
/// One raw file upload per classification, then one `generateContent`
/// call per dimension with temperature 0 and a JSON response schema, so
/// the model returns exactly the step answers and nothing else.
pub struct GeminiOracle {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    upload_timeout: Duration,
}

/// `generateContent` request format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: ContentPayload<'a>,
    contents: Vec<ContentPayload<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct ContentPayload<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData<'a>>,
}

impl<'a> Part<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            text: Some(text),
            file_data: None,
        }
    }

    fn file(file: &'a OracleFile) -> Self {
        Self {
            text: None,
            file_data: Some(FileData {
                file_uri: &file.uri,
                mime_type: &file.mime_type,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    file_uri: &'a str,
    mime_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    candidate_count: u32,
    response_mime_type: &'static str,
    response_schema: Value,
}

/// `generateContent` response format.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// File upload response format.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    uri: String,
    #[allow(dead_code)]
    name: Option<String>,
    #[allow(dead_code)]
    state: Option<String>,
}

/// Google API error response format.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[allow(dead_code)]
    status: Option<String>,
    #[allow(dead_code)]
    code: Option<i32>,
}

/// Constrained schema for single-match answers.
fn single_response_schema() -> Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "step_1": { "type": "STRING" },
            "step_3": { "type": "STRING" }
        },
        "required": ["step_1", "step_3"]
    })
}

/// Constrained schema for multi-match answers.
fn multi_response_schema() -> Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "step_1": { "type": "STRING" },
            "step_3": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["step_1", "step_3"]
    })
}

/// Single-match step answer, as constrained by the response schema.
#[derive(Debug, Deserialize)]
struct SingleAnswer {
    #[allow(dead_code)]
    step_1: String,
    step_3: String,
}

/// Multi-match step answer.
#[derive(Debug, Deserialize)]
struct MultiAnswer {
    #[allow(dead_code)]
    step_1: String,
    step_3: Vec<String>,
}

fn map_request_error(e: reqwest::Error) -> OracleError {
    if e.is_timeout() {
        OracleError::Timeout
    } else if e.is_connect() {
        OracleError::Api(format!("Connection failed: {}", e))
    } else {
        OracleError::Api(format!("Request failed: {}", e))
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    // Try to parse as Google error format
    if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
        error_response.error.message
    } else {
        error_text
    }
}

impl GeminiOracle {
    /// Create a new Gemini oracle from configuration.
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or(OracleError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            upload_timeout: Duration::from_secs(config.upload_timeout_secs),
        })
    }

    /// Make a `generateContent` request and return the answer text.
    async fn generate(
        &self,
        file: &OracleFile,
        prompt: &str,
        response_schema: Value,
    ) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let request = GenerateRequest {
            system_instruction: ContentPayload {
                parts: vec![Part::text(prompts::SYSTEM_INSTRUCTION)],
            },
            contents: vec![ContentPayload {
                parts: vec![Part::file(file), Part::text(prompt)],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                candidate_count: 1,
                response_mime_type: "application/json",
                response_schema,
            },
        };

        let metrics = get_metrics();
        metrics.oracle_requests_total.inc();
        let _timer = Metrics::start_timer(&metrics.oracle_request_duration_seconds);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                metrics.oracle_errors_total.inc();
                map_request_error(e)
            })?;

        let status = response.status();

        if status.is_success() {
            let result: GenerateResponse = response.json().await.map_err(|e| {
                OracleError::MalformedResponse(format!("Failed to parse response: {}", e))
            })?;

            let text: String = result
                .candidates
                .into_iter()
                .next()
                .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
                .ok_or_else(|| {
                    OracleError::MalformedResponse("No candidates returned".to_string())
                })?;

            Ok(text)
        } else if status.as_u16() == 429 {
            metrics.oracle_errors_total.inc();
            Err(OracleError::RateLimited.into())
        } else {
            metrics.oracle_errors_total.inc();
            Err(OracleError::Api(format!(
                "API error ({}): {}",
                status,
                error_message(response).await
            ))
            .into())
        }
    }
}

#[async_trait]
impl ClassificationOracle for GeminiOracle {
    async fn upload(
        &self,
        display_name: &str,
        mime_type: &str,
        content: Bytes,
    ) -> Result<OracleFile> {
        let url = format!("{}/upload/v1beta/files", self.base_url);

        tracing::debug!(
            name = display_name,
            mime_type = mime_type,
            size = content.len(),
            "Uploading file to oracle"
        );

        let metrics = get_metrics();
        metrics.oracle_requests_total.inc();
        let _timer = Metrics::start_timer(&metrics.oracle_request_duration_seconds);

        // Raw upload protocol: content in the body, type in the header.
        let response = self
            .client
            .post(&url)
            .timeout(self.upload_timeout)
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("Content-Type", mime_type)
            .body(content)
            .send()
            .await
            .map_err(|e| {
                metrics.oracle_errors_total.inc();
                map_request_error(e)
            })?;

        let status = response.status();

        if status.is_success() {
            let result: UploadResponse = response.json().await.map_err(|e| {
                OracleError::Upload(format!("Failed to parse upload response: {}", e))
            })?;

            Ok(OracleFile {
                uri: result.file.uri,
                mime_type: mime_type.to_string(),
            })
        } else if status.as_u16() == 429 {
            metrics.oracle_errors_total.inc();
            Err(OracleError::RateLimited.into())
        } else {
            metrics.oracle_errors_total.inc();
            Err(OracleError::Upload(format!(
                "Upload failed ({}): {}",
                status,
                error_message(response).await
            ))
            .into())
        }
    }

    async fn best_match(
        &self,
        file: &OracleFile,
        taxonomy: &str,
        priming_instruction: &str,
        matching_instruction: &str,
    ) -> Result<String> {
        let prompt = prompts::single_prompt(taxonomy, priming_instruction, matching_instruction);
        let text = self.generate(file, &prompt, single_response_schema()).await?;

        let answer: SingleAnswer = serde_json::from_str(&text).map_err(|_| {
            OracleError::MalformedResponse(format!(
                "Expected step answer object, got: {}",
                truncate_str(&text, 200)
            ))
        })?;

        Ok(answer.step_3)
    }

    async fn all_matches(
        &self,
        file: &OracleFile,
        taxonomy: &str,
        priming_instruction: &str,
        matching_instruction: &str,
    ) -> Result<Vec<String>> {
        let prompt = prompts::multi_prompt(taxonomy, priming_instruction, matching_instruction);
        let text = self.generate(file, &prompt, multi_response_schema()).await?;

        let answer: MultiAnswer = serde_json::from_str(&text).map_err(|_| {
            OracleError::MalformedResponse(format!(
                "Expected step answer object, got: {}",
                truncate_str(&text, 200)
            ))
        })?;

        Ok(answer.step_3)
    }
}
