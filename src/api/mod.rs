// KHDA inspection API client

use anyhow::Context;
use reqwest::{multipart, Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::models::SelectedFile;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx answer; `detail` comes from the JSON error body when present
    #[error("Server returned {status}{}", format_detail(.detail))]
    Server {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Failed to read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[allow(clippy::ref_option)]
fn format_detail(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl ApiError {
    /// Message reported by the server, if it sent one
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Server { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// URLs derived from the API base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub analyze: String,
    pub report: String,
    /// Prefix for report downloads; the report filename is appended as-is
    pub downloads: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = base_url.trim().trim_end_matches('/');
        let parsed =
            Url::parse(base).with_context(|| format!("Invalid API base URL '{base_url}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Invalid API base URL '{base_url}': expected http or https");
        }

        Ok(Self {
            analyze: format!("{base}/analysis/analyze"),
            report: format!("{base}/inspection/generate-report"),
            downloads: format!("{base}/reports/"),
        })
    }

    pub fn download_url(&self, report_filename: &str) -> String {
        format!("{}{report_filename}", self.downloads)
    }
}

#[derive(Debug, Serialize)]
pub struct ReportRequest<'a> {
    pub analysis_text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportResponse {
    #[serde(default)]
    pub report_filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct InspectionClient {
    endpoints: Endpoints,
    client: Client,
}

impl InspectionClient {
    /// Requests never time out unless `request_timeout` (seconds) is given
    pub fn new(endpoints: Endpoints, request_timeout: Option<u64>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = request_timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self { endpoints, client })
    }

    /// Upload a document as multipart field `file` and return the analysis text
    pub async fn analyze(&self, file: &SelectedFile) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| ApiError::File {
                path: file.path.clone(),
                source,
            })?;

        let part = multipart::Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(content_type_for(&file.name))?;
        let form = multipart::Form::new().part("file", part);

        tracing::info!(file = %file.name, url = %self.endpoints.analyze, "uploading document for analysis");

        let response = self
            .client
            .post(&self.endpoints.analyze)
            .multipart(form)
            .send()
            .await?;

        let body: AnalyzeResponse = read_json(response).await?;
        Ok(body.result.unwrap_or_default())
    }

    /// Ask the API to build a report from analysis text and return its filename
    pub async fn generate_report(&self, analysis_text: &str) -> Result<String, ApiError> {
        tracing::info!(url = %self.endpoints.report, chars = analysis_text.len(), "requesting report generation");

        let response = self
            .client
            .post(&self.endpoints.report)
            .json(&ReportRequest { analysis_text })
            .send()
            .await?;

        let body: ReportResponse = read_json(response).await?;
        Ok(body.report_filename.unwrap_or_default())
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.detail)
            .and_then(|detail| match detail {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .filter(|detail| !detail.is_empty());
        tracing::warn!(%status, ?detail, "API request failed");
        return Err(ApiError::Server { status, detail });
    }

    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "md" => "text/markdown",
        _ => "application/octet-stream",
    }
}
