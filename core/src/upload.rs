//! Upload client for the image-hosting service: one authenticated multipart POST
//! per call, response parsed into an explicit outcome. No retries here; transport
//! failures (connect, timeout) surface as errors for the caller to absorb.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::im::log::truncate_content_default;
use crate::store::LocalArtifact;

/// Field name the remote API expects for the file part.
const UPLOAD_FIELD: &str = "images[]";
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Public relative URLs of the derived representations returned by the image host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageUrls {
    pub original: String,
    pub webp: String,
    pub avif: String,
}

/// Parsed outcome of one upload attempt.
#[derive(Debug)]
pub enum UploadOutcome {
    /// HTTP 200 with a well-formed body whose first result reports "success".
    Success(ImageUrls),
    /// Any non-200 status. The caller logs this at error level.
    NonSuccessStatus { status: StatusCode, body: String },
    /// HTTP 200 but the body is not the expected shape. The remote side effect
    /// likely happened anyway, so this is a soft condition logged at info level.
    Unparseable { body: String },
    /// Well-formed 200 whose first result reports a status other than "success".
    LogicalFailure { status: String },
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    results: Vec<UploadEntry>,
}

#[derive(Debug, Deserialize)]
struct UploadEntry {
    status: String,
    #[serde(default)]
    urls: Option<ImageUrls>,
}

/// Client for `POST {base}/api/upload` with bearer-token auth.
pub struct UploadClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl UploadClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("reqwest client")?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Submit the artifact as a single `images[]` multipart part. Exactly one HTTP
    /// attempt per call; every interpretable response becomes an `UploadOutcome`.
    pub async fn upload(&self, artifact: &LocalArtifact) -> Result<UploadOutcome> {
        let bytes = tokio::fs::read(artifact.path())
            .await
            .with_context(|| format!("read artifact {}", artifact.path().display()))?;
        let part = reqwest::multipart::Part::bytes(bytes).file_name(artifact.file_name().to_string());
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);

        let res = self
            .client
            .post(format!("{}/api/upload", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .context("upload request")?;

        let status = res.status();
        let body = res.text().await.context("read upload response")?;
        if status != StatusCode::OK {
            return Ok(UploadOutcome::NonSuccessStatus { status, body });
        }

        Ok(interpret_body(&body, artifact.file_name()))
    }
}

/// Interpret a 200 body: only the first entry of `results` is read. Bodies that do
/// not parse are a soft condition, not an error.
fn interpret_body(body: &str, file_name: &str) -> UploadOutcome {
    let parsed: UploadResponse = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(_) => {
            info!(file = file_name, body = %truncate_content_default(body), "upload acknowledged with a non-JSON body");
            return UploadOutcome::Unparseable { body: body.to_string() };
        }
    };

    let Some(first) = parsed.results.into_iter().next() else {
        info!(file = file_name, "upload acknowledged with an empty result list");
        return UploadOutcome::Unparseable { body: body.to_string() };
    };

    if first.status != "success" {
        return UploadOutcome::LogicalFailure { status: first.status };
    }

    match first.urls {
        Some(urls) => {
            info!(file = file_name, original = %urls.original, "upload succeeded");
            UploadOutcome::Success(urls)
        }
        None => {
            info!(file = file_name, "success result without urls");
            UploadOutcome::Unparseable { body: body.to_string() }
        }
    }
}
