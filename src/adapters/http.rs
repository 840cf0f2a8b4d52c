use crate::config::{GatewayConfig, Limits};
use crate::domain::model::{Archive, ENTRY_POINT};
use crate::domain::ports::Compiler;
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::time::{Duration, Instant};

const ARCHIVE_FILE_NAME: &str = "project.zip";

/// HTTP client for the remote LaTeX compilation service.
#[derive(Debug, Clone)]
pub struct RemoteCompilerClient {
    client: Client,
    endpoint: String,
    engine: String,
    limits: Limits,
}

impl RemoteCompilerClient {
    pub fn new(
        endpoint: impl Into<String>,
        engine: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
        limits: Limits,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            engine: engine.into(),
            limits,
        })
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Self::new(
            config.remote.endpoint.clone(),
            config.remote.engine.clone(),
            &config.remote.user_agent,
            config.request_timeout(),
            config.limits,
        )
    }

    /// 讀取回應主體，超過上限立即中止
    async fn read_body(&self, mut response: Response) -> Result<Vec<u8>> {
        let limit = self.limits.max_response_body_bytes;

        if let Some(length) = response.content_length() {
            if length > limit as u64 {
                return Err(GatewayError::ResponseTooLarge { limit });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(classify_transport_error)? {
            if body.len() + chunk.len() > limit {
                return Err(GatewayError::ResponseTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

#[async_trait]
impl Compiler for RemoteCompilerClient {
    async fn compile(&self, archive: Archive) -> Result<Vec<u8>> {
        if archive.len() > self.limits.max_request_body_bytes {
            return Err(GatewayError::payload_too_large(format!(
                "Project archive is {} bytes, exceeding the request limit of {} bytes",
                archive.len(),
                self.limits.max_request_body_bytes
            )));
        }

        let archive_size = archive.len();
        let part = Part::bytes(archive.into_bytes())
            .file_name(ARCHIVE_FILE_NAME)
            .mime_str("application/zip")?;
        let form = Form::new().part("file", part);

        tracing::debug!(
            endpoint = %self.endpoint,
            engine = %self.engine,
            archive_size,
            "Sending archive to compilation service"
        );
        let started = Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("command", self.engine.as_str()), ("target", ENTRY_POINT)])
            .multipart(form)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Compilation service responded"
        );

        if status.is_success() {
            return self.read_body(response).await;
        }

        // 錯誤主體盡力讀取，失敗時仍回報狀態碼
        let log = match self.read_body(response).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!("Failed to read error body from compilation service: {}", e);
                String::new()
            }
        };

        Err(GatewayError::UpstreamFailure {
            status: status.as_u16(),
            log,
        })
    }
}

fn classify_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::UpstreamTimeout
    } else if err.is_connect() {
        GatewayError::UpstreamUnreachable
    } else {
        GatewayError::Transport(err)
    }
}
