use super::PanelTransport;
use crate::config::PanelConfig;
use crate::error::PanelError;
use crate::model::{PanelRequest, PanelResponse, PanelResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

const ENDPOINT: &str = "full_pipeline";

/// HTTP client for the `/full_pipeline` endpoint.
#[derive(Clone)]
pub struct PipelineClient {
    http: reqwest::Client,
    url: Url,
}

impl PipelineClient {
    pub fn new(cfg: &PanelConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mbtiverse-panel/", env!("CARGO_PKG_VERSION")))
            .timeout(cfg.timeout)
            .build()
            .context("failed to build HTTP client")?;
        let url = endpoint_url(&cfg.base_url)?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

fn endpoint_url(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url.trim())
        .with_context(|| format!("invalid base URL: {base_url}"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(ENDPOINT)
        .with_context(|| format!("cannot resolve {ENDPOINT} against {base_url}"))
}

#[async_trait]
impl PanelTransport for PipelineClient {
    async fn full_pipeline(&self, request: &PanelRequest) -> Result<PanelResult, PanelError> {
        let resp = self
            .http
            .post(self.url.clone())
            .json(&request.wire_body())
            .send()
            .await
            .map_err(PanelError::transport)?;

        let status = resp.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "full_pipeline answered with an error status");
            return Err(PanelError::status(status));
        }

        let body = resp.bytes().await.map_err(PanelError::transport)?;
        debug!(bytes = body.len(), "full_pipeline response received");
        let parsed: PanelResponse = serde_json::from_slice(&body)?;
        Ok(parsed.into())
    }
}
