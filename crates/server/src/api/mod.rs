//! Transform relay logic, independent of the HTTP framing in `main.rs`.

use std::sync::Arc;

use async_trait::async_trait;
use client_core::{
    HttpTransformClient, SelectedImage, TransformBackend, TransformClientConfig, TransformError,
};
use shared::error::{ApiError, ErrorCode};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{Settings, UpstreamMode};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream rejected image with HTTP {status}: {diagnostic}")]
    Rejected { status: u16, diagnostic: String },
    #[error("upstream unreachable: {0}")]
    Unreachable(String),
    #[error("no transformation backend configured")]
    Disabled,
}

#[async_trait]
pub trait Upstream: Send + Sync {
    fn name(&self) -> &'static str;
    async fn transform(&self, image: UploadedImage) -> Result<RelayedImage, UpstreamError>;
}

/// Forwards to the real engine through the same multipart client the apps use.
pub struct HttpUpstream {
    client: HttpTransformClient,
}

impl HttpUpstream {
    pub fn new(config: TransformClientConfig) -> Result<Self, TransformError> {
        Ok(Self {
            client: HttpTransformClient::new(config)?,
        })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn transform(&self, image: UploadedImage) -> Result<RelayedImage, UpstreamError> {
        let mut selected = SelectedImage::from_bytes(image.file_name, image.bytes);
        if let Some(content_type) = image.content_type {
            selected = selected.with_mime_type(content_type);
        }
        match self.client.transform(&selected).await {
            Ok(result) => Ok(RelayedImage {
                content_type: result
                    .content_type
                    .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string()),
                bytes: result.bytes,
            }),
            Err(TransformError::RemoteTransform { status, body }) => Err(UpstreamError::Rejected {
                status,
                diagnostic: ApiError::diagnostic_from_body(&body),
            }),
            Err(other) => Err(UpstreamError::Unreachable(other.to_string())),
        }
    }
}

pub struct EchoUpstream;

#[async_trait]
impl Upstream for EchoUpstream {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn transform(&self, image: UploadedImage) -> Result<RelayedImage, UpstreamError> {
        Ok(RelayedImage {
            content_type: image
                .content_type
                .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string()),
            bytes: image.bytes,
        })
    }
}

pub struct DisabledUpstream;

#[async_trait]
impl Upstream for DisabledUpstream {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn transform(&self, _image: UploadedImage) -> Result<RelayedImage, UpstreamError> {
        Err(UpstreamError::Disabled)
    }
}

#[derive(Clone)]
pub struct ApiContext {
    pub upstream: Arc<dyn Upstream>,
    pub max_upload_bytes: usize,
}

impl ApiContext {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let upstream: Arc<dyn Upstream> = match settings.effective_mode() {
            UpstreamMode::Http => {
                let endpoint = settings.upstream_url.clone().ok_or_else(|| {
                    anyhow::anyhow!("upstream_mode is http but no upstream_url is configured")
                })?;
                Arc::new(HttpUpstream::new(TransformClientConfig {
                    endpoint,
                    ..TransformClientConfig::default()
                }
                .with_timeout(settings.upstream_timeout))?)
            }
            UpstreamMode::Echo => {
                warn!("relay running in echo mode; uploads are returned unchanged");
                Arc::new(EchoUpstream)
            }
            UpstreamMode::Disabled => Arc::new(DisabledUpstream),
        };
        Ok(Self {
            upstream,
            max_upload_bytes: settings.max_upload_bytes,
        })
    }
}

pub fn transform_route() -> &'static str {
    shared::protocol::TRANSFORM_ROUTE
}

pub async fn relay_transform(
    ctx: &ApiContext,
    upload: Option<UploadedImage>,
) -> Result<RelayedImage, ApiError> {
    let Some(upload) = upload else {
        return Err(ApiError::new(ErrorCode::Validation, "No image file provided"));
    };
    if upload.bytes.is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "Image file is empty"));
    }
    if upload.bytes.len() > ctx.max_upload_bytes {
        return Err(ApiError::new(
            ErrorCode::PayloadTooLarge,
            format!("image exceeds {} bytes", ctx.max_upload_bytes),
        ));
    }

    let file_name = upload.file_name.clone();
    let size_bytes = upload.bytes.len();
    match ctx.upstream.transform(upload).await {
        Ok(relayed) => {
            info!(
                upstream = ctx.upstream.name(),
                file_name = %file_name,
                in_bytes = size_bytes,
                out_bytes = relayed.bytes.len(),
                "relay: image transformed"
            );
            Ok(relayed)
        }
        Err(UpstreamError::Rejected { status, diagnostic }) => {
            warn!(status, diagnostic = %diagnostic, "relay: upstream rejected image");
            let message = if diagnostic.is_empty() {
                format!("Upstream rejected image (HTTP {status})")
            } else {
                diagnostic
            };
            Err(ApiError::new(ErrorCode::Upstream, message))
        }
        Err(UpstreamError::Unreachable(reason)) => {
            error!(%reason, "relay: error processing image");
            Err(ApiError::new(ErrorCode::Upstream, "Failed to process image"))
        }
        Err(UpstreamError::Disabled) => Err(ApiError::new(
            ErrorCode::Unavailable,
            "No transformation backend configured",
        )),
    }
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
