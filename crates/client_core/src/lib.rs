use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
    Client,
};
use shared::protocol::{DEFAULT_TRANSFORM_ENDPOINT, IMAGE_FIELD, TRANSFORM_ENDPOINT_ENV};
use tracing::{info, warn};
use url::Url;

pub mod controller;
pub mod error;
pub mod pricing;
pub mod resource;
pub mod selection;
pub mod session;

pub use controller::{SessionSnapshot, TransformController, TransformEvent};
pub use error::{TransformError, TransformErrorKind};
pub use pricing::PlanCarousel;
pub use resource::{open_in_external_viewer, ResultHandle, TransformedImage};
pub use selection::{SelectedImage, SelectionError, Selector};
pub use session::{
    Completion, TransformPhase, TransformSession, TransformStatus, TransformTicket, TriggerRefusal,
};

/// Anything that can turn an uploaded image into a stylized one.
#[async_trait]
pub trait TransformBackend: Send + Sync {
    async fn transform(&self, image: &SelectedImage) -> Result<TransformedImage, TransformError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformClientConfig {
    pub endpoint: String,
    pub field_name: String,
    /// `None` leaves the transport defaults in charge.
    pub request_timeout: Option<Duration>,
}

impl Default for TransformClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TRANSFORM_ENDPOINT.to_string(),
            field_name: IMAGE_FIELD.to_string(),
            request_timeout: None,
        }
    }
}

impl TransformClientConfig {
    /// Explicit endpoint first, then `GHIBLI_TRANSFORM_URL`, then the default.
    pub fn resolve(explicit_endpoint: Option<String>) -> Self {
        let from_env = std::env::var(TRANSFORM_ENDPOINT_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        let endpoint = explicit_endpoint
            .filter(|value| !value.trim().is_empty())
            .or(from_env)
            .unwrap_or_else(|| DEFAULT_TRANSFORM_ENDPOINT.to_string());
        Self {
            endpoint: endpoint.trim().to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

pub fn parse_endpoint(raw: &str) -> Result<Url, TransformError> {
    let url = Url::parse(raw.trim()).map_err(|e| TransformError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(TransformError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Sends a single-part multipart POST to a fixed endpoint and returns the body bytes.
pub struct HttpTransformClient {
    http: Client,
    endpoint: Url,
    field_name: String,
}

impl HttpTransformClient {
    pub fn new(config: TransformClientConfig) -> Result<Self, TransformError> {
        let endpoint = parse_endpoint(&config.endpoint)?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(TransformError::from_transport)?;
        Ok(Self {
            http,
            endpoint,
            field_name: config.field_name,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_form(&self, image: &SelectedImage) -> Form {
        let part = || Part::bytes(image.bytes().to_vec()).file_name(image.file_name().to_string());
        let part = match image.mime_type() {
            Some(mime) => part().mime_str(mime).unwrap_or_else(|err| {
                warn!(mime, error = %err, "transform: ignoring unparseable mime type");
                part()
            }),
            None => part(),
        };
        Form::new().part(self.field_name.clone(), part)
    }
}

#[async_trait]
impl TransformBackend for HttpTransformClient {
    async fn transform(&self, image: &SelectedImage) -> Result<TransformedImage, TransformError> {
        info!(
            endpoint = %self.endpoint,
            file_name = image.file_name(),
            bytes = image.len(),
            "transform: posting image"
        );
        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(self.build_form(image))
            .send()
            .await
            .map_err(TransformError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    warn!(
                        status = status.as_u16(),
                        error = %err,
                        "transform: could not read error body"
                    );
                    String::new()
                }
            };
            return Err(TransformError::RemoteTransform {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(TransformError::from_transport)?;
        info!(
            status = status.as_u16(),
            bytes = bytes.len(),
            "transform: response received"
        );
        Ok(TransformedImage::new(bytes.to_vec(), content_type))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
