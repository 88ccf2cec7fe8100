use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{HEALTH_ROUTE, IMAGE_FIELD},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};

mod api;
mod app_state;
mod config;

use api::{relay_transform, transform_route, ApiContext, UploadedImage};
use app_state::AppState;
use config::load_settings;

/// Room for multipart boundaries and part headers on top of the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let api = ApiContext::from_settings(&settings).map_err(|error| {
        error!(%error, "failed to configure transform upstream");
        error
    })?;
    info!(
        upstream = api.upstream.name(),
        max_upload_bytes = api.max_upload_bytes,
        "relay configured"
    );
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "relay listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.api.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    Router::new()
        .route(HEALTH_ROUTE, get(healthz))
        .route(transform_route(), post(transform))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn transform(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    let upload = read_image_field(&mut multipart).await.map_err(reject)?;
    let relayed = relay_transform(&state.api, upload).await.map_err(reject)?;
    Ok((
        [(header::CONTENT_TYPE, relayed.content_type)],
        relayed.bytes,
    )
        .into_response())
}

/// Pulls the first `image` field out of the form. Other fields are drained and ignored.
async fn read_image_field(multipart: &mut Multipart) -> Result<Option<UploadedImage>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(UploadedImage {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(ErrorCode::PayloadTooLarge, err.body_text())
    } else {
        ApiError::new(ErrorCode::Validation, err.body_text())
    }
}

fn status_for(code: Option<ErrorCode>) -> StatusCode {
    match code {
        Some(ErrorCode::Validation) => StatusCode::BAD_REQUEST,
        Some(ErrorCode::PayloadTooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
        Some(ErrorCode::Upstream) => StatusCode::BAD_GATEWAY,
        Some(ErrorCode::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
        Some(ErrorCode::Internal) | None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
