use super::*;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Debug, Clone)]
struct ReceivedField {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct MockState {
    tx: Arc<Mutex<Option<oneshot::Sender<Vec<ReceivedField>>>>>,
    status: StatusCode,
    content_type: &'static str,
    body: Vec<u8>,
}

async fn handle_transform(
    State(state): State<MockState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        fields.push(ReceivedField {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(fields);
    }
    (
        state.status,
        [(header::CONTENT_TYPE, state.content_type)],
        state.body.clone(),
    )
}

async fn spawn_transform_server(
    status: StatusCode,
    content_type: &'static str,
    body: &[u8],
) -> Result<(String, oneshot::Receiver<Vec<ReceivedField>>), std::io::Error> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let state = MockState {
        tx: Arc::new(Mutex::new(Some(tx))),
        status,
        content_type,
        body: body.to_vec(),
    };
    let app = Router::new()
        .route("/api/transform", post(handle_transform))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/api/transform"), rx))
}

fn client_for(endpoint: String) -> HttpTransformClient {
    HttpTransformClient::new(TransformClientConfig {
        endpoint,
        ..TransformClientConfig::default()
    })
    .expect("client")
}

#[tokio::test]
async fn posts_one_image_field_and_returns_binary_body() {
    let stylized = b"\x89PNG\r\n\x1a\nstylized".to_vec();
    let (endpoint, uploads_rx) = spawn_transform_server(StatusCode::OK, "image/png", &stylized)
        .await
        .expect("spawn server");
    let client = client_for(endpoint);
    let image = SelectedImage::from_bytes("photo.jpg", b"jpeg-bytes".to_vec());

    let result = client.transform(&image).await.expect("transform");
    assert_eq!(result.bytes, stylized);
    assert_eq!(result.content_type.as_deref(), Some("image/png"));

    let fields = uploads_rx.await.expect("uploads");
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "image");
    assert_eq!(fields[0].file_name.as_deref(), Some("photo.jpg"));
    assert_eq!(fields[0].content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(fields[0].bytes, b"jpeg-bytes");
}

#[tokio::test]
async fn non_success_status_carries_response_body() {
    let (endpoint, _uploads_rx) =
        spawn_transform_server(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", b"bad image")
            .await
            .expect("spawn server");
    let client = client_for(endpoint);
    let image = SelectedImage::from_bytes("photo.png", b"png".to_vec());

    let err = client.transform(&image).await.expect_err("must fail");
    assert_eq!(err.kind(), TransformErrorKind::RemoteTransform);
    match &err {
        TransformError::RemoteTransform { status, body } => {
            assert_eq!(*status, 500);
            assert!(body.contains("bad image"), "unexpected body: {body}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.user_message().contains("bad image"));
}

/// Answers 500 with a body shorter than its Content-Length, then hangs up.
async fn spawn_truncated_error_server() -> Result<String, std::io::Error> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];
        while !request.ends_with(b"--\r\n") {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&chunk[..n]),
            }
        }
        let _ = socket
            .write_all(
                b"HTTP/1.1 500 Internal Server Error\r\ncontent-type: text/plain\r\ncontent-length: 100\r\n\r\nbad",
            )
            .await;
        let _ = socket.shutdown().await;
    });
    Ok(format!("http://{addr}/api/transform"))
}

#[tokio::test]
async fn unreadable_error_body_still_reports_remote_status() {
    let endpoint = spawn_truncated_error_server().await.expect("spawn server");
    let client = client_for(endpoint);
    let image = SelectedImage::from_bytes("photo.png", b"png".to_vec());

    let err = client.transform(&image).await.expect_err("must fail");
    match err {
        TransformError::RemoteTransform { status, body } => {
            assert_eq!(status, 500);
            assert!(body.is_empty(), "unexpected body: {body}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = client_for(format!("http://{addr}/api/transform"));
    let image = SelectedImage::from_bytes("photo.png", b"png".to_vec());
    let err = client.transform(&image).await.expect_err("must fail");
    assert_eq!(err.kind(), TransformErrorKind::Network);
}

#[test]
fn rejects_endpoints_that_are_not_http_urls() {
    for endpoint in ["ftp://example.com/upload", "not a url", ""] {
        let err = HttpTransformClient::new(TransformClientConfig {
            endpoint: endpoint.to_string(),
            ..TransformClientConfig::default()
        })
        .err()
        .expect("must reject");
        assert_eq!(err.kind(), TransformErrorKind::InvalidEndpoint, "{endpoint}");
    }
}

#[test]
fn explicit_endpoint_wins_and_is_trimmed() {
    let config = TransformClientConfig::resolve(Some("  http://render.local/api/transform ".into()));
    assert_eq!(config.endpoint, "http://render.local/api/transform");
    assert_eq!(config.field_name, "image");
    assert_eq!(config.request_timeout, None);
}

#[tokio::test]
async fn controller_pipeline_exposes_response_as_result_handle() {
    let stylized = b"ghibli-rendition".to_vec();
    let (endpoint, _uploads_rx) = spawn_transform_server(StatusCode::OK, "image/webp", &stylized)
        .await
        .expect("spawn server");
    let controller = TransformController::new(Arc::new(client_for(endpoint)));

    controller
        .select(SelectedImage::from_bytes("cat.png", b"cat".to_vec()))
        .await;
    let request_id = controller.trigger().await.expect("request issued");

    let result = controller.result().await.expect("result handle");
    assert_eq!(result.request_id(), request_id);
    assert_eq!(result.bytes(), stylized.as_slice());
    assert_eq!(result.extension(), "webp");
}

#[tokio::test]
async fn controller_pipeline_failure_leaves_no_result() {
    let (endpoint, _uploads_rx) =
        spawn_transform_server(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", b"bad image")
            .await
            .expect("spawn server");
    let controller = TransformController::new(Arc::new(client_for(endpoint)));

    controller
        .select(SelectedImage::from_bytes("cat.png", b"cat".to_vec()))
        .await;
    controller.trigger().await.expect("request issued");

    assert!(controller.result().await.is_none());
    match controller.snapshot().await.status {
        TransformStatus::Failed { kind, message, .. } => {
            assert_eq!(kind, TransformErrorKind::RemoteTransform);
            assert!(message.contains("bad image"), "unexpected message: {message}");
        }
        other => panic!("unexpected status: {other:?}"),
    }
}
