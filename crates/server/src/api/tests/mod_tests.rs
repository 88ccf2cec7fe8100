use super::*;

fn upload(bytes: &[u8]) -> UploadedImage {
    UploadedImage {
        file_name: "photo.png".to_string(),
        content_type: Some("image/png".to_string()),
        bytes: bytes.to_vec(),
    }
}

fn ctx(upstream: Arc<dyn Upstream>) -> ApiContext {
    ApiContext {
        upstream,
        max_upload_bytes: 16,
    }
}

struct RejectingUpstream(&'static str);

#[async_trait]
impl Upstream for RejectingUpstream {
    fn name(&self) -> &'static str {
        "rejecting"
    }

    async fn transform(&self, _image: UploadedImage) -> Result<RelayedImage, UpstreamError> {
        Err(UpstreamError::Rejected {
            status: 422,
            diagnostic: self.0.to_string(),
        })
    }
}

#[tokio::test]
async fn missing_upload_is_a_validation_error() {
    let err = relay_transform(&ctx(Arc::new(EchoUpstream)), None)
        .await
        .expect_err("should fail");
    assert!(matches!(err.code, Some(ErrorCode::Validation)));
    assert_eq!(err.message, "No image file provided");
}

#[tokio::test]
async fn empty_upload_is_rejected() {
    let err = relay_transform(&ctx(Arc::new(EchoUpstream)), Some(upload(b"")))
        .await
        .expect_err("should fail");
    assert!(matches!(err.code, Some(ErrorCode::Validation)));
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_upstream() {
    let err = relay_transform(&ctx(Arc::new(EchoUpstream)), Some(upload(&[0u8; 17])))
        .await
        .expect_err("should fail");
    assert!(matches!(err.code, Some(ErrorCode::PayloadTooLarge)));
}

#[tokio::test]
async fn echo_returns_upload_unchanged() {
    let relayed = relay_transform(&ctx(Arc::new(EchoUpstream)), Some(upload(b"pixels")))
        .await
        .expect("relay");
    assert_eq!(relayed.bytes, b"pixels");
    assert_eq!(relayed.content_type, "image/png");
}

#[tokio::test]
async fn upstream_rejection_keeps_diagnostic() {
    let err = relay_transform(
        &ctx(Arc::new(RejectingUpstream("bad image"))),
        Some(upload(b"pixels")),
    )
    .await
    .expect_err("should fail");
    assert!(matches!(err.code, Some(ErrorCode::Upstream)));
    assert_eq!(err.message, "bad image");
}

#[tokio::test]
async fn disabled_upstream_reports_unavailable() {
    let err = relay_transform(&ctx(Arc::new(DisabledUpstream)), Some(upload(b"pixels")))
        .await
        .expect_err("should fail");
    assert!(matches!(err.code, Some(ErrorCode::Unavailable)));
}

#[test]
fn http_mode_requires_upstream_url() {
    let settings = Settings {
        upstream_mode: Some(UpstreamMode::Http),
        ..Settings::default()
    };
    let err = ApiContext::from_settings(&settings)
        .err()
        .expect("missing url");
    assert!(err.to_string().contains("upstream_url"));
}

#[test]
fn context_picks_upstream_from_settings() {
    let echo = ApiContext::from_settings(&Settings::default()).expect("echo");
    assert_eq!(echo.upstream.name(), "echo");

    let http = ApiContext::from_settings(&Settings {
        upstream_url: Some("http://engine.local/stylize".to_string()),
        ..Settings::default()
    })
    .expect("http");
    assert_eq!(http.upstream.name(), "http");
}
