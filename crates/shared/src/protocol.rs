/// Route served by the transform relay and expected by the default client endpoint.
pub const TRANSFORM_ROUTE: &str = "/api/transform";
pub const HEALTH_ROUTE: &str = "/healthz";

/// Multipart field that carries the uploaded image.
pub const IMAGE_FIELD: &str = "image";

pub const DEFAULT_TRANSFORM_ENDPOINT: &str = "http://127.0.0.1:8787/api/transform";

/// Env var consulted by clients when no endpoint is passed explicitly.
pub const TRANSFORM_ENDPOINT_ENV: &str = "GHIBLI_TRANSFORM_URL";

/// Upload size advertised to users. The relay enforces it; clients only display it.
pub const ADVISORY_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const ADVISORY_FORMATS: &[&str] = &["JPG", "PNG", "WEBP"];

pub fn advisory_upload_hint() -> String {
    format!(
        "Supports {} (Max {}MB)",
        ADVISORY_FORMATS.join(", "),
        ADVISORY_MAX_UPLOAD_BYTES / (1024 * 1024)
    )
}
