//! Result resource handles: the transformed image kept in memory and
//! addressable without another round trip to the service.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use shared::domain::RequestId;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Raw output of a transform backend before the session tags it with a request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl TransformedImage {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHandle {
    request_id: RequestId,
    bytes: Arc<[u8]>,
    content_type: Option<String>,
}

impl ResultHandle {
    pub fn new(request_id: RequestId, image: TransformedImage) -> Self {
        Self {
            request_id,
            bytes: image.bytes.into(),
            content_type: image.content_type,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Essence of the content type (`image/png; q=1` -> `image/png`).
    pub fn mime_type(&self) -> &str {
        self.content_type
            .as_deref()
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(FALLBACK_MIME)
    }

    pub fn extension(&self) -> &'static str {
        match self.mime_type() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            other => mime_guess::get_mime_extensions_str(other)
                .and_then(|exts| exts.first().copied())
                .unwrap_or("bin"),
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }

    /// Lowercase hex SHA-256 of the image bytes.
    pub fn content_digest(&self) -> String {
        Sha256::digest(&self.bytes)
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }

    pub fn suggested_file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.extension())
    }

    /// Writes the bytes into `dir` under a content-addressed name and returns the path.
    /// An existing file with the same name and length is reused.
    pub fn persist_in(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let digest = self.content_digest();
        let path = dir.join(format!("ghibli-{}.{}", &digest[..16], self.extension()));
        if let Ok(metadata) = fs::metadata(&path) {
            if metadata.is_file() && metadata.len() == self.bytes.len() as u64 {
                return Ok(path);
            }
        }
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }

    /// Persists into `dir` and hands the file to the OS viewer.
    pub fn open_in_viewer(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = self.persist_in(dir)?;
        open_in_external_viewer(&path)?;
        Ok(path)
    }
}

/// Opens `path` with the platform's default application for its type.
pub fn open_in_external_viewer(path: &Path) -> io::Result<()> {
    #[cfg(target_os = "windows")]
    let result = std::process::Command::new("cmd")
        .args(["/C", "start", "", &path.to_string_lossy()])
        .spawn();

    #[cfg(target_os = "macos")]
    let result = std::process::Command::new("open").arg(path).spawn();

    #[cfg(all(unix, not(target_os = "macos")))]
    let result = std::process::Command::new("xdg-open").arg(path).spawn();

    #[cfg(not(any(unix, target_os = "windows")))]
    let result: io::Result<std::process::Child> = Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("no external viewer for '{}'", path.display()),
    ));

    result.map(|_| ())
}
