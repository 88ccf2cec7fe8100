//! Uploader/selector: holds the single image the user picked last.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("'{}' is not a file", path.display())]
    NotAFile { path: PathBuf },
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An image chosen by the user. Bytes are shared, so clones are cheap.
///
/// Nothing about size or format is enforced here; the hints shown next to
/// the drop zone are advisory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    file_name: String,
    mime_type: Option<String>,
    bytes: Arc<[u8]>,
}

impl SelectedImage {
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_raw()
            .map(str::to_string);
        Self {
            file_name,
            mime_type,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub async fn from_path(path: &Path) -> Result<Self, SelectionError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| SelectionError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if !metadata.is_file() {
            return Err(SelectionError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SelectionError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        debug!(file_name = %file_name, bytes = bytes.len(), "selection: loaded file");
        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
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
}

/// Holds at most one pending selection. A new selection replaces the old one.
#[derive(Debug, Default)]
pub struct Selector {
    pending: Option<SelectedImage>,
}

impl Selector {
    /// Returns the selection that was replaced, if any.
    pub fn select(&mut self, image: SelectedImage) -> Option<SelectedImage> {
        self.pending.replace(image)
    }

    pub fn pending(&self) -> Option<&SelectedImage> {
        self.pending.as_ref()
    }

    pub fn clear(&mut self) -> Option<SelectedImage> {
        self.pending.take()
    }

    pub fn has_selection(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_mime_from_file_name() {
        let image = SelectedImage::from_bytes("holiday.JPG", vec![1, 2, 3]);
        assert_eq!(image.mime_type(), Some("image/jpeg"));
        assert_eq!(image.len(), 3);

        let unknown = SelectedImage::from_bytes("blob", Vec::new());
        assert_eq!(unknown.mime_type(), None);
        assert!(unknown.is_empty());
    }

    #[test]
    fn selector_keeps_only_latest() {
        let mut selector = Selector::default();
        assert!(selector.select(SelectedImage::from_bytes("a.png", vec![1])).is_none());
        let replaced = selector.select(SelectedImage::from_bytes("b.png", vec![2]));
        assert_eq!(replaced.map(|img| img.file_name().to_string()), Some("a.png".into()));
        assert_eq!(selector.pending().map(|img| img.file_name()), Some("b.png"));
        selector.clear();
        assert!(!selector.has_selection());
    }

    #[tokio::test]
    async fn missing_path_reports_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = SelectedImage::from_path(&dir.path().join("nope.png"))
            .await
            .expect_err("missing file");
        assert!(matches!(err, SelectionError::Io { .. }));
    }
}
