//! Image decoding, clipboard export, and file naming helpers.

use std::path::Path;

use arboard::{Clipboard, ImageData};
use chrono::{DateTime, Local};
use client_core::ResultHandle;

const PREVIEW_MAX_DIMENSION: u32 = 1024;

/// Decoded RGBA pixels ready to be uploaded as an egui texture.
#[derive(Clone)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

impl PreviewImage {
    pub fn size(&self) -> [usize; 2] {
        [self.width, self.height]
    }
}

pub fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let resized = dynamic
        .thumbnail(PREVIEW_MAX_DIMENSION, PREVIEW_MAX_DIMENSION)
        .to_rgba8();
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(PreviewImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}

pub fn decode_image_for_clipboard(bytes: &[u8]) -> Result<(Vec<u8>, usize, usize), String> {
    let decoded = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let rgba = decoded.to_rgba8();
    let (width, height) = (rgba.width() as usize, rgba.height() as usize);
    Ok((rgba.into_raw(), width, height))
}

pub fn write_clipboard_image(rgba: &[u8], width: usize, height: usize) -> Result<(), String> {
    let mut clipboard = Clipboard::new().map_err(|err| err.to_string())?;
    clipboard
        .set_image(ImageData {
            width,
            height,
            bytes: std::borrow::Cow::Borrowed(rgba),
        })
        .map_err(|err| err.to_string())
}

pub fn human_readable_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        return format!("{bytes} B");
    }
    if bytes < MB {
        return format_scaled_unit(bytes, KB, "KB");
    }
    if bytes < GB {
        return format_scaled_unit(bytes, MB, "MB");
    }
    format_scaled_unit(bytes, GB, "GB")
}

fn format_scaled_unit(bytes: u64, unit_size: u64, unit_label: &str) -> String {
    let value = bytes as f64 / unit_size as f64;
    let value_text = format!("{value:.1}");
    let compact_value = value_text.strip_suffix(".0").unwrap_or(&value_text);
    format!("{compact_value} {unit_label}")
}

/// `<source stem>-ghibli-<timestamp>.<ext>`, or `ghibli-<timestamp>.<ext>` without a source.
pub fn suggested_download_name(
    source_file_name: Option<&str>,
    result: &ResultHandle,
    now: DateTime<Local>,
) -> String {
    let timestamp = now.format("%Y%m%d-%H%M%S");
    let stem = source_file_name
        .and_then(|name| Path::new(name).file_stem())
        .map(|stem| stem.to_string_lossy().trim().to_string())
        .filter(|stem| !stem.is_empty());
    match stem {
        Some(stem) => result.suggested_file_name(&format!("{stem}-ghibli-{timestamp}")),
        None => result.suggested_file_name(&format!("ghibli-{timestamp}")),
    }
}

pub fn is_image_filename(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    [".png", ".jpg", ".jpeg", ".webp", ".gif", ".bmp"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}
