use std::{fs, path::PathBuf, time::Duration};

use chrono::Local;
use client_core::{parse_endpoint, PlanCarousel, TransformClientConfig};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use serde::{Deserialize, Serialize};
use shared::{domain::DEFAULT_PLAN_INDEX, protocol::TRANSFORM_ENDPOINT_ENV};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::reducer::TransformView;
use crate::media::{
    decode_image_for_clipboard, is_image_filename, suggested_download_name,
    write_clipboard_image, PreviewImage,
};
use crate::ui::theme;

pub const SETTINGS_STORAGE_KEY: &str = "ghibli_desktop.settings";

#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub endpoint: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub request_timeout: Option<Duration>,
}

impl StartupConfig {
    /// Command line, then `GHIBLI_TRANSFORM_URL`, then the endpoint saved from Settings.
    pub fn client_config(&self, persisted: &PersistedDesktopSettings) -> TransformClientConfig {
        self.client_config_with(persisted, std::env::var(TRANSFORM_ENDPOINT_ENV).ok())
    }

    fn client_config_with(
        &self,
        persisted: &PersistedDesktopSettings,
        env_endpoint: Option<String>,
    ) -> TransformClientConfig {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
        let endpoint = non_empty(&self.endpoint)
            .or_else(|| non_empty(&env_endpoint))
            .or_else(|| non_empty(&persisted.endpoint));
        TransformClientConfig::resolve(endpoint).with_timeout(self.request_timeout)
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_root: PathBuf,
    /// Content-addressed copies of results handed to the external viewer.
    pub viewer_dir: PathBuf,
}

impl AppPaths {
    pub fn from_startup(startup: &StartupConfig) -> anyhow::Result<Self> {
        let root = match &startup.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .ok_or_else(|| anyhow::anyhow!("unable to resolve a cache directory"))?
                .join("ghibli_desktop"),
        };
        Ok(Self::under(root))
    }

    pub fn under(root: PathBuf) -> Self {
        Self {
            viewer_dir: root.join("viewer"),
            data_root: root,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedDesktopSettings {
    pub endpoint: Option<String>,
    pub active_plan: usize,
    pub dark_mode: bool,
}

impl Default for PersistedDesktopSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            active_plan: DEFAULT_PLAN_INDEX,
            dark_mode: false,
        }
    }
}

impl PersistedDesktopSettings {
    pub fn from_json(text: &str) -> Option<Self> {
        match serde_json::from_str(text) {
            Ok(settings) => Some(settings),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable persisted settings");
                None
            }
        }
    }
}

pub struct DesktopGuiApp {
    pub(super) cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    pub(super) view: TransformView,
    pub(super) carousel: PlanCarousel,
    /// Horizontal drag distance accumulated on the plan cards since the last release.
    pub(super) plan_drag: f32,
    pub(super) dark_mode: bool,
    applied_dark_mode: Option<bool>,
    pub(super) settings_open: bool,
    pub(super) endpoint_draft: String,
    saved_endpoint: Option<String>,
    pub(super) original_texture: Option<TextureHandle>,
    pub(super) result_texture: Option<TextureHandle>,
    paths: AppPaths,
}

impl DesktopGuiApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        persisted: PersistedDesktopSettings,
        paths: AppPaths,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            view: TransformView::default(),
            carousel: PlanCarousel::with_active(persisted.active_plan),
            plan_drag: 0.0,
            dark_mode: persisted.dark_mode,
            applied_dark_mode: None,
            settings_open: false,
            endpoint_draft: String::new(),
            saved_endpoint: persisted.endpoint,
            original_texture: None,
            result_texture: None,
            paths,
        }
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            let is_ready = matches!(event, UiEvent::BackendReady { .. });
            let change = self.view.apply(event);
            if is_ready {
                self.endpoint_draft = self.view.endpoint().unwrap_or_default().to_string();
            }
            if change.original {
                self.original_texture = self
                    .view
                    .pending()
                    .and_then(|pending| pending.preview.as_ref())
                    .map(|preview| load_texture(ctx, "original-preview", preview));
            }
            if change.result {
                self.result_texture = self
                    .view
                    .result()
                    .and_then(|result| result.preview.as_ref())
                    .map(|preview| load_texture(ctx, "result-preview", preview));
            }
        }
    }

    fn apply_theme_if_needed(&mut self, ctx: &egui::Context) {
        if self.applied_dark_mode == Some(self.dark_mode) {
            return;
        }
        ctx.set_visuals(theme::visuals(self.dark_mode));
        ctx.style_mut(|style| style.text_styles = theme::text_styles());
        self.applied_dark_mode = Some(self.dark_mode);
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let extra = dropped.len().saturating_sub(1);
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if !is_image_filename(&file.name) {
            tracing::info!(file = %file.name, "dropped file does not look like an image; sending anyway");
        }
        if let Some(path) = file.path {
            self.dispatch(BackendCommand::SelectPath { path });
        } else if let Some(bytes) = file.bytes {
            self.dispatch(BackendCommand::SelectBytes {
                file_name: file.name,
                bytes: bytes.to_vec(),
            });
        }
        if extra > 0 {
            tracing::info!(ignored = extra, "only the first dropped file is used");
        }
    }

    pub(super) fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.view.status);
    }

    pub(super) fn pick_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["jpg", "jpeg", "png", "webp"])
            .add_filter("All files", &["*"])
            .pick_file()
        {
            self.dispatch(BackendCommand::SelectPath { path });
        }
    }

    pub(super) fn trigger_transform(&mut self) {
        self.dispatch(BackendCommand::Transform);
    }

    pub(super) fn save_result(&mut self) {
        let Some(result) = self.view.result() else {
            return;
        };
        let source = self.view.pending().map(|pending| pending.file_name.as_str());
        let suggested = suggested_download_name(source, &result.handle, Local::now());
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&suggested)
            .save_file()
        else {
            return;
        };
        match fs::write(&path, result.handle.bytes()) {
            Ok(()) => self.view.status = format!("Saved image to {}", path.display()),
            Err(err) => self.view.report_error(UiError::from_message(
                UiErrorContext::Export,
                format!("Failed to save image: {err}"),
            )),
        }
    }

    pub(super) fn open_result_in_viewer(&mut self) {
        let Some(result) = self.view.result() else {
            return;
        };
        match result.handle.open_in_viewer(&self.paths.viewer_dir) {
            Ok(path) => self.view.status = format!("Opened {} in the image viewer", path.display()),
            Err(err) => self.view.report_error(UiError::from_message(
                UiErrorContext::Export,
                format!("Failed to open external viewer: {err}"),
            )),
        }
    }

    pub(super) fn copy_result_to_clipboard(&mut self) {
        let Some(result) = self.view.result() else {
            return;
        };
        match decode_image_for_clipboard(result.handle.bytes())
            .and_then(|(rgba, width, height)| write_clipboard_image(&rgba, width, height))
        {
            Ok(()) => self.view.status = "Copied image to clipboard".to_string(),
            Err(err) => self.view.report_error(UiError::from_message(
                UiErrorContext::Export,
                format!("Failed to copy image to clipboard: {err}"),
            )),
        }
    }

    pub(super) fn apply_endpoint(&mut self) {
        let endpoint = self.endpoint_draft.trim().to_string();
        if let Err(err) = parse_endpoint(&endpoint) {
            self.view.report_error(UiError::from_transform_failure(
                err.kind(),
                err.user_message(),
            ));
            return;
        }
        self.saved_endpoint = Some(endpoint.clone());
        self.dispatch(BackendCommand::Reconfigure { endpoint });
    }

    fn persisted_settings(&self) -> PersistedDesktopSettings {
        PersistedDesktopSettings {
            endpoint: self.saved_endpoint.clone(),
            active_plan: self.carousel.active(),
            dark_mode: self.dark_mode,
        }
    }
}

fn load_texture(ctx: &egui::Context, name: &str, preview: &PreviewImage) -> TextureHandle {
    let color_image = egui::ColorImage::from_rgba_unmultiplied(preview.size(), &preview.rgba);
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);
        self.apply_theme_if_needed(ctx);
        self.handle_dropped_files(ctx);

        self.show_header(ctx);
        self.show_status_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.show_banner(ui);
                    if self.settings_open {
                        self.show_settings(ui);
                    }
                    ui.columns(2, |columns| {
                        self.show_upload_panel(&mut columns[0]);
                        self.show_result_panel(&mut columns[1]);
                    });
                    ui.add_space(24.0);
                    self.show_pricing(ui);
                });
        });

        if self.view.is_requesting() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(serialized) = serde_json::to_string(&self.persisted_settings()) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_settings_fill_missing_fields_with_defaults() {
        let settings =
            PersistedDesktopSettings::from_json(r#"{"dark_mode":true}"#).expect("settings");
        assert!(settings.dark_mode);
        assert_eq!(settings.active_plan, DEFAULT_PLAN_INDEX);
        assert_eq!(settings.endpoint, None);
        assert!(PersistedDesktopSettings::from_json("not json").is_none());
    }

    #[test]
    fn out_of_range_persisted_plan_is_clamped() {
        let settings = PersistedDesktopSettings {
            active_plan: 42,
            ..PersistedDesktopSettings::default()
        };
        assert_eq!(PlanCarousel::with_active(settings.active_plan).active(), 2);
    }

    #[test]
    fn endpoint_precedence_is_cli_then_env_then_saved() {
        let saved = PersistedDesktopSettings {
            endpoint: Some("http://saved/api/transform".to_string()),
            ..PersistedDesktopSettings::default()
        };
        let cli = StartupConfig {
            endpoint: Some("http://cli/api/transform".to_string()),
            ..StartupConfig::default()
        };
        let env = Some("http://env/api/transform".to_string());

        assert_eq!(
            cli.client_config_with(&saved, env.clone()).endpoint,
            "http://cli/api/transform"
        );
        assert_eq!(
            StartupConfig::default()
                .client_config_with(&saved, env)
                .endpoint,
            "http://env/api/transform"
        );
        assert_eq!(
            StartupConfig::default()
                .client_config_with(&saved, Some("  ".to_string()))
                .endpoint,
            "http://saved/api/transform"
        );
    }

    #[test]
    fn startup_timeout_reaches_client_config() {
        let startup = StartupConfig {
            request_timeout: Some(Duration::from_secs(30)),
            ..StartupConfig::default()
        };
        let config = startup.client_config_with(&PersistedDesktopSettings::default(), None);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn app_paths_nest_viewer_dir_under_data_dir() {
        let startup = StartupConfig {
            data_dir: Some(PathBuf::from("/tmp/ghibli-test")),
            ..StartupConfig::default()
        };
        let paths = AppPaths::from_startup(&startup).expect("paths");
        assert_eq!(paths.viewer_dir, PathBuf::from("/tmp/ghibli-test/viewer"));
    }
}
