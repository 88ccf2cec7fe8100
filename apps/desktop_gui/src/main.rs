mod backend_bridge;
mod controller;
mod media;
mod ui;

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::app::SETTINGS_STORAGE_KEY;
use crate::ui::{AppPaths, DesktopGuiApp, PersistedDesktopSettings, StartupConfig};

#[derive(Parser, Debug)]
#[command(name = "ghibli-desktop", about = "Ghibli style image transformer")]
struct Args {
    /// Transformation endpoint. Overrides GHIBLI_TRANSFORM_URL and the saved setting.
    #[arg(long)]
    endpoint: Option<String>,
    /// Where viewer copies are written. Defaults to the user cache directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl From<Args> for StartupConfig {
    fn from(args: Args) -> Self {
        Self {
            endpoint: args.endpoint,
            data_dir: args.data_dir,
            request_timeout: args.timeout_secs.map(Duration::from_secs),
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let startup = StartupConfig::from(Args::parse());
    let paths = AppPaths::from_startup(&startup).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "falling back to the temp directory for app data");
        AppPaths::under(std::env::temp_dir().join("ghibli_desktop"))
    });
    tracing::info!(data_root = %paths.data_root.display(), "desktop app starting");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Ghibli Style Image Transformer")
            .with_inner_size([1180.0, 860.0])
            .with_min_inner_size([860.0, 640.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Ghibli Style Image Transformer",
        options,
        Box::new(move |cc| {
            let persisted = cc
                .storage
                .and_then(|storage| storage.get_string(SETTINGS_STORAGE_KEY))
                .and_then(|text| PersistedDesktopSettings::from_json(&text))
                .unwrap_or_default();
            // The saved endpoint is only known once storage is open.
            backend_bridge::runtime::launch(cmd_rx, ui_tx, startup.client_config(&persisted));
            Ok(Box::new(DesktopGuiApp::new(cmd_tx, ui_rx, persisted, paths)))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_startup_flags() {
        let args = Args::try_parse_from([
            "ghibli-desktop",
            "--endpoint",
            "http://relay:8787/api/transform",
            "--timeout-secs",
            "45",
        ])
        .expect("args");
        let startup = StartupConfig::from(args);
        assert_eq!(
            startup.endpoint.as_deref(),
            Some("http://relay:8787/api/transform")
        );
        assert_eq!(startup.request_timeout, Some(Duration::from_secs(45)));
        assert!(startup.data_dir.is_none());
    }
}
