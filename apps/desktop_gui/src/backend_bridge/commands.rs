//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

pub enum BackendCommand {
    SelectPath {
        path: PathBuf,
    },
    /// Dropped files that arrive as bytes without a path.
    SelectBytes {
        file_name: String,
        bytes: Vec<u8>,
    },
    ClearSelection,
    Transform,
    Reconfigure {
        endpoint: String,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::SelectPath { .. } => "select_path",
            BackendCommand::SelectBytes { .. } => "select_bytes",
            BackendCommand::ClearSelection => "clear_selection",
            BackendCommand::Transform => "transform",
            BackendCommand::Reconfigure { .. } => "reconfigure",
        }
    }
}
