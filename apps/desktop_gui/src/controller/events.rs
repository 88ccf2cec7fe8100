//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{ResultHandle, TransformErrorKind, TriggerRefusal};
use shared::domain::RequestId;

use crate::media::PreviewImage;

pub enum UiEvent {
    Info(String),
    Error(UiError),
    /// A controller is live for `endpoint`. Later events carry the same generation.
    BackendReady {
        generation: u64,
        endpoint: String,
    },
    Transform {
        generation: u64,
        update: TransformUpdate,
    },
}

pub enum TransformUpdate {
    SelectionChanged {
        file_name: String,
        size_bytes: usize,
        superseded: Option<RequestId>,
        preview: Option<PreviewImage>,
    },
    SelectionCleared,
    Started {
        request_id: RequestId,
        file_name: String,
    },
    Succeeded {
        result: ResultHandle,
        preview: Option<PreviewImage>,
    },
    Failed {
        request_id: RequestId,
        kind: TransformErrorKind,
        message: String,
    },
    Discarded {
        request_id: RequestId,
    },
    Refused(TriggerRefusal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Remote,
    Transport,
    Validation,
    Io,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Selection,
    Transform,
    Export,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("rejected")
            || message_lower.contains("http 4")
            || message_lower.contains("http 5")
        {
            UiErrorCategory::Remote
        } else if message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("could not reach")
            || message_lower.contains("network")
            || message_lower.contains("dns")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else if message_lower.contains("invalid")
            || message_lower.contains("not a file")
            || message_lower.contains("not usable")
            || message_lower.contains("unsupported")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("failed to read")
            || message_lower.contains("failed to write")
            || message_lower.contains("failed to save")
            || message_lower.contains("permission denied")
            || message_lower.contains("clipboard")
        {
            UiErrorCategory::Io
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_transform_failure(kind: TransformErrorKind, message: impl Into<String>) -> Self {
        let category = match kind {
            TransformErrorKind::RemoteTransform => UiErrorCategory::Remote,
            TransformErrorKind::Network => UiErrorCategory::Transport,
            TransformErrorKind::InvalidEndpoint => UiErrorCategory::Validation,
        };
        Self {
            category,
            context: UiErrorContext::Transform,
            message: message.into(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Remote => "Transformation service",
        UiErrorCategory::Transport => "Network",
        UiErrorCategory::Validation => "Invalid input",
        UiErrorCategory::Io => "File system",
        UiErrorCategory::Unknown => "Unexpected",
    }
}
