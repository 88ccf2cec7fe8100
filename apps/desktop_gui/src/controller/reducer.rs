//! UI-side mirror of the transform session, driven only by [`UiEvent`]s.
//!
//! Events from the backend can interleave: a `Started` for a request that a
//! newer selection already superseded may land after that selection. The
//! view remembers the newest superseded id and ignores anything at or below it.

use client_core::{ResultHandle, TriggerRefusal};
use shared::domain::RequestId;

use crate::controller::events::{err_label, TransformUpdate, UiError, UiEvent};
use crate::media::{human_readable_bytes, PreviewImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusBanner {
    pub severity: StatusBannerSeverity,
    pub title: &'static str,
    pub message: String,
}

impl StatusBanner {
    fn error(err: &UiError) -> Self {
        Self {
            severity: StatusBannerSeverity::Error,
            title: err_label(err.category()),
            message: err.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Idle,
    Requesting(RequestId),
    Succeeded,
    Failed,
}

pub struct PendingView {
    pub file_name: String,
    pub size_bytes: usize,
    pub preview: Option<PreviewImage>,
}

pub struct ResultView {
    pub handle: ResultHandle,
    pub preview: Option<PreviewImage>,
}

/// Which textures the app has to re-upload after an event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ViewChange {
    pub original: bool,
    pub result: bool,
}

impl ViewChange {
    const BOTH: Self = Self {
        original: true,
        result: true,
    };
    const RESULT: Self = Self {
        original: false,
        result: true,
    };
}

pub struct TransformView {
    generation: u64,
    endpoint: Option<String>,
    pending: Option<PendingView>,
    phase: ViewPhase,
    result: Option<ResultView>,
    latest_superseded: Option<RequestId>,
    pub status: String,
    pub banner: Option<StatusBanner>,
}

impl Default for TransformView {
    fn default() -> Self {
        Self {
            generation: 0,
            endpoint: None,
            pending: None,
            phase: ViewPhase::Idle,
            result: None,
            latest_superseded: None,
            status: "Starting backend worker...".to_string(),
            banner: None,
        }
    }
}

impl TransformView {
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn pending(&self) -> Option<&PendingView> {
        self.pending.as_ref()
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub fn result(&self) -> Option<&ResultView> {
        self.result.as_ref()
    }

    pub fn is_requesting(&self) -> bool {
        matches!(self.phase, ViewPhase::Requesting(_))
    }

    pub fn can_trigger(&self) -> bool {
        self.endpoint.is_some() && self.pending.is_some() && !self.is_requesting()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn report_error(&mut self, err: UiError) {
        self.status = err.message().to_string();
        self.banner = Some(StatusBanner::error(&err));
    }

    pub fn apply(&mut self, event: UiEvent) -> ViewChange {
        match event {
            UiEvent::Info(message) => {
                self.status = message;
                ViewChange::default()
            }
            UiEvent::Error(err) => {
                self.report_error(err);
                ViewChange::default()
            }
            UiEvent::BackendReady {
                generation,
                endpoint,
            } => {
                if generation < self.generation {
                    return ViewChange::default();
                }
                self.generation = generation;
                self.status = format!("Ready. Images are sent to {endpoint}");
                self.endpoint = Some(endpoint);
                self.pending = None;
                self.phase = ViewPhase::Idle;
                self.result = None;
                self.latest_superseded = None;
                self.banner = None;
                ViewChange::BOTH
            }
            UiEvent::Transform { generation, update } => {
                if generation != self.generation {
                    tracing::debug!(generation, current = self.generation, "ignoring event from retired backend");
                    return ViewChange::default();
                }
                self.apply_update(update)
            }
        }
    }

    fn is_superseded(&self, request_id: RequestId) -> bool {
        self.latest_superseded
            .is_some_and(|superseded| request_id <= superseded)
    }

    fn apply_update(&mut self, update: TransformUpdate) -> ViewChange {
        match update {
            TransformUpdate::SelectionChanged {
                file_name,
                size_bytes,
                superseded,
                preview,
            } => {
                if let Some(superseded) = superseded {
                    self.latest_superseded = self.latest_superseded.max(Some(superseded));
                }
                self.status = format!(
                    "Selected {file_name} ({})",
                    human_readable_bytes(size_bytes as u64)
                );
                self.pending = Some(PendingView {
                    file_name,
                    size_bytes,
                    preview,
                });
                self.phase = ViewPhase::Idle;
                self.result = None;
                self.banner = None;
                ViewChange::BOTH
            }
            TransformUpdate::SelectionCleared => {
                if let ViewPhase::Requesting(request_id) = self.phase {
                    self.latest_superseded = self.latest_superseded.max(Some(request_id));
                }
                self.pending = None;
                self.phase = ViewPhase::Idle;
                self.result = None;
                self.status = "Selection cleared".to_string();
                ViewChange::BOTH
            }
            TransformUpdate::Started {
                request_id,
                file_name,
            } => {
                if self.is_superseded(request_id) {
                    return ViewChange::default();
                }
                self.phase = ViewPhase::Requesting(request_id);
                self.result = None;
                self.banner = None;
                self.status = format!("Transforming {file_name}...");
                ViewChange::RESULT
            }
            TransformUpdate::Succeeded { result, preview } => {
                if self.is_superseded(result.request_id()) {
                    return ViewChange::default();
                }
                self.status = format!(
                    "Transformation complete ({}, {})",
                    result.mime_type(),
                    human_readable_bytes(result.len() as u64)
                );
                self.phase = ViewPhase::Succeeded;
                self.result = Some(ResultView {
                    handle: result,
                    preview,
                });
                ViewChange::RESULT
            }
            TransformUpdate::Failed {
                request_id,
                kind,
                message,
            } => {
                if self.is_superseded(request_id) {
                    return ViewChange::default();
                }
                self.phase = ViewPhase::Failed;
                self.result = None;
                self.report_error(UiError::from_transform_failure(kind, message));
                ViewChange::RESULT
            }
            TransformUpdate::Discarded { request_id } => {
                tracing::debug!(request_id = request_id.0, "stale transform response dropped");
                ViewChange::default()
            }
            TransformUpdate::Refused(refusal) => {
                self.status = match refusal {
                    TriggerRefusal::NoSelection => "Select an image first".to_string(),
                    TriggerRefusal::AlreadyRequesting(request_id) => {
                        format!("Transformation {request_id} is still running")
                    }
                };
                ViewChange::default()
            }
        }
    }
}
