//! Transform session: the explicit `Idle -> Requesting -> {Succeeded, Failed}`
//! state machine that drives the upload pipeline.
//!
//! Policy for overlapping triggers: a trigger while a request is outstanding
//! is refused, and every response is matched against the id of the request
//! the session is currently waiting on. A response for any other id is stale
//! and dropped, which happens when the user picks a new file mid-flight.

use shared::domain::RequestId;
use tracing::{error, info, warn};

use crate::{
    error::{TransformError, TransformErrorKind},
    resource::{ResultHandle, TransformedImage},
    selection::{SelectedImage, Selector},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformPhase {
    Idle,
    Requesting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransformStatus {
    #[default]
    Idle,
    Requesting {
        request_id: RequestId,
    },
    Succeeded(ResultHandle),
    Failed {
        request_id: RequestId,
        kind: TransformErrorKind,
        message: String,
    },
}

impl TransformStatus {
    pub fn phase(&self) -> TransformPhase {
        match self {
            TransformStatus::Idle => TransformPhase::Idle,
            TransformStatus::Requesting { .. } => TransformPhase::Requesting,
            TransformStatus::Succeeded(_) => TransformPhase::Succeeded,
            TransformStatus::Failed { .. } => TransformPhase::Failed,
        }
    }

    fn in_flight(&self) -> Option<RequestId> {
        match self {
            TransformStatus::Requesting { request_id } => Some(*request_id),
            _ => None,
        }
    }
}

/// Everything a backend needs to run one request.
#[derive(Debug, Clone)]
pub struct TransformTicket {
    pub request_id: RequestId,
    pub image: SelectedImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerRefusal {
    NoSelection,
    AlreadyRequesting(RequestId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied(TransformPhase),
    Stale,
}

#[derive(Debug, Default)]
pub struct TransformSession {
    selector: Selector,
    status: TransformStatus,
    issued: u64,
}

impl TransformSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the pending selection and returns the session to `Idle`.
    /// The result slot is cleared; a new trigger is needed to fill it again.
    /// Returns the id of an in-flight request that was superseded, if any.
    pub fn select(&mut self, image: SelectedImage) -> Option<RequestId> {
        let superseded = self.status.in_flight();
        info!(
            file_name = image.file_name(),
            bytes = image.len(),
            superseded = superseded.map(|id| id.0),
            "transform: selection replaced"
        );
        self.selector.select(image);
        self.status = TransformStatus::Idle;
        superseded
    }

    pub fn clear_selection(&mut self) -> Option<RequestId> {
        let superseded = self.status.in_flight();
        self.selector.clear();
        self.status = TransformStatus::Idle;
        superseded
    }

    pub fn pending(&self) -> Option<&SelectedImage> {
        self.selector.pending()
    }

    pub fn status(&self) -> &TransformStatus {
        &self.status
    }

    pub fn phase(&self) -> TransformPhase {
        self.status.phase()
    }

    pub fn is_requesting(&self) -> bool {
        self.status.in_flight().is_some()
    }

    pub fn result(&self) -> Option<&ResultHandle> {
        match &self.status {
            TransformStatus::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    /// Moves to `Requesting` and hands out the ticket for the held selection.
    pub fn begin(&mut self) -> Result<TransformTicket, TriggerRefusal> {
        if let Some(request_id) = self.status.in_flight() {
            warn!(request_id = request_id.0, "transform: trigger ignored while requesting");
            return Err(TriggerRefusal::AlreadyRequesting(request_id));
        }
        let Some(image) = self.selector.pending().cloned() else {
            info!("transform: trigger ignored without a selection");
            return Err(TriggerRefusal::NoSelection);
        };

        self.issued += 1;
        let request_id = RequestId(self.issued);
        self.status = TransformStatus::Requesting { request_id };
        info!(
            request_id = request_id.0,
            file_name = image.file_name(),
            "transform: request issued"
        );
        Ok(TransformTicket { request_id, image })
    }

    /// Applies the outcome of `request_id` if it is the request the session
    /// is waiting on. Anything else is stale and leaves the state untouched.
    pub fn complete(
        &mut self,
        request_id: RequestId,
        outcome: Result<TransformedImage, TransformError>,
    ) -> Completion {
        if self.status.in_flight() != Some(request_id) {
            info!(request_id = request_id.0, "transform: stale response discarded");
            return Completion::Stale;
        }

        self.status = match outcome {
            Ok(image) => {
                info!(
                    request_id = request_id.0,
                    bytes = image.bytes.len(),
                    content_type = image.content_type.as_deref().unwrap_or("unknown"),
                    "transform: result ready"
                );
                TransformStatus::Succeeded(ResultHandle::new(request_id, image))
            }
            Err(err) => {
                match err.kind() {
                    TransformErrorKind::RemoteTransform => {
                        warn!(request_id = request_id.0, error = %err, "transform: remote transform error")
                    }
                    _ => error!(request_id = request_id.0, error = %err, "transform: network error"),
                }
                TransformStatus::Failed {
                    request_id,
                    kind: err.kind(),
                    message: err.user_message(),
                }
            }
        };
        Completion::Applied(self.status.phase())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
