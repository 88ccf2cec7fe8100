use std::{path::Path, sync::Arc};

use shared::domain::RequestId;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::debug;

use crate::{
    error::TransformErrorKind,
    resource::ResultHandle,
    selection::{SelectedImage, SelectionError},
    session::{Completion, TransformSession, TransformStatus, TriggerRefusal},
    TransformBackend,
};

#[derive(Debug, Clone)]
pub enum TransformEvent {
    /// Carries the selected image itself so listeners never have to look it up again.
    SelectionChanged {
        image: SelectedImage,
        superseded: Option<RequestId>,
    },
    SelectionCleared,
    Started {
        request_id: RequestId,
        file_name: String,
    },
    Succeeded(ResultHandle),
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

#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub pending: Option<SelectedImage>,
    pub status: TransformStatus,
}

/// Async driver around [`TransformSession`]: owns the backend, serialises
/// state transitions, and broadcasts every transition to subscribers.
pub struct TransformController {
    backend: Arc<dyn TransformBackend>,
    session: Mutex<TransformSession>,
    events: broadcast::Sender<TransformEvent>,
}

impl TransformController {
    pub fn new(backend: Arc<dyn TransformBackend>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            backend,
            session: Mutex::new(TransformSession::new()),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransformEvent> {
        self.events.subscribe()
    }

    pub async fn select(&self, image: SelectedImage) {
        let superseded = self.session.lock().await.select(image.clone());
        self.emit(TransformEvent::SelectionChanged { image, superseded });
    }

    pub async fn select_path(&self, path: &Path) -> Result<(), SelectionError> {
        let image = SelectedImage::from_path(path).await?;
        self.select(image).await;
        Ok(())
    }

    pub async fn clear_selection(&self) {
        self.session.lock().await.clear_selection();
        self.emit(TransformEvent::SelectionCleared);
    }

    /// Runs one transform for the held selection and waits for it to finish.
    /// Returns `None` when the trigger was refused and no request was issued.
    pub async fn trigger(&self) -> Option<RequestId> {
        let ticket = match self.session.lock().await.begin() {
            Ok(ticket) => ticket,
            Err(refusal) => {
                self.emit(TransformEvent::Refused(refusal));
                return None;
            }
        };
        let request_id = ticket.request_id;
        self.emit(TransformEvent::Started {
            request_id,
            file_name: ticket.image.file_name().to_string(),
        });

        let outcome = self.backend.transform(&ticket.image).await;

        let mut session = self.session.lock().await;
        let event = match session.complete(request_id, outcome) {
            Completion::Stale => TransformEvent::Discarded { request_id },
            Completion::Applied(_) => match session.status() {
                TransformStatus::Succeeded(result) => TransformEvent::Succeeded(result.clone()),
                TransformStatus::Failed { kind, message, .. } => TransformEvent::Failed {
                    request_id,
                    kind: *kind,
                    message: message.clone(),
                },
                TransformStatus::Idle | TransformStatus::Requesting { .. } => return Some(request_id),
            },
        };
        drop(session);
        self.emit(event);
        Some(request_id)
    }

    /// Fire-and-forget variant of [`Self::trigger`] for UI callers.
    pub fn spawn_trigger(self: &Arc<Self>) -> JoinHandle<Option<RequestId>> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.trigger().await })
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock().await;
        SessionSnapshot {
            pending: session.pending().cloned(),
            status: session.status().clone(),
        }
    }

    pub async fn result(&self) -> Option<ResultHandle> {
        self.session.lock().await.result().cloned()
    }

    fn emit(&self, event: TransformEvent) {
        if self.events.send(event).is_err() {
            debug!("transform: no event subscribers");
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
