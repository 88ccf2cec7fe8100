//! Runtime bridge between UI command queue and backend event intake.
//!
//! The worker thread owns a tokio runtime and one [`TransformController`].
//! Controller events are translated into [`UiEvent`]s by a forwarding task,
//! which also decodes previews so the egui thread only uploads textures.

use std::{sync::Arc, thread};

use client_core::{
    HttpTransformClient, SelectedImage, TransformClientConfig, TransformController,
    TransformError, TransformEvent,
};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{TransformUpdate, UiError, UiErrorContext, UiEvent};
use crate::media::{decode_preview_image, PreviewImage};

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    config: TransformClientConfig,
) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let request_timeout = config.request_timeout;
            let mut worker = match Worker::start(config, ui_tx.clone(), 1) {
                Ok(worker) => Some(worker),
                Err(err) => {
                    tracing::error!(error = %err, "transform client could not be built");
                    send(
                        &ui_tx,
                        UiEvent::Error(UiError::from_transform_failure(
                            err.kind(),
                            err.user_message(),
                        )),
                    );
                    None
                }
            };

            while let Ok(cmd) = cmd_rx.recv() {
                if let BackendCommand::Reconfigure { endpoint } = cmd {
                    let generation = worker.as_ref().map_or(1, |w| w.generation) + 1;
                    let config =
                        TransformClientConfig::resolve(Some(endpoint)).with_timeout(request_timeout);
                    match Worker::start(config, ui_tx.clone(), generation) {
                        Ok(next) => {
                            if let Some(previous) = worker.replace(next) {
                                previous.retire();
                            }
                        }
                        Err(err) => {
                            send(
                                &ui_tx,
                                UiEvent::Error(UiError::from_transform_failure(
                                    err.kind(),
                                    err.user_message(),
                                )),
                            );
                        }
                    }
                    continue;
                }

                match worker.as_ref() {
                    Some(worker) => worker.handle(cmd).await,
                    None => {
                        send(
                            &ui_tx,
                            UiEvent::Error(UiError::from_message(
                                UiErrorContext::General,
                                "No usable transformation endpoint; set one in Settings",
                            )),
                        );
                    }
                }
            }
            tracing::info!("ui command queue closed; backend worker exiting");
        });
    });
}

struct Worker {
    generation: u64,
    ui_tx: Sender<UiEvent>,
    controller: Arc<TransformController>,
    forwarder: JoinHandle<()>,
}

impl Worker {
    fn start(
        config: TransformClientConfig,
        ui_tx: Sender<UiEvent>,
        generation: u64,
    ) -> Result<Self, TransformError> {
        let client = HttpTransformClient::new(config)?;
        let endpoint = client.endpoint().to_string();
        let controller = TransformController::new(Arc::new(client));
        let forwarder = spawn_forwarder(controller.subscribe(), ui_tx.clone(), generation);
        tracing::info!(generation, %endpoint, "transform backend ready");
        send(
            &ui_tx,
            UiEvent::BackendReady {
                generation,
                endpoint,
            },
        );
        Ok(Self {
            generation,
            ui_tx,
            controller,
            forwarder,
        })
    }

    async fn handle(&self, cmd: BackendCommand) {
        match cmd {
            BackendCommand::SelectPath { path } => {
                if let Err(err) = self.controller.select_path(&path).await {
                    tracing::warn!(path = %path.display(), error = %err, "selection rejected");
                    send(
                        &self.ui_tx,
                        UiEvent::Error(UiError::from_message(
                            UiErrorContext::Selection,
                            err.to_string(),
                        )),
                    );
                }
            }
            BackendCommand::SelectBytes { file_name, bytes } => {
                self.controller
                    .select(SelectedImage::from_bytes(file_name, bytes))
                    .await;
            }
            BackendCommand::ClearSelection => self.controller.clear_selection().await,
            BackendCommand::Transform => {
                // Completion arrives through the forwarder.
                drop(self.controller.spawn_trigger());
            }
            BackendCommand::Reconfigure { .. } => {}
        }
    }

    /// Stops forwarding. Requests already in flight finish, but nobody hears about them.
    fn retire(self) {
        self.forwarder.abort();
    }
}

fn spawn_forwarder(
    mut events: broadcast::Receiver<TransformEvent>,
    ui_tx: Sender<UiEvent>,
    generation: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "transform event stream lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let update = translate(event).await;
            if !send(&ui_tx, UiEvent::Transform { generation, update }) {
                break;
            }
        }
    })
}

async fn translate(event: TransformEvent) -> TransformUpdate {
    match event {
        TransformEvent::SelectionChanged { image, superseded } => {
            let file_name = image.file_name().to_string();
            let size_bytes = image.len();
            let preview = preview_of(move || decode_preview_image(image.bytes())).await;
            TransformUpdate::SelectionChanged {
                file_name,
                size_bytes,
                superseded,
                preview,
            }
        }
        TransformEvent::SelectionCleared => TransformUpdate::SelectionCleared,
        TransformEvent::Started {
            request_id,
            file_name,
        } => TransformUpdate::Started {
            request_id,
            file_name,
        },
        TransformEvent::Succeeded(result) => {
            let decoded = result.clone();
            let preview = preview_of(move || decode_preview_image(decoded.bytes())).await;
            TransformUpdate::Succeeded { result, preview }
        }
        TransformEvent::Failed {
            request_id,
            kind,
            message,
        } => TransformUpdate::Failed {
            request_id,
            kind,
            message,
        },
        TransformEvent::Discarded { request_id } => TransformUpdate::Discarded { request_id },
        TransformEvent::Refused(refusal) => TransformUpdate::Refused(refusal),
    }
}

async fn preview_of<F>(decode: F) -> Option<PreviewImage>
where
    F: FnOnce() -> Result<PreviewImage, String> + Send + 'static,
{
    match tokio::task::spawn_blocking(decode).await {
        Ok(Ok(preview)) => Some(preview),
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "image preview could not be decoded");
            None
        }
        Err(err) => {
            tracing::warn!(error = %err, "preview decoding task failed");
            None
        }
    }
}

/// Returns `false` once the UI side is gone.
fn send(ui_tx: &Sender<UiEvent>, event: UiEvent) -> bool {
    match ui_tx.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::warn!("backend->ui event queue is full; event dropped");
            true
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}
