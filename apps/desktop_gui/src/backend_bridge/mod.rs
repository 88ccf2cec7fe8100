//! Bridge between the egui thread and the tokio worker that owns the transform controller.

pub mod commands;
pub mod runtime;
