//! Screen sections: header, upload zone, result panel, pricing carousel.

use eframe::egui;
use shared::protocol::advisory_upload_hint;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::reducer::{StatusBannerSeverity, ViewPhase};
use crate::media::human_readable_bytes;
use crate::ui::app::DesktopGuiApp;
use crate::ui::theme::{self, lighten_color};

const PREVIEW_MAX_HEIGHT: f32 = 360.0;
const UPLOAD_ZONE_HEIGHT: f32 = 180.0;
const PLAN_CARD_WIDTH: f32 = 260.0;
const PLAN_CARD_SPACING: f32 = 16.0;

impl DesktopGuiApp {
    pub(super) fn show_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.heading("Ghibli Style Image Transformer");
                    ui.label(
                        egui::RichText::new(
                            "Upload a photo and turn it into a hand-painted Ghibli-style scene.",
                        )
                        .color(theme::palette(self.dark_mode).muted_text),
                    );
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.toggle_value(&mut self.settings_open, "Settings");
                    let label = if self.dark_mode { "Light mode" } else { "Dark mode" };
                    if ui.button(label).clicked() {
                        self.dark_mode = !self.dark_mode;
                    }
                });
            });
            ui.add_space(8.0);
        });
    }

    pub(super) fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.view.is_requesting() {
                    ui.spinner();
                }
                ui.small(&self.view.status);
            });
        });
    }

    pub(super) fn show_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.view.banner.clone() else {
            return;
        };
        let palette = theme::palette(self.dark_mode);
        let (fill, text_color) = match banner.severity {
            StatusBannerSeverity::Error => (palette.error_fill, palette.error_text),
        };
        let mut dismissed = false;
        egui::Frame::new()
            .fill(fill)
            .corner_radius(8.0)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(format!("{}: {}", banner.title, banner.message))
                            .color(text_color),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        dismissed = ui.small_button("Dismiss").clicked();
                    });
                });
            });
        if dismissed {
            self.view.dismiss_banner();
        }
        ui.add_space(12.0);
    }

    pub(super) fn show_settings(&mut self, ui: &mut egui::Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.label(egui::RichText::new("Transformation service").strong());
            ui.horizontal(|ui| {
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.endpoint_draft)
                        .desired_width(420.0)
                        .hint_text("http://127.0.0.1:8787/api/transform"),
                );
                let submitted =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Apply").clicked() || submitted {
                    self.apply_endpoint();
                }
            });
            ui.small("Applying a new endpoint clears the current selection.");
        });
        ui.add_space(12.0);
    }

    pub(super) fn show_upload_panel(&mut self, ui: &mut egui::Ui) {
        let palette = theme::palette(self.dark_mode);
        ui.label(egui::RichText::new("1. Upload your photo").strong());
        ui.add_space(6.0);

        let hovering = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), UPLOAD_ZONE_HEIGHT),
            egui::Sense::click(),
        );
        let fill = if hovering || response.hovered() {
            palette.accent_soft
        } else {
            palette.card_fill
        };
        let stroke_color = if hovering {
            palette.accent
        } else {
            palette.card_stroke
        };
        let painter = ui.painter();
        painter.rect_filled(rect, 12.0, fill);
        painter.rect_stroke(
            rect,
            12.0,
            egui::Stroke::new(2.0, stroke_color),
            egui::StrokeKind::Inside,
        );
        let headline = if hovering {
            "Drop to select this image"
        } else {
            "Drag and drop your image here, or click to browse"
        };
        painter.text(
            rect.center() - egui::vec2(0.0, 12.0),
            egui::Align2::CENTER_CENTER,
            headline,
            egui::FontId::proportional(16.0),
            ui.visuals().text_color(),
        );
        painter.text(
            rect.center() + egui::vec2(0.0, 14.0),
            egui::Align2::CENTER_CENTER,
            advisory_upload_hint(),
            egui::FontId::proportional(12.0),
            palette.muted_text,
        );
        if response
            .on_hover_cursor(egui::CursorIcon::PointingHand)
            .clicked()
        {
            self.pick_file();
        }

        ui.add_space(10.0);
        let pending = self
            .view
            .pending()
            .map(|pending| (pending.file_name.clone(), pending.size_bytes));
        if let Some((file_name, size_bytes)) = pending {
            ui.horizontal(|ui| {
                ui.label(format!(
                    "{file_name} ({})",
                    human_readable_bytes(size_bytes as u64)
                ));
                if ui.small_button("Clear").clicked() {
                    self.dispatch(BackendCommand::ClearSelection);
                }
            });
            if let Some(texture) = &self.original_texture {
                ui.add(
                    egui::Image::new(texture)
                        .max_size(egui::vec2(ui.available_width(), PREVIEW_MAX_HEIGHT))
                        .corner_radius(8.0),
                );
            } else {
                ui.small("No preview available for this file.");
            }
        }

        ui.add_space(10.0);
        let requesting = self.view.is_requesting();
        let label = if requesting {
            "Transforming..."
        } else {
            "Transform to Ghibli Style"
        };
        ui.horizontal(|ui| {
            let button = egui::Button::new(egui::RichText::new(label).strong())
                .fill(palette.accent)
                .min_size(egui::vec2(220.0, 36.0));
            if ui.add_enabled(self.view.can_trigger(), button).clicked() {
                self.trigger_transform();
            }
            if requesting {
                ui.spinner();
            }
        });
    }

    pub(super) fn show_result_panel(&mut self, ui: &mut egui::Ui) {
        let palette = theme::palette(self.dark_mode);
        ui.label(egui::RichText::new("2. Your Ghibli artwork").strong());
        ui.add_space(6.0);

        match self.view.phase() {
            ViewPhase::Requesting(_) => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Painting your scene...");
                });
            }
            ViewPhase::Succeeded => {
                let Some(result) = self.view.result() else {
                    return;
                };
                let details = format!(
                    "{} | {}",
                    result.handle.mime_type(),
                    human_readable_bytes(result.handle.len() as u64)
                );
                match &self.result_texture {
                    Some(texture) => {
                        ui.add(
                            egui::Image::new(texture)
                                .max_size(egui::vec2(ui.available_width(), PREVIEW_MAX_HEIGHT))
                                .corner_radius(8.0),
                        );
                    }
                    None => {
                        ui.small("The result is ready but could not be previewed.");
                    }
                }
                ui.small(egui::RichText::new(details).color(palette.muted_text));
                ui.add_space(8.0);
                ui.horizontal_wrapped(|ui| {
                    if ui.button("Download image").clicked() {
                        self.save_result();
                    }
                    if ui.button("Open in viewer").clicked() {
                        self.open_result_in_viewer();
                    }
                    if ui.button("Copy to clipboard").clicked() {
                        self.copy_result_to_clipboard();
                    }
                });
            }
            ViewPhase::Failed => {
                ui.label(
                    egui::RichText::new("The transformation failed. Try again or pick another image.")
                        .color(palette.error_text),
                );
            }
            ViewPhase::Idle => {
                ui.label(
                    egui::RichText::new("Your transformed image will appear here.")
                        .color(palette.muted_text),
                );
            }
        }
    }

    pub(super) fn show_pricing(&mut self, ui: &mut egui::Ui) {
        let palette = theme::palette(self.dark_mode);
        ui.vertical_centered(|ui| {
            ui.heading("Choose your plan");
            ui.label(
                egui::RichText::new("Drag the cards or click one to compare plans.")
                    .color(palette.muted_text),
            );
        });
        ui.add_space(12.0);

        let row_width = PLAN_CARD_WIDTH * 3.0 + PLAN_CARD_SPACING * 2.0;
        let left_pad = ((ui.available_width() - row_width) / 2.0).max(0.0);
        ui.horizontal(|ui| {
            ui.add_space(left_pad);
            ui.spacing_mut().item_spacing.x = PLAN_CARD_SPACING;
            for (index, plan) in self.carousel.plans().iter().enumerate() {
                let active = self.carousel.is_active(index);
                let fill = if active {
                    palette.accent_soft
                } else {
                    palette.card_fill
                };
                let stroke = if active {
                    egui::Stroke::new(2.0, palette.accent)
                } else {
                    egui::Stroke::new(1.0, palette.card_stroke)
                };
                let frame = egui::Frame::new()
                    .fill(fill)
                    .stroke(stroke)
                    .corner_radius(12.0)
                    .inner_margin(14.0)
                    .show(ui, |ui| {
                        ui.set_width(PLAN_CARD_WIDTH - 28.0);
                        if plan.popular {
                            ui.label(
                                egui::RichText::new("Most Popular")
                                    .small()
                                    .strong()
                                    .color(palette.accent),
                            );
                        }
                        ui.label(egui::RichText::new(plan.name).heading());
                        ui.label(egui::RichText::new(plan.price_label()).strong());
                        ui.separator();
                        for feature in plan.features {
                            ui.label(format!("- {feature}"));
                        }
                    });

                let response = ui.interact(
                    frame.response.rect,
                    egui::Id::new(("plan-card", index)),
                    egui::Sense::click_and_drag(),
                );
                if response.clicked() {
                    self.carousel.click(index);
                }
                if response.dragged() {
                    self.plan_drag -= response.drag_delta().x;
                }
                if response.drag_stopped() {
                    // Offset is measured from the first card, so start from the active card's position.
                    let scroll_offset = (self.carousel.active() as f32 - 1.0)
                        * (PLAN_CARD_WIDTH + PLAN_CARD_SPACING)
                        + self.plan_drag;
                    self.carousel
                        .release_drag(scroll_offset, PLAN_CARD_WIDTH + PLAN_CARD_SPACING);
                    self.plan_drag = 0.0;
                }
            }
        });

        ui.add_space(10.0);
        ui.vertical_centered(|ui| {
            ui.horizontal(|ui| {
                ui.add_space(((ui.available_width() - 140.0) / 2.0).max(0.0));
                if ui.small_button("<").clicked() {
                    self.carousel.previous();
                }
                for index in 0..self.carousel.plans().len() {
                    let (rect, response) =
                        ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::click());
                    let color = if self.carousel.is_active(index) {
                        palette.accent
                    } else {
                        lighten_color(palette.card_stroke, 0.2)
                    };
                    ui.painter().circle_filled(rect.center(), 5.0, color);
                    if response.clicked() {
                        self.carousel.click(index);
                    }
                }
                if ui.small_button(">").clicked() {
                    self.carousel.next();
                }
            });
        });
        ui.add_space(8.0);
        ui.vertical_centered(|ui| {
            ui.small(format!(
                "Selected: {} ({})",
                self.carousel.active_plan().name,
                self.carousel.active_plan().price_label()
            ));
        });
    }
}
