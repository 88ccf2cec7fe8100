use std::collections::BTreeMap;

use eframe::egui;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub accent: egui::Color32,
    pub accent_soft: egui::Color32,
    pub card_fill: egui::Color32,
    pub card_stroke: egui::Color32,
    pub muted_text: egui::Color32,
    pub error_fill: egui::Color32,
    pub error_text: egui::Color32,
}

pub fn palette(dark_mode: bool) -> Palette {
    if dark_mode {
        Palette {
            accent: egui::Color32::from_rgb(0x5f, 0xa8, 0x6b),
            accent_soft: egui::Color32::from_rgb(0x2c, 0x4a, 0x33),
            card_fill: egui::Color32::from_rgb(0x24, 0x2a, 0x30),
            card_stroke: egui::Color32::from_rgb(0x3a, 0x44, 0x4d),
            muted_text: egui::Color32::from_rgb(0xa4, 0xae, 0xb8),
            error_fill: egui::Color32::from_rgb(0x5a, 0x1f, 0x24),
            error_text: egui::Color32::from_rgb(0xff, 0xc9, 0xc9),
        }
    } else {
        Palette {
            accent: egui::Color32::from_rgb(0x3f, 0x86, 0x4e),
            accent_soft: egui::Color32::from_rgb(0xdc, 0xef, 0xdf),
            card_fill: egui::Color32::from_rgb(0xfb, 0xf8, 0xf1),
            card_stroke: egui::Color32::from_rgb(0xd9, 0xd2, 0xc3),
            muted_text: egui::Color32::from_rgb(0x6b, 0x72, 0x7a),
            error_fill: egui::Color32::from_rgb(0xfd, 0xe2, 0xe2),
            error_text: egui::Color32::from_rgb(0x9b, 0x1c, 0x1c),
        }
    }
}

pub fn lighten_color(c: egui::Color32, t: f32) -> egui::Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |channel: u8| -> u8 {
        let channel = channel as f32;
        (channel + (255.0 - channel) * t).round().clamp(0.0, 255.0) as u8
    };
    egui::Color32::from_rgba_unmultiplied(mix(c.r()), mix(c.g()), mix(c.b()), c.a())
}

pub fn visuals(dark_mode: bool) -> egui::Visuals {
    let palette = palette(dark_mode);
    let mut visuals = if dark_mode {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    visuals.selection.bg_fill = palette.accent;
    visuals.hyperlink_color = palette.accent;
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, palette.accent);
    visuals.widgets.active.bg_fill = palette.accent;
    visuals
}

pub fn text_styles() -> BTreeMap<egui::TextStyle, egui::FontId> {
    use egui::{FontFamily, FontId, TextStyle};
    [
        (TextStyle::Heading, FontId::new(26.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(15.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(15.0, FontFamily::Proportional)),
        (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace)),
    ]
    .into()
}
