//! Drawing helpers for the selection overlay.

use eframe::egui;

/// Dim applied over the desktop outside the selection (about 30%).
pub const DIM_ALPHA: u8 = 77;
/// Fill of the input layer: low enough to be invisible, high enough that
/// the window system still routes clicks to it.
pub const INPUT_LAYER_ALPHA: u8 = 3;

pub const MONITOR_BORDER_COLOR: egui::Color32 = egui::Color32::from_rgb(0xff, 0x44, 0x44);
pub const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(0x00, 0xff, 0x00);

/// Dims `screen_rect` everywhere except `selection_rect`.
pub fn draw_selection_overlay(
    painter: &egui::Painter,
    screen_rect: egui::Rect,
    selection_rect: Option<egui::Rect>,
    alpha: u8,
) {
    let color = egui::Color32::from_rgba_unmultiplied(51, 51, 51, alpha);

    let Some(selection_rect) = selection_rect else {
        painter.rect_filled(screen_rect, 0.0, color);
        return;
    };

    // Top
    painter.rect_filled(
        egui::Rect::from_min_max(
            screen_rect.min,
            egui::pos2(screen_rect.max.x, selection_rect.min.y),
        ),
        0.0,
        color,
    );

    // Bottom
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(screen_rect.min.x, selection_rect.max.y),
            screen_rect.max,
        ),
        0.0,
        color,
    );

    // Left
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(screen_rect.min.x, selection_rect.min.y),
            egui::pos2(selection_rect.min.x, selection_rect.max.y),
        ),
        0.0,
        color,
    );

    // Right
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(selection_rect.max.x, selection_rect.min.y),
            egui::pos2(screen_rect.max.x, selection_rect.max.y),
        ),
        0.0,
        color,
    );
}

/// Outlines `rect` with a dashed stroke.
pub fn draw_dashed_rect(
    painter: &egui::Painter,
    rect: egui::Rect,
    stroke: egui::Stroke,
    dash_length: f32,
    gap_length: f32,
) {
    let points = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
        rect.left_top(),
    ];
    painter.extend(egui::Shape::dashed_line(
        &points,
        stroke,
        dash_length,
        gap_length,
    ));
}

/// Red dashed outline of a physical display.
pub fn draw_monitor_border(painter: &egui::Painter, rect: egui::Rect) {
    draw_dashed_rect(
        painter,
        rect.shrink(1.5),
        egui::Stroke::new(3.0, MONITOR_BORDER_COLOR),
        5.0,
        5.0,
    );
}

/// Green dashed rubber band around the selection.
pub fn draw_selection_border(painter: &egui::Painter, rect: egui::Rect) {
    draw_dashed_rect(
        painter,
        rect,
        egui::Stroke::new(2.0, SELECTION_COLOR),
        3.0,
        3.0,
    );
}
