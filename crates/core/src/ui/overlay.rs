//! egui-backed overlay surfaces.
//!
//! Each surface is an immediate viewport spanning the virtual desktop. A
//! surface only records what it should look like; [`show_layers`] turns that
//! into viewports every frame. A destroyed surface is simply no longer
//! declared, which closes its window.

use super::rendering::{
    draw_monitor_border, draw_selection_border, draw_selection_overlay, DIM_ALPHA,
    INPUT_LAYER_ALPHA,
};
use super::selection::{to_viewport, translate_events};
use super::selector::{RectStyle, RegionSelector, SelectorEvent, Surface};
use crate::error::{AppError, Result};
use crate::monitors::{Point, Rect};
use eframe::egui;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    Input,
    Visual,
}

/// A full-desktop overlay window.
#[derive(Debug)]
pub struct EguiSurface {
    layer: Layer,
    viewport_id: egui::ViewportId,
    visible: bool,
    destroyed: bool,
    borders: Vec<Rect>,
    selection: Option<Rect>,
}

impl EguiSurface {
    fn new(layer: Layer, name: &str) -> Self {
        Self {
            layer,
            viewport_id: egui::ViewportId::from_hash_of(name),
            visible: false,
            destroyed: false,
            borders: Vec::new(),
            selection: None,
        }
    }

    /// The invisible layer that captures pointer and keyboard input.
    pub fn input() -> Self {
        Self::new(Layer::Input, "snaptex_selection_input")
    }

    /// The translucent layer that shows monitors and the selection.
    pub fn visual() -> Self {
        Self::new(Layer::Visual, "snaptex_selection_visual")
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            return Err(AppError::ui(format!("{:?} layer already destroyed", self.layer)));
        }
        Ok(())
    }

    /// `scale` converts the desktop's physical pixels into window points.
    fn builder(&self, desktop: Rect, scale: f32) -> egui::ViewportBuilder {
        let builder = egui::ViewportBuilder::default()
            .with_title("snaptex selection")
            .with_position(egui::pos2(desktop.x as f32 / scale, desktop.y as f32 / scale))
            .with_inner_size(egui::vec2(
                desktop.width as f32 / scale,
                desktop.height as f32 / scale,
            ))
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(false)
            .with_taskbar(false)
            .with_always_on_top()
            .with_visible(self.visible);

        match self.layer {
            Layer::Input => builder.with_active(true),
            Layer::Visual => builder.with_mouse_passthrough(true).with_active(false),
        }
    }
}

impl Surface for EguiSurface {
    fn show(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.visible = true;
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.visible = false;
        Ok(())
    }

    fn draw_rect(&mut self, rect: Rect, style: RectStyle) -> Result<()> {
        self.ensure_alive()?;
        match style {
            RectStyle::MonitorBorder => self.borders.push(rect),
            RectStyle::Selection => self.selection = Some(rect),
        }
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.destroyed = true;
        self.visible = false;
        Ok(())
    }
}

/// Declares both overlay viewports for this frame and returns the input
/// gathered by the input layer, in desktop coordinates.
///
/// `scale` places the windows; once they exist, each one maps pointer
/// positions and drawing with its own pixels-per-point.
pub fn show_layers(
    ctx: &egui::Context,
    selector: &RegionSelector<EguiSurface>,
    desktop: Rect,
    scale: f32,
) -> Vec<SelectorEvent> {
    let origin = Point::new(desktop.x, desktop.y);

    if let Some(visual) = selector.visual_surface() {
        ctx.show_viewport_immediate(visual.viewport_id, visual.builder(desktop, scale), |ctx, _class| {
            egui::CentralPanel::default()
                .frame(egui::Frame::default())
                .show(ctx, |ui| {
                    let ppp = ctx.pixels_per_point();
                    let screen_rect = ui.max_rect();
                    let painter = ui.painter();
                    let selection = visual.selection.map(|rect| to_viewport(origin, rect, ppp));

                    draw_selection_overlay(painter, screen_rect, selection, DIM_ALPHA);
                    for border in &visual.borders {
                        draw_monitor_border(painter, to_viewport(origin, *border, ppp));
                    }
                    if let Some(selection) = selection {
                        draw_selection_border(painter, selection);
                    }
                });
        });
    }

    let Some(input) = selector.input_surface() else {
        return Vec::new();
    };

    ctx.show_viewport_immediate(input.viewport_id, input.builder(desktop, scale), |ctx, _class| {
        ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(egui::Color32::from_black_alpha(INPUT_LAYER_ALPHA)))
            .show(ctx, |_ui| {});

        let ppp = ctx.pixels_per_point();
        let mut events = ctx.input(|i| translate_events(&i.events, origin, ppp));
        // Closing the overlay with the window manager counts as cancel.
        if ctx.input(|i| i.viewport().close_requested()) {
            events.push(SelectorEvent::Cancel);
        }
        events
    })
}
