//! Main converter window.

use super::overlay::{show_layers, EguiSurface};
use super::selector::RegionSelector;
use super::state::{
    capture_behind_window, drive_selection, start_selection, CaptureFlow, MainWindow,
    OverlayPlacement, ResultPane,
};
use crate::capture::ScreenCapturer;
use crate::config::{EnvConfig, LayeredConfig};
use crate::conversion::{Coordinator, ImageSource};
use crate::error::{AppError, Result};
use crate::gemini::GeminiClient;
use crate::image_processing::PREVIEW_SIZE;
use crate::monitors::MonitorLayout;
use crate::settings::Settings;
use eframe::egui;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long the Copy button reads "Copied".
const COPIED_FEEDBACK: Duration = Duration::from_secs(2);
/// Poll interval while a conversion is running.
const PUMP_INTERVAL: Duration = Duration::from_millis(100);

pub struct ConverterApp {
    settings: Settings,
    api_key_input: String,
    overrides: HashMap<String, String>,
    coordinator: Coordinator<GeminiClient>,
    pane: ResultPane,
    preview: Option<egui::TextureHandle>,
    capture: CaptureFlow,
    grabber: ScreenCapturer,
    copied_at: Option<Instant>,
}

impl ConverterApp {
    /// `overrides` sit above saved settings, which sit above the environment.
    pub fn new(settings: Settings, overrides: HashMap<String, String>) -> Self {
        let config = layered(&settings, &overrides);
        let coordinator = Coordinator::gemini(&config);
        if !coordinator.is_configured() {
            log::warn!("No API key configured yet; conversions will fail until one is saved");
        }

        Self {
            api_key_input: settings.api_key.clone(),
            settings,
            overrides,
            coordinator,
            pane: ResultPane::default(),
            preview: None,
            capture: CaptureFlow::Idle,
            grabber: ScreenCapturer::new(),
            copied_at: None,
        }
    }

    fn save_api_key(&mut self) {
        self.settings.api_key = self.api_key_input.trim().to_string();
        if let Err(e) = self.settings.save() {
            log::error!("Failed to save settings: {}", e);
            self.pane.show_error(e);
        }
        self.coordinator
            .reconfigure(&layered(&self.settings, &self.overrides));
    }

    fn upload(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
        else {
            return;
        };
        self.coordinator
            .submit(ImageSource::File(path), &mut self.pane);
    }

    fn start_capture(&mut self, ctx: &egui::Context) {
        match start_selection(open_selector, ctx) {
            Ok(flow) => self.capture = flow,
            Err(e) => {
                log::error!("Could not start region selection: {}", e);
                self.pane.show_error(e);
            }
        }
    }

    fn drive_capture(&mut self, ctx: &egui::Context) {
        self.capture = match std::mem::replace(&mut self.capture, CaptureFlow::Idle) {
            CaptureFlow::Idle => CaptureFlow::Idle,
            CaptureFlow::Selecting {
                selector,
                placement,
            } => {
                let events = show_layers(ctx, &selector, placement.desktop, placement.scale);
                ctx.request_repaint();
                drive_selection(selector, placement, events, Instant::now(), ctx)
            }
            CaptureFlow::Waiting { region, due } => {
                let now = Instant::now();
                if now < due {
                    ctx.request_repaint_after(due - now);
                    CaptureFlow::Waiting { region, due }
                } else {
                    match capture_behind_window(&self.grabber, region, ctx) {
                        Ok(image) => {
                            self.coordinator
                                .submit(ImageSource::Image(image), &mut self.pane);
                        }
                        Err(e) => {
                            log::error!("Capture of {} failed: {}", region, e);
                            self.pane.show_error(e);
                        }
                    }
                    CaptureFlow::Idle
                }
            }
        };
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Gemini API key:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.api_key_input)
                    .password(true)
                    .desired_width(320.0)
                    .hint_text("Paste Gemini API Key"),
            );
            let enter_pressed =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Save").clicked() || enter_pressed {
                self.save_api_key();
            }
            if !self.coordinator.is_configured() {
                ui.label(egui::RichText::new("not configured").color(egui::Color32::YELLOW));
            }
        });
    }

    fn render_preview(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            let idle = self.capture.is_idle();
            if ui.add_enabled(idle, egui::Button::new("Upload image")).clicked() {
                self.upload();
            }
            if ui.add_enabled(idle, egui::Button::new("Capture region")).clicked() {
                self.start_capture(ctx);
            }
        });
        ui.separator();

        match &self.preview {
            Some(texture) => {
                ui.add(
                    egui::Image::new(texture)
                        .max_size(egui::vec2(PREVIEW_SIZE as f32, PREVIEW_SIZE as f32)),
                );
            }
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new("No image yet").weak());
                });
            }
        }
    }

    fn render_result(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("LaTeX");
            if self.pane.is_busy() {
                ui.spinner();
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let copied = self
                    .copied_at
                    .is_some_and(|at| at.elapsed() < COPIED_FEEDBACK);
                let label = if copied { "Copied" } else { "Copy" };
                if ui.button(label).clicked() {
                    self.copy_result();
                }
            });
        });
        ui.separator();

        let color = self
            .pane
            .is_error()
            .then_some(egui::Color32::from_rgb(0xff, 0x60, 0x60));
        egui::ScrollArea::vertical().show(ui, |ui| {
            let mut editor = egui::TextEdit::multiline(self.pane.text_mut())
                .code_editor()
                .desired_width(f32::INFINITY)
                .desired_rows(24);
            if let Some(color) = color {
                editor = editor.text_color(color);
            }
            ui.add(editor);
        });
    }

    fn copy_result(&mut self) {
        let copied = arboard::Clipboard::new().and_then(|mut clipboard| {
            clipboard.set_text(self.pane.text().to_string())
        });
        match copied {
            Ok(()) => self.copied_at = Some(Instant::now()),
            Err(e) => log::warn!("Clipboard unavailable: {}", e),
        }
    }
}

impl eframe::App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.coordinator.pump(&mut self.pane);

        if let Some(thumbnail) = self.pane.take_preview() {
            let size = [thumbnail.width() as usize, thumbnail.height() as usize];
            let pixels = thumbnail.as_flat_samples();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
            self.preview = Some(ctx.load_texture("preview", color_image, egui::TextureOptions::LINEAR));
        }

        self.drive_capture(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.render_toolbar(ui);
            ui.add_space(4.0);
        });

        egui::SidePanel::left("preview")
            .resizable(false)
            .exact_width(PREVIEW_SIZE as f32 + 20.0)
            .show(ctx, |ui| {
                self.render_preview(ui, ctx);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_result(ui);
        });

        if self.coordinator.in_flight() > 0 {
            ctx.request_repaint_after(PUMP_INTERVAL);
        }
        if let Some(at) = self.copied_at {
            match COPIED_FEEDBACK.checked_sub(at.elapsed()) {
                Some(left) => ctx.request_repaint_after(left),
                None => self.copied_at = None,
            }
        }
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        // Overlay viewports share this and must stay see-through.
        egui::Rgba::TRANSPARENT.to_array()
    }
}

fn layered(settings: &Settings, overrides: &HashMap<String, String>) -> LayeredConfig {
    LayeredConfig::new()
        .with_layer(overrides.clone())
        .with_layer(settings.clone())
        .with_layer(EnvConfig)
}

fn open_selector() -> Result<(RegionSelector<EguiSurface>, OverlayPlacement)> {
    let layout = MonitorLayout::detect()?;
    let Some(desktop) = layout.virtual_desktop() else {
        return Err(AppError::capture("no monitors detected"));
    };
    let placement = OverlayPlacement {
        desktop,
        scale: layout.primary_scale(),
    };
    let selector = RegionSelector::open(layout, EguiSurface::input(), EguiSurface::visual())?;
    Ok((selector, placement))
}

impl MainWindow for egui::Context {
    fn hide(&self) {
        self.send_viewport_cmd_to(egui::ViewportId::ROOT, egui::ViewportCommand::Visible(false));
    }

    fn restore(&self) {
        self.send_viewport_cmd_to(egui::ViewportId::ROOT, egui::ViewportCommand::Visible(true));
        self.send_viewport_cmd_to(egui::ViewportId::ROOT, egui::ViewportCommand::Focus);
    }
}
