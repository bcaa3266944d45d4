//! Drives the conversion coordinator end to end with scripted remote models.
//!
//! No network or display is needed: the remote boundary is replaced by
//! `ScriptedModel`, whose replies depend on the configured model name.

use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use snaptex_core::config::{Config, API_KEY, MODEL};
use snaptex_core::conversion::{
    ConversionRequest, ConversionResult, ConversionView, Coordinator, ImageSource, RemoteModel,
};
use snaptex_core::error::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
enum ViewEvent {
    Preview(u32, u32),
    ShowProgress,
    HideProgress,
    Text(String),
    Failure(String),
}

#[derive(Default)]
struct RecordingView {
    events: Vec<ViewEvent>,
    progress_visible: bool,
    displayed: Option<String>,
}

impl ConversionView for RecordingView {
    fn show_preview(&mut self, thumbnail: RgbaImage) {
        self.events
            .push(ViewEvent::Preview(thumbnail.width(), thumbnail.height()));
    }

    fn show_progress(&mut self) {
        self.progress_visible = true;
        self.events.push(ViewEvent::ShowProgress);
    }

    fn hide_progress(&mut self) {
        self.progress_visible = false;
        self.events.push(ViewEvent::HideProgress);
    }

    fn show_result(&mut self, result: &ConversionResult) {
        self.displayed = Some(result.display_text());
        self.events.push(match result {
            ConversionResult::Text(text) => ViewEvent::Text(text.clone()),
            ConversionResult::Failure(_) => ViewEvent::Failure(result.display_text()),
        });
    }
}

/// Replies with `reply`, optionally waiting on a gate first.
struct ScriptedModel {
    reply: String,
    panics: bool,
    gate: Option<Mutex<Receiver<()>>>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<ConversionRequest>>>,
}

impl RemoteModel for ScriptedModel {
    async fn complete(&self, request: ConversionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request);
        if self.panics {
            panic!("model crashed mid-request");
        }
        if let Some(gate) = &self.gate {
            let _ = gate.lock().unwrap().recv_timeout(WAIT);
        }
        Ok(self.reply.clone())
    }
}

/// Shared probes for a family of scripted models.
#[derive(Clone, Default)]
struct Probes {
    connects: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<ConversionRequest>>>,
}

impl Probes {
    /// Models reply `"  latex from <model>\n"`; the model named `slow`
    /// waits on `gate` before replying and the one named `panicking` panics.
    fn coordinator(
        &self,
        config: &HashMap<String, String>,
        gate: Option<Receiver<()>>,
    ) -> Coordinator<ScriptedModel> {
        let probes = self.clone();
        let gate = Arc::new(Mutex::new(gate));
        Coordinator::new(
            config,
            Box::new(move |config: &Config| -> Result<ScriptedModel> {
                probes.connects.fetch_add(1, Ordering::SeqCst);
                let gate = if config.model_name == "slow" {
                    gate.lock().unwrap().take().map(Mutex::new)
                } else {
                    None
                };
                Ok(ScriptedModel {
                    reply: format!("  latex from {}\n", config.model_name),
                    panics: config.model_name == "panicking",
                    gate,
                    calls: Arc::clone(&probes.calls),
                    seen: Arc::clone(&probes.seen),
                })
            }),
        )
    }
}

fn config(api_key: &str, model: &str) -> HashMap<String, String> {
    HashMap::from([
        (API_KEY.to_string(), api_key.to_string()),
        (MODEL.to_string(), model.to_string()),
    ])
}

fn formula_image() -> ImageSource {
    ImageSource::Image(DynamicImage::ImageRgb8(RgbImage::from_fn(60, 20, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
    })))
}

fn wait_for_resolutions<M: RemoteModel>(
    coordinator: &mut Coordinator<M>,
    view: &mut RecordingView,
    count: usize,
) {
    for _ in 0..count {
        assert!(coordinator.wait(view, WAIT), "timed out waiting for a result");
    }
}

#[test]
fn missing_api_key_fails_fast_without_network() {
    let probes = Probes::default();
    let mut coordinator = probes.coordinator(&config("", "gemini-flash-latest"), None);
    let mut view = RecordingView::default();

    assert!(!coordinator.is_configured());
    coordinator.submit(formula_image(), &mut view);
    wait_for_resolutions(&mut coordinator, &mut view, 1);

    assert_eq!(view.events.len(), 4);
    assert_eq!(view.events[0], ViewEvent::Preview(60, 20));
    assert_eq!(view.events[1], ViewEvent::ShowProgress);
    assert_eq!(view.events[2], ViewEvent::HideProgress);
    match &view.events[3] {
        ViewEvent::Failure(message) => {
            assert!(message.starts_with("Error: Configuration error"), "{}", message)
        }
        other => panic!("expected a failure, got {:?}", other),
    }
    assert!(!view.progress_visible);
    assert_eq!(probes.connects.load(Ordering::SeqCst), 0);
    assert_eq!(probes.calls.load(Ordering::SeqCst), 0);
    assert_eq!(coordinator.in_flight(), 0);
}

#[test]
fn successful_conversion_is_trimmed_and_sent_deterministically() {
    let probes = Probes::default();
    let mut coordinator = probes.coordinator(&config("key", "gemini-2.5-pro"), None);
    let mut view = RecordingView::default();

    coordinator.submit(formula_image(), &mut view);
    wait_for_resolutions(&mut coordinator, &mut view, 1);

    assert_eq!(
        view.events.last(),
        Some(&ViewEvent::Text("latex from gemini-2.5-pro".to_string()))
    );
    let hides = view
        .events
        .iter()
        .filter(|e| **e == ViewEvent::HideProgress)
        .count();
    assert_eq!(hides, 1);

    let seen = probes.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].model_id, "gemini-2.5-pro");
    assert_eq!(seen[0].temperature, 0.0);
    assert_eq!(seen[0].mime_type, "image/png");
}

#[test]
fn unreadable_image_is_reported_inline() {
    let probes = Probes::default();
    let mut coordinator = probes.coordinator(&config("key", "gemini-2.5-pro"), None);
    let mut view = RecordingView::default();

    coordinator.submit(ImageSource::Encoded(b"not a png".to_vec()), &mut view);
    wait_for_resolutions(&mut coordinator, &mut view, 1);

    assert_eq!(view.events[0], ViewEvent::ShowProgress);
    assert_eq!(view.events[1], ViewEvent::HideProgress);
    match &view.events[2] {
        ViewEvent::Failure(message) => {
            assert!(message.starts_with("Error: Could not read image"), "{}", message)
        }
        other => panic!("expected a failure, got {:?}", other),
    }
    assert_eq!(probes.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_file_is_reported_inline() {
    let probes = Probes::default();
    let mut coordinator = probes.coordinator(&config("key", "gemini-2.5-pro"), None);
    let mut view = RecordingView::default();

    coordinator.submit(
        ImageSource::File("/definitely/not/here.png".into()),
        &mut view,
    );
    wait_for_resolutions(&mut coordinator, &mut view, 1);

    assert!(matches!(view.events.last(), Some(ViewEvent::Failure(_))));
    assert_eq!(probes.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn reconfigure_rebuilds_the_client() {
    let probes = Probes::default();
    let mut coordinator = probes.coordinator(&config("", "gemini-2.5-pro"), None);
    assert!(!coordinator.is_configured());

    coordinator.reconfigure(&config("new-key", "gemini-flash-lite-latest"));
    assert!(coordinator.is_configured());
    assert_eq!(probes.connects.load(Ordering::SeqCst), 1);

    let mut view = RecordingView::default();
    coordinator.submit(formula_image(), &mut view);
    wait_for_resolutions(&mut coordinator, &mut view, 1);
    assert_eq!(
        view.displayed.as_deref(),
        Some("latex from gemini-flash-lite-latest")
    );
}

#[test]
fn last_resolution_wins_over_submission_order() {
    let probes = Probes::default();
    let (release, gate) = channel();
    let mut coordinator = probes.coordinator(&config("key", "slow"), Some(gate));
    let mut view = RecordingView::default();

    // A goes to the gated model, B to a fast one.
    coordinator.submit(formula_image(), &mut view);
    coordinator.reconfigure(&config("key", "fast"));
    coordinator.submit(formula_image(), &mut view);
    assert_eq!(coordinator.in_flight(), 2);

    wait_for_resolutions(&mut coordinator, &mut view, 1);
    assert_eq!(view.displayed.as_deref(), Some("latex from fast"));
    assert!(!view.progress_visible);

    release.send(()).unwrap();
    wait_for_resolutions(&mut coordinator, &mut view, 1);
    assert_eq!(view.displayed.as_deref(), Some("latex from slow"));
    assert_eq!(coordinator.in_flight(), 0);

    let shows = view
        .events
        .iter()
        .filter(|e| **e == ViewEvent::ShowProgress)
        .count();
    let hides = view
        .events
        .iter()
        .filter(|e| **e == ViewEvent::HideProgress)
        .count();
    assert_eq!((shows, hides), (2, 2));
    assert_eq!(coordinator.pump(&mut view), 0);
}

#[test]
fn panicking_worker_still_delivers_one_failure() {
    let probes = Probes::default();
    let mut coordinator = probes.coordinator(&config("key", "panicking"), None);
    let mut view = RecordingView::default();

    coordinator.submit(formula_image(), &mut view);
    wait_for_resolutions(&mut coordinator, &mut view, 1);

    match view.events.last() {
        Some(ViewEvent::Failure(message)) => {
            assert!(message.contains("worker stopped unexpectedly"), "{}", message)
        }
        other => panic!("expected a failure, got {:?}", other),
    }
    assert!(!view.progress_visible);
    assert_eq!(coordinator.in_flight(), 0);
    assert!(!coordinator.wait(&mut view, Duration::from_millis(200)));
}

#[test]
fn file_is_read_once_at_submission() {
    let path = std::env::temp_dir().join(format!(
        "snaptex-read-once-{}.png",
        std::process::id()
    ));
    RgbImage::from_pixel(48, 16, Rgb([20, 20, 20]))
        .save(&path)
        .unwrap();

    let probes = Probes::default();
    let mut coordinator = probes.coordinator(&config("key", "gemini-2.5-pro"), None);
    let mut view = RecordingView::default();

    coordinator.submit(ImageSource::File(path.clone()), &mut view);
    // The worker must not go back to disk.
    std::fs::remove_file(&path).unwrap();
    wait_for_resolutions(&mut coordinator, &mut view, 1);

    assert_eq!(view.events[0], ViewEvent::Preview(48, 16));
    assert_eq!(
        view.events.last(),
        Some(&ViewEvent::Text("latex from gemini-2.5-pro".to_string()))
    );
}

#[test]
fn image_problems_are_reported_before_missing_credentials() {
    let probes = Probes::default();
    let mut coordinator = probes.coordinator(&config("", "gemini-2.5-pro"), None);
    let mut view = RecordingView::default();

    coordinator.submit(ImageSource::Encoded(b"garbage".to_vec()), &mut view);
    wait_for_resolutions(&mut coordinator, &mut view, 1);

    match view.events.last() {
        Some(ViewEvent::Failure(message)) => {
            assert!(message.starts_with("Error: Could not read image"), "{}", message)
        }
        other => panic!("expected a failure, got {:?}", other),
    }
    assert_eq!(probes.calls.load(Ordering::SeqCst), 0);
}
