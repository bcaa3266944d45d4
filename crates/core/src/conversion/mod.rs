//! Capture-to-LaTeX conversion pipeline.
//!
//! The [`Coordinator`] lives on the interactive thread. [`Coordinator::submit`]
//! updates the view right away (preview thumbnail, progress indicator) and
//! hands the slow part (decode, normalize, encode, remote call) to a
//! background thread. Workers never touch the view: they send their outcome
//! over a channel that the interactive thread drains with
//! [`Coordinator::pump`] once per frame.
//!
//! In-flight requests are never cancelled. When several overlap, whichever
//! resolves last owns the result area.

mod request;

pub use request::{ConversionRequest, ConversionResult, RemoteModel, INSTRUCTION, TEMPERATURE};

use crate::config::{Config, ConfigSource};
use crate::error::{AppError, Result};
use crate::gemini::GeminiClient;
use crate::image_processing;
use image::{DynamicImage, RgbaImage};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Identifies a submission in logs.
pub type RequestId = u64;

/// Where the image for a conversion comes from.
#[derive(Clone, Debug)]
pub enum ImageSource {
    File(PathBuf),
    Encoded(Vec<u8>),
    Image(DynamicImage),
}

impl ImageSource {
    /// Decodes the source into pixels.
    pub fn load(&self) -> Result<DynamicImage> {
        match self {
            Self::File(path) => image_processing::open(path),
            Self::Encoded(bytes) => image_processing::decode(bytes),
            Self::Image(image) => Ok(image.clone()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Encoded(bytes) => format!("{} encoded bytes", bytes.len()),
            Self::Image(image) => format!("{}x{} capture", image.width(), image.height()),
        }
    }
}

/// Visible state touched by the coordinator. Implemented by the UI.
pub trait ConversionView {
    fn show_preview(&mut self, thumbnail: RgbaImage);
    fn show_progress(&mut self);
    fn hide_progress(&mut self);
    fn show_result(&mut self, result: &ConversionResult);
}

/// Builds a remote model handle from resolved configuration.
pub type Connector<M> = Box<dyn Fn(&Config) -> Result<M> + Send>;

/// The remote model as seen by one submission.
enum ClientHandle<M> {
    Ready { model: Arc<M>, model_id: String },
    Unconfigured(String),
}

impl<M> Clone for ClientHandle<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Ready { model, model_id } => Self::Ready {
                model: Arc::clone(model),
                model_id: model_id.clone(),
            },
            Self::Unconfigured(reason) => Self::Unconfigured(reason.clone()),
        }
    }
}

struct Resolution {
    id: RequestId,
    result: ConversionResult,
}

/// Sends exactly one resolution, even if the worker panics before finishing.
/// Relies on unwinding, which the release profile keeps enabled.
struct ResolutionSender {
    id: RequestId,
    tx: Option<Sender<Resolution>>,
}

impl ResolutionSender {
    fn send(mut self, result: ConversionResult) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Resolution { id: self.id, result });
        }
    }
}

impl Drop for ResolutionSender {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Resolution {
                id: self.id,
                result: ConversionResult::Failure(AppError::remote(
                    "conversion worker stopped unexpectedly",
                )),
            });
        }
    }
}

/// Orchestrates conversions between the interactive thread and workers.
pub struct Coordinator<M: RemoteModel> {
    connector: Connector<M>,
    client: ClientHandle<M>,
    tx: Sender<Resolution>,
    rx: Receiver<Resolution>,
    next_id: RequestId,
    in_flight: usize,
}

impl Coordinator<GeminiClient> {
    /// A coordinator talking to Gemini.
    pub fn gemini(config: &dyn ConfigSource) -> Self {
        Self::new(config, Box::new(GeminiClient::new))
    }
}

impl<M: RemoteModel> Coordinator<M> {
    pub fn new(config: &dyn ConfigSource, connector: Connector<M>) -> Self {
        let (tx, rx) = channel();
        let client = Self::connect(&connector, config);
        Self {
            connector,
            client,
            tx,
            rx,
            next_id: 0,
            in_flight: 0,
        }
    }

    fn connect(connector: &Connector<M>, config: &dyn ConfigSource) -> ClientHandle<M> {
        match Config::from_source(config).and_then(|c| {
            let model = connector(&c)?;
            Ok((model, c.model_name))
        }) {
            Ok((model, model_id)) => {
                log::info!("Remote model client ready for {}", model_id);
                ClientHandle::Ready {
                    model: Arc::new(model),
                    model_id,
                }
            }
            Err(e) => {
                log::warn!("Remote model client unavailable: {}", e);
                ClientHandle::Unconfigured(e.to_string())
            }
        }
    }

    /// Rebuilds the client handle after the configuration changed.
    ///
    /// Requests already in flight keep the handle they started with.
    pub fn reconfigure(&mut self, config: &dyn ConfigSource) {
        self.client = Self::connect(&self.connector, config);
    }

    /// Whether a usable client is configured.
    pub fn is_configured(&self) -> bool {
        matches!(self.client, ClientHandle::Ready { .. })
    }

    /// Number of submissions not yet delivered to a view.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Starts converting `source`; the result arrives through [`Self::pump`].
    pub fn submit(&mut self, source: ImageSource, view: &mut dyn ConversionView) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        self.in_flight += 1;
        log::info!("Request {}: converting {}", id, source.describe());

        // Decode once here for the preview and hand the pixels to the worker.
        // A broken source goes to the worker as is and is reported from there.
        let source = match source {
            ImageSource::Image(image) => {
                view.show_preview(image_processing::thumbnail(&image));
                ImageSource::Image(image)
            }
            other => match other.load() {
                Ok(image) => {
                    view.show_preview(image_processing::thumbnail(&image));
                    ImageSource::Image(image)
                }
                Err(e) => {
                    log::debug!("Request {}: no preview: {}", id, e);
                    other
                }
            },
        };
        view.show_progress();

        let sender = ResolutionSender {
            id,
            tx: Some(self.tx.clone()),
        };
        let client = self.client.clone();
        let spawned = thread::Builder::new()
            .name(format!("convert-{}", id))
            .spawn(move || {
                let result: ConversionResult = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt.block_on(convert(source, client)).into(),
                    Err(e) => ConversionResult::Failure(AppError::remote(format!(
                        "Failed to create async runtime: {}",
                        e
                    ))),
                };
                sender.send(result);
            });

        // A failed spawn drops the closure and with it the sender, which
        // reports the failure through the channel.
        if let Err(e) = spawned {
            log::error!("Request {}: failed to spawn worker: {}", id, e);
        }
        id
    }

    /// Applies every resolution that has arrived. Returns how many.
    pub fn pump(&mut self, view: &mut dyn ConversionView) -> usize {
        let mut applied = 0;
        while let Ok(resolution) = self.rx.try_recv() {
            self.apply(resolution, view);
            applied += 1;
        }
        applied
    }

    /// Blocks up to `timeout` for the next resolution and applies it.
    pub fn wait(&mut self, view: &mut dyn ConversionView, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(resolution) => {
                self.apply(resolution, view);
                true
            }
            Err(_) => false,
        }
    }

    fn apply(&mut self, resolution: Resolution, view: &mut dyn ConversionView) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match &resolution.result {
            ConversionResult::Text(text) => {
                log::info!("Request {}: received {} chars", resolution.id, text.len())
            }
            ConversionResult::Failure(e) => log::warn!("Request {}: {}", resolution.id, e),
        }
        view.hide_progress();
        view.show_result(&resolution.result);
    }
}

async fn convert<M: RemoteModel>(source: ImageSource, client: ClientHandle<M>) -> Result<String> {
    let image = source.load()?;
    let normalized = image_processing::normalize(&image)?;
    let image_base64 = normalized.to_base64_png()?;

    let (model, model_id) = match client {
        ClientHandle::Ready { model, model_id } => (model, model_id),
        ClientHandle::Unconfigured(reason) => return Err(AppError::Configuration(reason)),
    };

    let request = ConversionRequest::from_encoded(model_id, image_base64);
    let text = model.complete(request).await?;
    Ok(text.trim().to_string())
}
