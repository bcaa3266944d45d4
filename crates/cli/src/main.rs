use anyhow::{bail, Context, Result};
use arboard::Clipboard;
use clap::{Parser, Subcommand};
use image::RgbaImage;
use snaptex_core::{
    init, CaptureRegion, ConversionResult, ConversionView, ImageSource, Rect, Snaptex,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Override the model from settings or .env
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the converter window (default)
    Gui,
    /// Convert an image file to LaTeX
    Convert {
        path: PathBuf,
        /// Copy the result to clipboard
        #[arg(short, long, default_value_t = false)]
        copy: bool,
    },
    /// Capture a screen region and convert it
    Capture {
        /// Region in desktop coordinates as X,Y,WIDTH,HEIGHT
        #[arg(long, value_parser = parse_region, allow_hyphen_values = true)]
        region: CaptureRegion,
        /// Copy the result to clipboard
        #[arg(short, long, default_value_t = false)]
        copy: bool,
    },
    /// List connected monitors and exit
    Monitors,
}

fn parse_region(value: &str) -> std::result::Result<CaptureRegion, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, y, width, height] = parts.as_slice() else {
        return Err("expected X,Y,WIDTH,HEIGHT".to_string());
    };
    let coord = |s: &str| s.parse::<i32>().map_err(|e| format!("bad coordinate '{}': {}", s, e));
    let size = |s: &str| s.parse::<u32>().map_err(|e| format!("bad size '{}': {}", s, e));

    let region = Rect::new(coord(x)?, coord(y)?, size(width)?, size(height)?);
    if region.is_empty() {
        return Err("region must have a non-zero width and height".to_string());
    }
    Ok(region)
}

/// Reports conversion progress on stderr and keeps the result for stdout.
#[derive(Default)]
struct TerminalView {
    text: Option<String>,
    failed: bool,
}

impl ConversionView for TerminalView {
    fn show_preview(&mut self, thumbnail: RgbaImage) {
        log::debug!("Preview {}x{}", thumbnail.width(), thumbnail.height());
    }

    fn show_progress(&mut self) {
        eprintln!("Converting...");
    }

    fn hide_progress(&mut self) {}

    fn show_result(&mut self, result: &ConversionResult) {
        self.text = Some(result.display_text());
        self.failed = result.is_failure();
    }
}

fn main() -> Result<()> {
    init();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut app = Snaptex::new();
    if let Some(model) = args.model {
        app = app.with_model(model);
    }

    match args.command.unwrap_or(Command::Gui) {
        Command::Gui => app.run_app().context("Converter window failed")?,
        Command::Monitors => {
            let monitors = app.list_monitors().context("Failed to detect monitors")?;
            println!("Available monitors:");
            for monitor in monitors {
                println!("{}", monitor);
            }
        }
        Command::Convert { path, copy } => {
            if !path.is_file() {
                bail!("No such image file: {}", path.display());
            }
            convert(&app, ImageSource::File(path), copy)?;
        }
        Command::Capture { region, copy } => {
            let image = app
                .capture_region(region)
                .with_context(|| format!("Failed to capture {}", region))?;
            convert(&app, ImageSource::Image(image), copy)?;
        }
    }

    Ok(())
}

fn convert(app: &Snaptex, source: ImageSource, copy: bool) -> Result<()> {
    let mut view = TerminalView::default();
    app.convert(source, &mut view)?;

    let text = view.text.unwrap_or_default();
    if view.failed {
        bail!("{}", text);
    }
    println!("{}", text);

    if copy {
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(text) {
                    eprintln!("Warning: Failed to copy to clipboard: {}", e);
                } else {
                    eprintln!("(Copied to clipboard)");
                }
            }
            Err(e) => eprintln!("Warning: Could not access clipboard: {}", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_parses_negative_origin() {
        assert_eq!(parse_region("-1280, 40,300,200"), Ok(Rect::new(-1280, 40, 300, 200)));
    }

    #[test]
    fn region_rejects_malformed_input() {
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("1,2,-3,4").is_err());
        assert!(parse_region("0,0,0,10").is_err());
    }

    #[test]
    fn capture_subcommand_accepts_region() {
        let args = Args::parse_from(["snaptex", "--model", "m", "capture", "--region", "-10,0,5,5"]);
        assert_eq!(args.model.as_deref(), Some("m"));
        assert!(matches!(
            args.command,
            Some(Command::Capture { region, copy: false }) if region == Rect::new(-10, 0, 5, 5)
        ));
    }
}
