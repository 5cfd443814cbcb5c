//! Command-line front end: segment an image, select regions by point,
//! export the selection, and optionally render a blink timeline to frames.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use clap::Parser;

    use maskselect::blink::{BlinkKind, BlinkMessage, SyncError, Timeline};
    use maskselect::config::{AppConfig, ConfigError};
    use maskselect::data::{ImageLoadError, load_image};
    use maskselect::export::ExportError;
    use maskselect::producer::{ModelProducer, NpyMaskModel, ProductionError, RegionProducer};
    use maskselect::session::Session;

    /// Upper bound on waiting for background region production.
    const PRODUCTION_TIMEOUT: Duration = Duration::from_secs(600);

    /// How long the frame loop waits for a blink message before re-checking.
    const FRAME_WAIT: Duration = Duration::from_millis(250);

    #[derive(Parser, Debug)]
    #[command(author, version, about, long_about = None)]
    pub struct Args {
        /// The image to segment.
        image: PathBuf,

        /// Configuration file (defaults to the per-user config, if present).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Luminance threshold for the threshold producer.
        #[arg(short, long)]
        threshold: Option<u8>,

        /// Mask stack (.npy, N x H x W) for the model-based producer.
        #[arg(long)]
        masks: Option<PathBuf>,

        /// Overlay weight in [0, 1].
        #[arg(long)]
        alpha: Option<f32>,

        /// Select the region under X,Y. May be repeated.
        #[arg(long = "select", value_name = "X,Y", value_parser = parse_point)]
        select: Vec<(i64, i64)>,

        /// Write the selection union as a PNG mask.
        #[arg(long)]
        png: Option<PathBuf>,

        /// Write the selection as SVG polygons.
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Write the composite preview as PNG.
        #[arg(long)]
        preview: Option<PathBuf>,

        /// Blink timeline (JSON array of {"at_ms", "kind"}).
        #[arg(long, requires = "frames")]
        timeline: Option<PathBuf>,

        /// Directory for rendered blink frames.
        #[arg(long, requires = "timeline")]
        frames: Option<PathBuf>,
    }

    #[derive(Debug, thiserror::Error)]
    pub enum CliError {
        #[error(transparent)]
        Config(#[from] ConfigError),

        #[error("Failed to load image: {0}")]
        Image(#[from] ImageLoadError),

        #[error("Region production failed: {0}")]
        Production(#[from] ProductionError),

        #[error("Export failed: {0}")]
        Export(#[from] ExportError),

        #[error("Blink failed: {0}")]
        Sync(#[from] SyncError),

        #[error("Failed to write {path:?}: {source}")]
        Write {
            path: PathBuf,
            #[source]
            source: image::ImageError,
        },

        #[error("IO error on {path:?}: {source}")]
        Io {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },

        #[error("Region production did not finish within {0:?}")]
        ProductionTimeout(Duration),
    }

    fn parse_point(value: &str) -> Result<(i64, i64), String> {
        let (x, y) = value
            .split_once(',')
            .ok_or_else(|| format!("expected X,Y, got '{}'", value))?;
        let x = x.trim().parse::<i64>().map_err(|e| format!("bad X '{}': {}", x, e))?;
        let y = y.trim().parse::<i64>().map_err(|e| format!("bad Y '{}': {}", y, e))?;
        Ok((x, y))
    }

    /// Resolve configuration: explicit file, else default path, else defaults;
    /// then apply command-line overrides.
    pub fn resolve_config(args: &Args) -> Result<AppConfig, ConfigError> {
        let mut config = match &args.config {
            Some(path) => AppConfig::load_from_path(path)?,
            None => AppConfig::load_from_default_path().unwrap_or_default(),
        };
        if let Some(threshold) = args.threshold {
            config.segmentation.threshold = threshold;
        }
        if let Some(alpha) = args.alpha {
            config.render.alpha = alpha;
        }
        if let Some(masks) = &args.masks {
            config.segmentation.model_path = Some(masks.clone());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn run(args: &Args, config: &AppConfig) -> Result<(), CliError> {
        let image = load_image(&args.image)?;
        let mut session = Session::new(image.clone(), config)?;

        if let Some(model_path) = &config.segmentation.model_path {
            let model = NpyMaskModel::load(model_path)?;
            let producer: Arc<dyn RegionProducer> =
                Arc::new(ModelProducer::new(model).with_color_seed(config.segmentation.color_seed));
            session.request_production(image, producer)?;
            if !session.wait_for_production(PRODUCTION_TIMEOUT)? {
                return Err(CliError::ProductionTimeout(PRODUCTION_TIMEOUT));
            }
        }
        log::info!("{} region(s) available", session.collection().len());

        for &(x, y) in &args.select {
            match session.toggle_at(x, y) {
                Some(region) => log::info!("({}, {}) selected region {}", x, y, region.id()),
                None => log::warn!("({}, {}) is not inside any region", x, y),
            }
        }

        if let Some(path) = &args.png {
            session.export_png(path)?;
        }
        if let Some(path) = &args.svg {
            session.export_svg(path)?;
        }
        if let Some(path) = &args.preview {
            save_frame(session.frame().image(), path)?;
            log::info!("Wrote preview to {:?}", path);
        }

        if let (Some(timeline), Some(frames)) = (&args.timeline, &args.frames) {
            run_timeline(&mut session, timeline, frames, config.poll_interval())?;
        }
        Ok(())
    }

    /// Play a timeline against the session's selection and write each frame.
    fn run_timeline(
        session: &mut Session,
        timeline: &Path,
        frames: &Path,
        poll_interval: Duration,
    ) -> Result<(), CliError> {
        let json = std::fs::read_to_string(timeline).map_err(|source| CliError::Io {
            path: timeline.to_path_buf(),
            source,
        })?;
        let timeline = Timeline::from_json(&json)?;
        std::fs::create_dir_all(frames).map_err(|source| CliError::Io {
            path: frames.to_path_buf(),
            source,
        })?;

        let (event_tx, event_rx) = mpsc::channel();
        session.start_blink(event_rx)?;

        let cancel = Arc::new(AtomicBool::new(false));
        let player_cancel = Arc::clone(&cancel);
        let player = thread::Builder::new()
            .name("timeline-player".to_string())
            .spawn(move || timeline.play(&event_tx, &player_cancel, poll_interval));
        let player = match player {
            Ok(handle) => handle,
            Err(e) => {
                session.stop_blink();
                return Err(SyncError::Spawn(e.to_string()).into());
            }
        };

        let mut written = 0usize;
        let result = loop {
            let Some(message) = session.wait_blink_message(FRAME_WAIT) else {
                continue;
            };
            match message {
                BlinkMessage::Frame {
                    ordinal,
                    kind,
                    frame,
                } => {
                    let suffix = match kind {
                        BlinkKind::On => "on",
                        BlinkKind::Off => "off",
                    };
                    let path = frames.join(format!("frame_{:05}_{}.png", ordinal, suffix));
                    if let Err(e) = save_frame(frame.image(), &path) {
                        break Err(e);
                    }
                    written += 1;
                }
                BlinkMessage::Finished { reason } => {
                    log::info!("Blink finished ({:?}), {} frame(s) written", reason, written);
                    break Ok(());
                }
            }
        };

        if result.is_err() {
            cancel.store(true, Ordering::Release);
            session.stop_blink();
        }
        if player.join().is_err() {
            log::warn!("Timeline player panicked");
        }
        result
    }

    fn save_frame(image: &image::RgbImage, path: &Path) -> Result<(), CliError> {
        image.save(path).map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

}

/// Main entry point for native builds
#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use clap::Parser;

    let args = cli::Args::parse();

    // Config is resolved before the logger so its level can seed the filter.
    let config = cli::resolve_config(&args);
    let level = config
        .as_ref()
        .map_or(log::LevelFilter::Info, |c| c.log_level.to_level_filter());
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let result = config
        .map_err(cli::CliError::from)
        .and_then(|config| cli::run(&args, &config));
    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

// The library has no browser front end
#[cfg(target_arch = "wasm32")]
fn main() {}
