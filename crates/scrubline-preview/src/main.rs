//! Scrubline Preview - render a waveform overview to PNG
//!
//! Headless host for the overview widget. It:
//! 1. Loads the overview config (YAML)
//! 2. Opens the input file with the selected access strategy
//! 3. Ticks the widget until the envelope is installed
//! 4. Writes the displayed frame as a PNG
//!
//! Set RUST_LOG=debug for verbose output.

mod args;

use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use scrubline_core::config::{default_config_path, load_config, OverviewConfig};
use scrubline_core::source::AccessStrategy;
use scrubline_widgets::{OverviewEvent, OverviewWidget, RecomputeState};

use args::{Command, PreviewArgs, USAGE};

const CONFIG_FILE: &str = "overview.yaml";

/// Give up if the envelope is not ready after this long
const RENDER_TIMEOUT: Duration = Duration::from_secs(300);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = match args::parse(std::env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    render(&args)
}

fn render(args: &PreviewArgs) -> Result<()> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(CONFIG_FILE));
    let mut config: OverviewConfig = load_config(&config_path);
    if args.disk_streaming {
        config.access_strategy = AccessStrategy::DiskStreaming;
    }
    let tick_interval = config.tick_interval();

    log::info!(
        "scrubline-preview: {:?} -> {:?} ({}x{}, {:?})",
        args.input,
        args.output,
        args.width,
        args.height,
        config.access_strategy
    );

    let mut widget = OverviewWidget::new(config, args.width, args.height);
    widget
        .set_source(&args.input)
        .with_context(|| format!("Failed to open {:?}", args.input))?;

    let started = Instant::now();
    loop {
        widget.tick();
        for event in widget.drain_events() {
            if let OverviewEvent::RecomputeFailed(e) = event {
                return Err(e).context("Envelope computation failed");
            }
        }
        if widget.recompute_state() == RecomputeState::Idle {
            break;
        }
        if started.elapsed() > RENDER_TIMEOUT {
            return Err(anyhow!("Envelope not ready after {:?}", RENDER_TIMEOUT));
        }
        std::thread::sleep(tick_interval);
    }
    log::info!("Envelope ready in {:?}", started.elapsed());

    // Overlays go on after the envelope so the final tick draws them
    widget.set_progress_fraction(args.progress);
    if let Some(x) = args.marker {
        widget.set_marker(x);
    }
    widget.tick();

    let frame = widget.displayed();
    let image = image::RgbaImage::from_raw(
        frame.width() as u32,
        frame.height() as u32,
        frame.as_bytes().to_vec(),
    )
    .ok_or_else(|| anyhow!("Frame size does not match its pixel data"))?;
    image
        .save(&args.output)
        .with_context(|| format!("Failed to write {:?}", args.output))?;

    log::info!("Wrote {:?}", args.output);
    Ok(())
}
