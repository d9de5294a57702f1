// SPDX-License-Identifier: GPL-3.0-only

use clap::Parser;
use playwebcam::config::Overrides;
use playwebcam::constants::DEFAULT_LOG_FILTER;
use playwebcam::lifecycle::{attach_bus_watch, install_interrupt_handler};
use playwebcam::{
    AppResult, Config, Framework, LoopHandle, PipelineLayout, Session, Termination,
    WebcamPipeline,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "playwebcam")]
#[command(about = "Show a webcam through a GStreamer capture pipeline")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Capture device (default: /dev/video0; empty string keeps the source's default)
    #[arg(short, long)]
    device: Option<String>,

    /// Caps applied between source and converter
    /// (default: video/x-raw,width=1280,height=720)
    #[arg(long)]
    caps: Option<String>,

    /// Source element factory (default: v4l2src)
    #[arg(long)]
    source: Option<String>,

    /// Converter element factory (default: videoconvert)
    #[arg(long)]
    converter: Option<String>,

    /// Sink element factory (default: xvimagesink)
    #[arg(long)]
    sink: Option<String>,

    /// GStreamer options, e.g. --gst-debug-level=3 --gst-plugin-path=DIR
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "GST_OPTIONS")]
    gst_args: Vec<String>,
}

fn main() -> ExitCode {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=playwebcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(termination) => {
            info!(?termination, "Exiting");
            if termination.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!(error = %e, "Fatal error");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> AppResult<Termination> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .with_overrides(Overrides {
        device: cli.device,
        caps: cli.caps,
        source: cli.source,
        converter: cli.converter,
        sink: cli.sink,
    });

    let framework = Framework::init(&cli.gst_args)?;
    let termination = play(&config);
    framework.shutdown();
    termination
}

/// Everything that holds GStreamer objects; all of it is dropped on return
fn play(config: &Config) -> AppResult<Termination> {
    let layout = PipelineLayout::from_config(config);
    let pipeline = WebcamPipeline::build(&layout)?;

    let handle = LoopHandle::new();
    let _bus_watch = attach_bus_watch(&pipeline.bus()?, handle.clone(), std::io::stdout())?;
    install_interrupt_handler(handle.clone());

    Session::new(&pipeline, handle).run()
}
