mod window;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pyre::{Show, ShowConfig, ShowError};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use winit::event_loop::{ControlFlow, EventLoop};

/// Interactive particle shows.
///
/// Left click bursts, drag rotates, the wheel zooms, arrows pan, space fires
/// a super burst, P pauses and Escape quits.
#[derive(Parser)]
#[command(name = "pyre")]
#[command(version)]
struct Cli {
    /// Show to run: smoke, fireworks, depth-fire, concert, cloud or spray
    #[arg(value_parser = parse_show)]
    show: Option<Show>,

    /// JSON show config; command line options override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the show's random layout and spawns
    #[arg(short, long)]
    seed: Option<u64>,

    /// Sprite image replacing the show's default
    #[arg(short, long)]
    texture: Option<PathBuf>,

    /// Write the procedural sprite here when it is used
    #[arg(long)]
    dump_fallback: Option<PathBuf>,
}

fn parse_show(s: &str) -> Result<Show, String> {
    s.parse().map_err(|e: ShowError| e.to_string())
}

impl Cli {
    fn show_config(self) -> Result<ShowConfig, ShowError> {
        let mut config = match &self.config {
            Some(path) => ShowConfig::load(path)?,
            None => ShowConfig::default(),
        };
        if let Some(show) = self.show {
            config.show = show;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.texture.is_some() {
            config.texture = self.texture;
        }
        if self.dump_fallback.is_some() {
            config.dump_fallback = self.dump_fallback;
        }
        Ok(config)
    }
}

fn run(cli: Cli) -> Result<(), ShowError> {
    let config = cli.show_config()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = window::App::new(config);
    event_loop.run_app(&mut app)?;

    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pyre=info")))
        .init();

    info!("pyre {}", env!("CARGO_PKG_VERSION"));

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
