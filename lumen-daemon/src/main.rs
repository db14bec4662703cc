use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use lumen_controller::logging::init_logging_with_default;
use lumen_controller::prelude::*;
use lumen_controller::LoggingMode;

pub mod demo;
pub mod fixture;
pub mod transport;

use demo::{PaletteCycle, Pulse};
use fixture::ConsoleFixture;

/// Lumen light controller daemon
///
/// Runs the controller against a console fixture and accepts newline-delimited
/// JSON commands on stdin. Replies and broadcast events are written to stdout
/// as JSON lines; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "lumen-daemon")]
#[command(about = "Lumen light controller - console fixture with a JSON-lines command transport")]
#[command(version)]
pub struct Args {
    /// Nominal frame interval in milliseconds
    #[arg(long, default_value = "50")]
    pub frame_interval_ms: u64,

    /// Delay for "immediate" rescheduling (audio modes) in milliseconds
    #[arg(long, default_value = "1")]
    pub immediate_delay_ms: u64,

    /// How long the door must stay closed before fading back, in seconds
    #[arg(short = 'd', long, default_value = "10")]
    pub door_debounce_secs: u64,

    /// Interval between fade-back steps in milliseconds
    #[arg(long, default_value = "100")]
    pub fade_step_ms: u64,

    /// Hold time of each introductory color in milliseconds
    #[arg(long, default_value = "250")]
    pub intro_step_ms: u64,

    /// Minimum spacing the fixture enforces between conditional writes, in milliseconds
    #[arg(long, default_value = "5")]
    pub min_write_interval_ms: u64,

    /// Settings file (defaults to the user config directory)
    #[arg(short = 's', long)]
    pub settings: Option<PathBuf>,

    /// Do not load or save the last selected mode
    #[arg(long)]
    pub no_persist: bool,

    /// Treat the stdin client as privileged (color writes switch to audio-raw)
    #[arg(long)]
    pub privileged: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        if self.frame_interval_ms == 0 {
            return Err(anyhow::anyhow!("Frame interval must be positive"));
        }

        if self.immediate_delay_ms >= self.frame_interval_ms {
            return Err(anyhow::anyhow!(
                "Immediate delay ({}ms) must be shorter than the frame interval ({}ms)",
                self.immediate_delay_ms,
                self.frame_interval_ms
            ));
        }

        if self.fade_step_ms == 0 {
            return Err(anyhow::anyhow!("Fade step must be positive"));
        }

        match self.log_level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
                    self.log_level
                ));
            }
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments and environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub frame_interval: Duration,
    pub immediate_delay: Duration,
    pub door_debounce: Duration,
    pub fade_step: Duration,
    pub intro_step: Duration,
    pub min_write_interval: Duration,
    pub settings: Option<PathBuf>,
    pub persist: bool,
    pub privileged: bool,
    pub log_level: String,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            frame_interval: Duration::from_millis(args.frame_interval_ms),
            immediate_delay: Duration::from_millis(args.immediate_delay_ms),
            door_debounce: Duration::from_secs(args.door_debounce_secs),
            fade_step: Duration::from_millis(args.fade_step_ms),
            intro_step: Duration::from_millis(args.intro_step_ms),
            min_write_interval: Duration::from_millis(args.min_write_interval_ms),
            settings: args.settings,
            persist: !args.no_persist,
            privileged: args.privileged,
            log_level: args.log_level,
        }
    }
}

impl Config {
    /// Create configuration from command line arguments and environment variables
    pub fn from_env() -> Result<Self> {
        let mut args = Args::parse();
        apply_env_overrides(&mut args, |key| std::env::var(key).ok())?;
        args.validate()?;
        Ok(Config::from(args))
    }

    /// Timing knobs for the controller core
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::new()
            .with_frame_interval(self.frame_interval)
            .with_immediate_delay(self.immediate_delay)
            .with_door_debounce(self.door_debounce)
            .with_fade_step(self.fade_step)
            .with_intro_step(self.intro_step)
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        info!("Configuration:");
        info!("  Frame interval: {:?}", self.frame_interval);
        info!("  Immediate delay: {:?}", self.immediate_delay);
        info!("  Door debounce: {:?}", self.door_debounce);
        info!("  Fade step: {:?}", self.fade_step);
        info!("  Intro step: {:?}", self.intro_step);
        info!("  Min write interval: {:?}", self.min_write_interval);
        match (&self.settings, self.persist) {
            (_, false) => info!("  Persistence: disabled"),
            (Some(path), true) => info!("  Settings file: {}", path.display()),
            (None, true) => info!("  Settings file: user config directory"),
        }
        info!("  Privileged client: {}", self.privileged);
    }
}

/// Override arguments from `LUMEN_*` variables
fn apply_env_overrides(args: &mut Args, var: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(value) = var("LUMEN_FRAME_INTERVAL_MS") {
        args.frame_interval_ms = value
            .parse()
            .context("Invalid LUMEN_FRAME_INTERVAL_MS environment variable")?;
    }

    if let Some(value) = var("LUMEN_IMMEDIATE_DELAY_MS") {
        args.immediate_delay_ms = value
            .parse()
            .context("Invalid LUMEN_IMMEDIATE_DELAY_MS environment variable")?;
    }

    if let Some(value) = var("LUMEN_DOOR_DEBOUNCE_SECS") {
        args.door_debounce_secs = value
            .parse()
            .context("Invalid LUMEN_DOOR_DEBOUNCE_SECS environment variable")?;
    }

    if let Some(value) = var("LUMEN_FADE_STEP_MS") {
        args.fade_step_ms = value
            .parse()
            .context("Invalid LUMEN_FADE_STEP_MS environment variable")?;
    }

    if let Some(value) = var("LUMEN_INTRO_STEP_MS") {
        args.intro_step_ms = value
            .parse()
            .context("Invalid LUMEN_INTRO_STEP_MS environment variable")?;
    }

    if let Some(path) = var("LUMEN_SETTINGS_PATH") {
        args.settings = Some(PathBuf::from(path));
    }

    if var("LUMEN_NO_PERSIST").is_some() {
        args.no_persist = true;
    }

    if var("LUMEN_PRIVILEGED").is_some() {
        args.privileged = true;
    }

    Ok(())
}

/// Resolve the mode store, or `None` when persistence is off
fn open_store(config: &Config) -> Result<Option<Arc<dyn ModeStore>>> {
    if !config.persist {
        return Ok(None);
    }

    let store = match &config.settings {
        Some(path) => FileModeStore::new(path),
        None => FileModeStore::user_default().context("Failed to locate settings directory")?,
    };
    info!("Persisting mode to {}", store.path().display());
    let store: Arc<dyn ModeStore> = Arc::new(store);
    Ok(Some(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    init_logging_with_default(LoggingMode::Development, Some(&config.log_level))
        .context("Failed to initialize logging")?;
    config.print_summary();

    let fixture = ConsoleFixture::new(config.min_write_interval);

    let mut builder = LightController::builder()
        .config(config.controller_config())
        .device(fixture.clone())
        .pattern(PaletteCycle::default())
        .audio(Pulse::default());
    if let Some(store) = open_store(&config)? {
        builder = builder.store(store);
    }
    let controller = builder.build().context("Invalid controller configuration")?;
    let events = controller.subscribe();
    let (handle, task) = controller.spawn();

    let printer = tokio::spawn(transport::print_events(events));

    fixture.set_connected(true);
    handle.device_event(DeviceEvent::Connected)?;

    let role = if config.privileged {
        ClientRole::Privileged
    } else {
        ClientRole::Ordinary
    };
    let session = ClientSession::new("stdin", role, true);

    handle.client_connected()?;
    let served = transport::serve_stdin(&handle, &fixture, &session).await;
    handle.client_disconnected()?;

    info!("Shutting down controller...");
    if let Err(e) = handle.shutdown().await {
        warn!("Controller already stopped: {}", e);
    }
    task.await.context("Controller task failed")?;
    printer.abort();

    served
}
